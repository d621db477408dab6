//! Bounded-concurrency availability fetching.
//!
//! A fixed-width pool drains the facility list: each task sleeps a jittered
//! delay (rate limiting is per-task, so aggregate request rate scales with
//! concurrency), issues one availability request with the shared read-only
//! session, and hands the raw document to the normalizer. Failures are
//! failed-skip: logged, counted, and never allowed to cancel the pool.

use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use rand::Rng;

use facwatch_core::{AvailabilityResult, DateWindow, Facility, Session};

use crate::aggregate::Aggregator;
use crate::client::ReservationClient;
use crate::normalize::normalize;

/// Pool tuning knobs, taken from the application config.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub concurrency: usize,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
}

/// Counters for one fetch phase. `checked + failed + skipped_unbookable`
/// equals the number of facilities handed to the pool.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchTotals {
    /// Fetched and normalized (with or without availability).
    pub checked: usize,
    /// Subset of `checked` that produced at least one slot.
    pub with_availability: usize,
    /// Failed-skip: non-2xx, timeout, transport error, or non-JSON body.
    pub failed: usize,
    /// Facilities that never hit the network because they are not bookable
    /// online.
    pub skipped_unbookable: usize,
}

enum FetchOutcome {
    Available,
    Empty,
    Failed,
    SkippedUnbookable,
}

/// Scans `facilities` over `window`, submitting non-empty results to
/// `aggregator` as they complete.
///
/// Results are submitted from inside the concurrently running tasks, in
/// completion order; no ordering across facilities is guaranteed. Only
/// session acquisition can abort a run — by the time this pool starts, every
/// per-facility outcome is non-fatal.
pub async fn fetch_all(
    client: &ReservationClient,
    session: &Session,
    facilities: &[Facility],
    window: &DateWindow,
    aggregator: &Aggregator,
    opts: &FetchOptions,
) -> FetchTotals {
    let concurrency = opts.concurrency.max(1);
    let total = facilities.len();
    tracing::info!(
        total,
        concurrency,
        start = %window.start,
        end = %window.end,
        "starting availability scan"
    );

    let outcomes: Vec<FetchOutcome> = stream::iter(facilities.iter().enumerate())
        .map(|(index, facility)| async move {
            if index > 0 && index % 25 == 0 {
                tracing::info!(progress = index, total, "availability scan progress");
            }
            check_facility(client, session, facility, window, aggregator, opts).await
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut totals = FetchTotals::default();
    for outcome in outcomes {
        match outcome {
            FetchOutcome::Available => {
                totals.checked += 1;
                totals.with_availability += 1;
            }
            FetchOutcome::Empty => totals.checked += 1,
            FetchOutcome::Failed => totals.failed += 1,
            FetchOutcome::SkippedUnbookable => totals.skipped_unbookable += 1,
        }
    }

    tracing::info!(
        checked = totals.checked,
        with_availability = totals.with_availability,
        failed = totals.failed,
        skipped = totals.skipped_unbookable,
        "availability scan complete"
    );
    totals
}

async fn check_facility(
    client: &ReservationClient,
    session: &Session,
    facility: &Facility,
    window: &DateWindow,
    aggregator: &Aggregator,
    opts: &FetchOptions,
) -> FetchOutcome {
    // Guard here as well as at the call site: a non-bookable facility must
    // never cost a network round trip.
    if !facility.bookable {
        tracing::debug!(facility_id = facility.id, name = %facility.name, "not bookable online, skipping");
        return FetchOutcome::SkippedUnbookable;
    }

    let jitter = jitter_delay(opts.jitter_min_ms, opts.jitter_max_ms);
    if !jitter.is_zero() {
        tokio::time::sleep(jitter).await;
    }

    let raw = match client
        .fetch_daily_availability(facility.id, window, session)
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(
                facility_id = facility.id,
                name = %facility.name,
                error = %e,
                "availability fetch failed, skipping facility"
            );
            return FetchOutcome::Failed;
        }
    };

    let slots_by_date = normalize(&raw);
    if slots_by_date.is_empty() {
        tracing::debug!(facility_id = facility.id, name = %facility.name, "no open slots");
        return FetchOutcome::Empty;
    }

    tracing::info!(
        facility_id = facility.id,
        name = %facility.name,
        days = slots_by_date.len(),
        "found availability"
    );
    aggregator.submit(AvailabilityResult {
        facility: facility.clone(),
        slots_by_date,
        fetched_at: Utc::now(),
    });
    FetchOutcome::Available
}

/// Uniform delay in `[min_ms, max_ms]`. Kept out of the async path so no
/// rng handle is held across an await point.
fn jitter_delay(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms == 0 {
        return Duration::ZERO;
    }
    let millis = rand::rng().random_range(min_ms..=max_ms);
    Duration::from_millis(millis)
}
