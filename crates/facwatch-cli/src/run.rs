//! Pipeline driver: load catalog → refresh → acquire session → fan out
//! fetches → aggregate → persist.
//!
//! Only two things abort a run: session acquisition failure, and an empty
//! catalog after a dead listing refresh (nothing to scan). Every
//! per-facility failure is tolerated — output documents are written with
//! whatever partial data exists.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Args;

use facwatch_core::{AppConfig, Catalog, DateWindow};
use facwatch_scraper::{
    acquire, discover, fetch_all, Aggregator, CommandSessionProvider, FetchOptions,
    ReservationClient, RunReport,
};
use facwatch_store::JsonStore;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Days forward from the start date to scan
    #[arg(long)]
    pub days: Option<i64>,

    /// Scan window start date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Fetcher pool width
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Check at most this many bookable facilities
    #[arg(long)]
    pub limit: Option<usize>,

    /// Scan the persisted catalog as-is, skipping the listing refresh
    #[arg(long)]
    pub skip_refresh: bool,
}

fn build_client(config: &AppConfig) -> anyhow::Result<ReservationClient> {
    ReservationClient::new(
        &config.base_url,
        &config.locale,
        &config.user_agent,
        config.listing_timeout_secs,
        config.request_timeout_secs,
    )
    .context("failed to build reservation client")
}

fn build_window(config: &AppConfig, args: &RunArgs) -> DateWindow {
    let days = args.days.unwrap_or(config.window_days);
    match args.start_date {
        Some(start) => DateWindow::from_start(start, days),
        None => DateWindow::from_today(days),
    }
}

/// Loads the persisted catalog and, unless skipped, refreshes it from the
/// listing endpoint and persists the result.
///
/// A partial refresh (pagination aborted) is tolerated; an empty catalog
/// afterwards is fatal because there is nothing to scan.
async fn load_and_refresh_catalog(
    client: &ReservationClient,
    store: &JsonStore,
    config: &AppConfig,
    skip_refresh: bool,
) -> anyhow::Result<Catalog> {
    let existing: Catalog = store
        .load(facwatch_store::CATALOG_KEY)
        .context("failed to load persisted catalog")?
        .unwrap_or_default();
    tracing::info!(
        facilities = existing.facility_count(),
        centers = existing.center_count(),
        "loaded persisted catalog"
    );

    let catalog = if skip_refresh {
        existing
    } else {
        let (catalog, report) =
            discover(client, existing, config.page_size, config.page_delay_ms).await;
        if report.partial {
            tracing::warn!(
                pages = report.pages_fetched,
                "catalog refresh aborted early; continuing with accumulated catalog"
            );
        }
        if !catalog.is_empty() {
            store
                .save(facwatch_store::CATALOG_KEY, &catalog)
                .context("failed to persist catalog")?;
        }
        catalog
    };

    if catalog.is_empty() {
        anyhow::bail!("catalog is empty: listing endpoint unreachable and no persisted catalog");
    }
    Ok(catalog)
}

/// Full pipeline run.
///
/// # Errors
///
/// Returns an error (non-zero exit) only for the fatal paths: config or
/// store failure, an empty catalog, a missing session command, or session
/// acquisition failure. Fetch failures never fail the run.
pub async fn run(config: &AppConfig, args: RunArgs) -> anyhow::Result<()> {
    let store = JsonStore::new(&config.data_dir);
    let client = build_client(config)?;

    let catalog = load_and_refresh_catalog(&client, &store, config, args.skip_refresh).await?;

    // A session is required before any availability request: fatal if the
    // provider cannot produce cookies.
    let command = config
        .session_command
        .clone()
        .context("FACWATCH_SESSION_COMMAND is not set; cannot acquire a session")?;
    let provider = CommandSessionProvider::new(command);
    let session = acquire(&provider).await?;

    let window = build_window(config, &args);
    let mut facilities = catalog.bookable_facilities();
    tracing::info!(
        bookable = facilities.len(),
        total = catalog.facility_count(),
        "selected bookable facilities"
    );
    if let Some(limit) = args.limit {
        facilities.truncate(limit);
    }

    let aggregator = Aggregator::new();
    let opts = FetchOptions {
        concurrency: args.concurrency.unwrap_or(config.concurrency).max(1),
        jitter_min_ms: config.jitter_min_ms,
        jitter_max_ms: config.jitter_max_ms,
    };
    let totals = fetch_all(&client, &session, &facilities, &window, &aggregator, &opts).await;

    let report = aggregator.finish(&catalog, facilities.len(), Utc::now());
    store
        .save(facwatch_store::AVAILABILITY_KEY, &report.grouped)
        .context("failed to persist availability document")?;
    store
        .save(facwatch_store::DETAILED_KEY, &report.detailed)
        .context("failed to persist detailed document")?;

    print_run_summary(&report, totals.failed);
    Ok(())
}

/// Catalog refresh without an availability scan.
///
/// # Errors
///
/// Returns an error only when the refresh yields nothing at all (dead
/// endpoint on a first run) or the catalog cannot be persisted.
pub async fn discover_only(config: &AppConfig) -> anyhow::Result<()> {
    let store = JsonStore::new(&config.data_dir);
    let client = build_client(config)?;

    let catalog = load_and_refresh_catalog(&client, &store, config, false).await?;

    println!(
        "Catalog: {} facilities across {} centers",
        catalog.facility_count(),
        catalog.center_count()
    );
    println!("\nFacility types:");
    for (type_name, count) in catalog.type_counts() {
        println!("  {type_name}: {count}");
    }
    println!(
        "\nBookable online: {} of {}",
        catalog.bookable_facilities().len(),
        catalog.facility_count()
    );
    Ok(())
}

fn print_run_summary(report: &RunReport, failed: usize) {
    println!(
        "Found availability for {} of {} bookable facilities ({} failed)",
        report.detailed.facilities_with_availability,
        report.detailed.total_bookable_facilities,
        failed
    );
    println!("\nSummary by location:");
    for (center, facilities) in &report.grouped {
        let total_days: usize = facilities.values().map(std::collections::BTreeMap::len).sum();
        println!(
            "  {center}: {} facilities, {total_days} days with open slots",
            facilities.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            base_url: "https://example.com/town".to_owned(),
            locale: "en-US".to_owned(),
            page_size: 100,
            listing_timeout_secs: 15,
            request_timeout_secs: 10,
            concurrency: 3,
            jitter_min_ms: 100,
            jitter_max_ms: 2500,
            window_days: 14,
            page_delay_ms: 300,
            data_dir: "./data".into(),
            user_agent: "test".to_owned(),
            session_command: None,
        }
    }

    fn default_args() -> RunArgs {
        RunArgs {
            days: None,
            start_date: None,
            concurrency: None,
            limit: None,
            skip_refresh: false,
        }
    }

    #[test]
    fn window_defaults_to_config_days_from_today() {
        let window = build_window(&test_config(), &default_args());
        assert_eq!(window.end - window.start, chrono::Duration::days(14));
    }

    #[test]
    fn window_honors_explicit_start_and_days() {
        let mut args = default_args();
        args.start_date = NaiveDate::from_ymd_opt(2025, 8, 20);
        args.days = Some(7);
        let window = build_window(&test_config(), &args);
        assert_eq!(window.start_iso(), "2025-08-20");
        assert_eq!(window.end_iso(), "2025-08-27");
    }

    #[test]
    fn cli_args_override_config_concurrency() {
        let config = test_config();
        let mut args = default_args();
        args.concurrency = Some(8);
        assert_eq!(args.concurrency.unwrap_or(config.concurrency).max(1), 8);
        args.concurrency = Some(0);
        assert_eq!(
            args.concurrency.unwrap_or(config.concurrency).max(1),
            1,
            "zero is clamped to a single worker"
        );
    }
}
