//! Run-level aggregation of per-facility availability results.
//!
//! Fetch workers complete in arbitrary order and submit concurrently, so
//! the grouped map lives behind a mutex: each insertion under a
//! center/facility key is atomic with respect to other insertions. This is
//! the pipeline's only shared mutable structure.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use facwatch_core::{AvailabilityResult, Catalog};

/// `center_name -> facility_name -> date_label -> rendered slot labels`.
pub type GroupedAvailability = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<String>>>>;

/// Per-facility entry in the detailed run document.
#[derive(Debug, Clone, Serialize)]
pub struct FacilityReport {
    pub facility_id: i64,
    pub facility_name: String,
    pub center_name: String,
    pub facility_type: String,
    pub max_capacity: Option<i64>,
    pub time_slots: BTreeMap<String, Vec<String>>,
}

/// Run metadata document persisted alongside the grouped availability map.
#[derive(Debug, Serialize)]
pub struct DetailedReport {
    pub scraped_at: DateTime<Utc>,
    pub total_bookable_facilities: usize,
    pub facilities_with_availability: usize,
    /// Derived from the catalog, not the result set, so facility types with
    /// zero availability still show up in reporting.
    pub facility_type_counts: BTreeMap<String, usize>,
    pub results: Vec<FacilityReport>,
}

/// Everything a finished run persists.
#[derive(Debug)]
pub struct RunReport {
    pub grouped: GroupedAvailability,
    pub detailed: DetailedReport,
}

#[derive(Debug, Default)]
struct AggregatorInner {
    grouped: GroupedAvailability,
    results: Vec<FacilityReport>,
}

/// Collects [`AvailabilityResult`]s from concurrently running fetch
/// workers.
///
/// Equal facility names under the same center overwrite rather than merge
/// (last writer wins) — the pool produces at most one result per facility
/// per run, so a collision only happens when two distinct facilities share
/// a display name.
#[derive(Debug, Default)]
pub struct Aggregator {
    inner: Mutex<AggregatorInner>,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one facility's result into the grouped map. Safe to call from
    /// any number of workers at once.
    pub fn submit(&self, result: AvailabilityResult) {
        let rendered: BTreeMap<String, Vec<String>> = result
            .slots_by_date
            .iter()
            .map(|(date, slots)| {
                (
                    date.clone(),
                    slots.iter().map(ToString::to_string).collect(),
                )
            })
            .collect();

        let report = FacilityReport {
            facility_id: result.facility.id,
            facility_name: result.facility.name.clone(),
            center_name: result.facility.center_name.clone(),
            facility_type: result.facility.type_name.clone(),
            max_capacity: result.facility.max_capacity,
            time_slots: rendered.clone(),
        };

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .grouped
            .entry(result.facility.center_name)
            .or_default()
            .insert(result.facility.name, rendered);
        inner.results.push(report);
    }

    /// Number of results submitted so far.
    #[must_use]
    pub fn submitted(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .results
            .len()
    }

    /// Consumes the aggregator and produces the run's persistable report.
    ///
    /// `total_bookable` is the number of facilities the pool considered
    /// (whether or not they had availability); per-type counts come from
    /// the full catalog.
    #[must_use]
    pub fn finish(
        self,
        catalog: &Catalog,
        total_bookable: usize,
        scraped_at: DateTime<Utc>,
    ) -> RunReport {
        let inner = self
            .inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        let mut results = inner.results;
        // Workers finish in arbitrary order; sort for stable output files.
        results.sort_by(|a, b| {
            (a.center_name.as_str(), a.facility_name.as_str())
                .cmp(&(b.center_name.as_str(), b.facility_name.as_str()))
        });

        let detailed = DetailedReport {
            scraped_at,
            total_bookable_facilities: total_bookable,
            facilities_with_availability: results.len(),
            facility_type_counts: catalog.type_counts(),
            results,
        };

        RunReport {
            grouped: inner.grouped,
            detailed,
        }
    }
}
