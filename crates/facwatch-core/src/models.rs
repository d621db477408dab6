//! Shared value types for the facility-availability pipeline.
//!
//! ## Observed shape from the live reservation deployment
//!
//! The listing endpoint returns far more attributes per facility than we
//! keep; everything outside [`Facility`]'s fields is dropped at ingestion so
//! the persisted catalog stays small and decoupled from upstream schema
//! churn. `bookable` is the inverse of the upstream `no_internet_permits`
//! flag — a facility with internet permits disabled can still be listed but
//! never returns online availability.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A single bookable resource (room, field, gym, ...) at a center.
///
/// Identity is `id`, which is assigned upstream and stable across runs.
/// Instances are immutable once created; the persisted catalog only ever
/// appends new ids. Facilities that disappear upstream are intentionally
/// kept (the source system never prunes, and neither do we).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: i64,
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub center_id: Option<i64>,
    pub center_name: String,
    #[serde(default)]
    pub max_capacity: Option<i64>,
    /// `!no_internet_permits` from the upstream listing item. Non-bookable
    /// facilities are catalogued but never queried for availability.
    pub bookable: bool,
}

/// One center's slice of the catalog: its upstream id plus every facility
/// discovered under it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CenterEntry {
    #[serde(default)]
    pub center_id: Option<i64>,
    pub facilities: Vec<Facility>,
}

/// The persisted, deduplicated set of all known facilities grouped by
/// center name.
///
/// Invariant: a facility id appears at most once across the whole catalog.
/// [`Catalog::insert`] refuses duplicates; discovery runs are therefore
/// idempotent against an unchanged upstream listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    centers: BTreeMap<String, CenterEntry>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a facility with this id exists anywhere in the
    /// catalog.
    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.facilities().any(|f| f.id == id)
    }

    /// Inserts a facility under its center, returning `true` if it was new.
    ///
    /// A facility whose id is already present (under any center) is left
    /// untouched and `false` is returned — existing entries are never
    /// overwritten.
    pub fn insert(&mut self, facility: Facility) -> bool {
        if self.contains(facility.id) {
            return false;
        }
        let entry = self
            .centers
            .entry(facility.center_name.clone())
            .or_default();
        if entry.center_id.is_none() {
            entry.center_id = facility.center_id;
        }
        entry.facilities.push(facility);
        true
    }

    /// Iterates over every facility in the catalog, across all centers.
    pub fn facilities(&self) -> impl Iterator<Item = &Facility> {
        self.centers.values().flat_map(|c| c.facilities.iter())
    }

    /// Facilities that accept online reservations, cloned for handing to the
    /// fetcher pool.
    #[must_use]
    pub fn bookable_facilities(&self) -> Vec<Facility> {
        self.facilities().filter(|f| f.bookable).cloned().collect()
    }

    #[must_use]
    pub fn facility_count(&self) -> usize {
        self.centers.values().map(|c| c.facilities.len()).sum()
    }

    #[must_use]
    pub fn center_count(&self) -> usize {
        self.centers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.centers.values().all(|c| c.facilities.is_empty())
    }

    /// Facility counts per `type_name`, derived from the catalog rather than
    /// any single run's results so types with zero availability still show
    /// up in reporting.
    #[must_use]
    pub fn type_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for facility in self.facilities() {
            *counts.entry(facility.type_name.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn centers(&self) -> impl Iterator<Item = (&String, &CenterEntry)> {
        self.centers.iter()
    }
}

/// A bookable interval on a given date.
///
/// Exactly one representation is populated: `Range` when the upstream
/// supplies start/end times, `Display` when it only supplies a
/// pre-formatted label. Slot order within a day is the upstream's emission
/// order and is never re-sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSlot {
    Range { start: NaiveTime, end: NaiveTime },
    Display(String),
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Seconds are dropped: "09:00:00".."10:30:00" renders as
            // "09:00 - 10:30".
            TimeSlot::Range { start, end } => {
                write!(f, "{} - {}", start.format("%H:%M"), end.format("%H:%M"))
            }
            TimeSlot::Display(label) => f.write_str(label),
        }
    }
}

/// Open slots for one facility over one run's date window, keyed by
/// human-readable date label.
#[derive(Debug, Clone)]
pub struct AvailabilityResult {
    pub facility: Facility,
    pub slots_by_date: BTreeMap<String, Vec<TimeSlot>>,
    pub fetched_at: DateTime<Utc>,
}

impl AvailabilityResult {
    /// An empty `slots_by_date` means "no availability" and the result is
    /// dropped before aggregation rather than treated as an error.
    #[must_use]
    pub fn has_availability(&self) -> bool {
        !self.slots_by_date.is_empty()
    }
}

/// The browser-derived cookie set required by the availability API.
///
/// Acquired exactly once per run and shared read-only across all fetch
/// workers; there is no mid-run refresh (an expired session shows up as
/// per-facility fetch failures, not as a new acquisition).
#[derive(Debug, Clone)]
pub struct Session {
    pub cookies: BTreeMap<String, String>,
    pub acquired_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn new(cookies: BTreeMap<String, String>) -> Self {
        Self {
            cookies,
            acquired_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Renders the cookie set as a `Cookie` request-header value.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// The date range over which open time slots are queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window starting today and spanning `days` days forward.
    #[must_use]
    pub fn from_today(days: i64) -> Self {
        let start = Utc::now().date_naive();
        Self {
            start,
            end: start + Duration::days(days),
        }
    }

    /// Window starting at an explicit date and spanning `days` days forward.
    #[must_use]
    pub fn from_start(start: NaiveDate, days: i64) -> Self {
        Self {
            start,
            end: start + Duration::days(days),
        }
    }

    /// ISO `YYYY-MM-DD` start date for the availability query.
    #[must_use]
    pub fn start_iso(&self) -> String {
        self.start.to_string()
    }

    /// ISO `YYYY-MM-DD` end date for the availability query.
    #[must_use]
    pub fn end_iso(&self) -> String {
        self.end.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility(id: i64, name: &str, center: &str) -> Facility {
        Facility {
            id,
            name: name.to_owned(),
            type_name: "Meeting Room".to_owned(),
            center_id: Some(7),
            center_name: center.to_owned(),
            max_capacity: Some(40),
            bookable: true,
        }
    }

    #[test]
    fn insert_groups_by_center_name() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert(facility(1, "Room A", "Central Library")));
        assert!(catalog.insert(facility(2, "Room B", "Central Library")));
        assert!(catalog.insert(facility(3, "Gym", "South Common")));

        assert_eq!(catalog.center_count(), 2);
        assert_eq!(catalog.facility_count(), 3);
    }

    #[test]
    fn insert_rejects_duplicate_id_even_under_another_center() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert(facility(1, "Room A", "Central Library")));
        assert!(!catalog.insert(facility(1, "Room A renamed", "South Common")));

        assert_eq!(catalog.facility_count(), 1);
        // Original entry is untouched.
        let kept = catalog.facilities().next().unwrap();
        assert_eq!(kept.name, "Room A");
        assert_eq!(kept.center_name, "Central Library");
    }

    #[test]
    fn bookable_facilities_filters_out_unbookable() {
        let mut catalog = Catalog::new();
        catalog.insert(facility(1, "Room A", "Central Library"));
        let mut closed = facility(2, "Staff Room", "Central Library");
        closed.bookable = false;
        catalog.insert(closed);

        let bookable = catalog.bookable_facilities();
        assert_eq!(bookable.len(), 1);
        assert_eq!(bookable[0].id, 1);
    }

    #[test]
    fn type_counts_cover_all_facilities() {
        let mut catalog = Catalog::new();
        catalog.insert(facility(1, "Room A", "Central Library"));
        let mut gym = facility(2, "Gym", "South Common");
        gym.type_name = "Gymnasium".to_owned();
        gym.bookable = false;
        catalog.insert(gym);

        let counts = catalog.type_counts();
        assert_eq!(counts.get("Meeting Room"), Some(&1));
        // Unbookable facilities still count toward their type.
        assert_eq!(counts.get("Gymnasium"), Some(&1));
    }

    #[test]
    fn catalog_round_trips_through_json() {
        let mut catalog = Catalog::new();
        catalog.insert(facility(1, "Room A", "Central Library"));

        let json = serde_json::to_string(&catalog).unwrap();
        // Transparent map shape: center name at the top level.
        assert!(json.starts_with(r#"{"Central Library""#));
        let restored: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, catalog);
    }

    #[test]
    fn time_slot_range_renders_without_seconds() {
        let slot = TimeSlot::Range {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        };
        assert_eq!(slot.to_string(), "09:00 - 10:30");
    }

    #[test]
    fn time_slot_display_renders_verbatim() {
        let slot = TimeSlot::Display("7:00 PM - 9:00 PM".to_owned());
        assert_eq!(slot.to_string(), "7:00 PM - 9:00 PM");
    }

    #[test]
    fn cookie_header_joins_pairs() {
        let mut cookies = BTreeMap::new();
        cookies.insert("JSESSIONID".to_owned(), "abc123".to_owned());
        cookies.insert("mobile".to_owned(), "false".to_owned());
        let session = Session::new(cookies);
        assert_eq!(session.cookie_header(), "JSESSIONID=abc123; mobile=false");
    }

    #[test]
    fn date_window_renders_iso_dates() {
        let window = DateWindow::from_start(NaiveDate::from_ymd_opt(2025, 8, 20).unwrap(), 14);
        assert_eq!(window.start_iso(), "2025-08-20");
        assert_eq!(window.end_iso(), "2025-09-03");
    }
}
