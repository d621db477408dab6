//! Normalization of raw availability documents into `date -> time slots`.
//!
//! The upstream response shape is not contractually fixed. Recognition is an
//! ordered chain of typed patterns, each tried with serde against the raw
//! document; the first shape that deserializes wins. Adding a new upstream
//! shape means adding a pattern, not deepening a conditional.
//!
//! `normalize` is a total function: unparseable, empty, or alien input
//! yields an empty mapping, never an error.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::Value;

use facwatch_core::TimeSlot;

/// Converts a raw availability document into `date label -> ordered slots`.
///
/// Recognized shapes, in order:
/// 1. `body.details.daily_details`: day entries with `{start_time,
///    end_time}` pairs; times are truncated to `HH:MM`.
/// 2. A flat `date -> [slot]` map, where a slot is a bare string or an
///    object carrying `start_time`/`startTime` + `end_time`/`endTime`,
///    `time`, or `display` (first present wins, used verbatim).
/// 3. An array of day objects `{date, slots|timeslots|times|availability}`
///    with inner slots as in shape 2.
///
/// Date keys that parse as `YYYY-MM-DD` are reformatted to `Mon DD, YYYY`;
/// anything else is kept raw. Days that end up with zero slots are omitted.
#[must_use]
pub fn normalize(raw: &Value) -> BTreeMap<String, Vec<TimeSlot>> {
    if let Ok(doc) = DailyDetailsDoc::deserialize(raw) {
        return from_daily_details(doc);
    }
    if let Ok(doc) = BTreeMap::<String, Vec<SlotValue>>::deserialize(raw) {
        return from_flat_map(doc);
    }
    if let Ok(days) = Vec::<DayEntry>::deserialize(raw) {
        return from_day_array(days);
    }
    BTreeMap::new()
}

// ---------------------------------------------------------------------------
// Shape 1: nested daily details
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct DailyDetailsDoc {
    body: DailyDetailsBody,
}

#[derive(Deserialize)]
struct DailyDetailsBody {
    details: DailyDetails,
}

#[derive(Deserialize)]
struct DailyDetails {
    #[serde(default)]
    daily_details: Vec<DayDetail>,
}

#[derive(Deserialize)]
struct DayDetail {
    #[serde(default)]
    date: String,
    #[serde(default)]
    times: Vec<TimeRange>,
}

#[derive(Deserialize)]
struct TimeRange {
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    end_time: String,
}

fn from_daily_details(doc: DailyDetailsDoc) -> BTreeMap<String, Vec<TimeSlot>> {
    let mut slots_by_date = BTreeMap::new();

    for day in doc.body.details.daily_details {
        let slots: Vec<TimeSlot> = day
            .times
            .iter()
            .filter_map(|range| {
                let start = parse_time(&range.start_time)?;
                let end = parse_time(&range.end_time)?;
                Some(TimeSlot::Range { start, end })
            })
            .collect();

        if !slots.is_empty() {
            slots_by_date.insert(format_date_label(&day.date), slots);
        }
    }

    slots_by_date
}

// ---------------------------------------------------------------------------
// Shapes 2 and 3: flat map / day array
// ---------------------------------------------------------------------------

/// One slot in shapes 2 and 3: either a preformatted string or an object
/// with any of the known time fields.
#[derive(Deserialize)]
#[serde(untagged)]
enum SlotValue {
    Text(String),
    Entry(SlotEntry),
}

#[derive(Deserialize)]
struct SlotEntry {
    #[serde(default, alias = "startTime")]
    start_time: Option<String>,
    #[serde(default, alias = "endTime")]
    end_time: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    display: Option<String>,
}

#[derive(Deserialize)]
struct DayEntry {
    #[serde(default)]
    date: String,
    #[serde(
        default,
        alias = "timeslots",
        alias = "times",
        alias = "availability"
    )]
    slots: Vec<SlotValue>,
}

fn from_flat_map(doc: BTreeMap<String, Vec<SlotValue>>) -> BTreeMap<String, Vec<TimeSlot>> {
    let mut slots_by_date = BTreeMap::new();
    for (date, values) in doc {
        let slots = render_slot_values(&values);
        if !slots.is_empty() {
            slots_by_date.insert(format_date_label(&date), slots);
        }
    }
    slots_by_date
}

fn from_day_array(days: Vec<DayEntry>) -> BTreeMap<String, Vec<TimeSlot>> {
    let mut slots_by_date = BTreeMap::new();
    for day in days {
        let slots = render_slot_values(&day.slots);
        if !slots.is_empty() {
            slots_by_date.insert(format_date_label(&day.date), slots);
        }
    }
    slots_by_date
}

fn render_slot_values(values: &[SlotValue]) -> Vec<TimeSlot> {
    values.iter().filter_map(render_slot_value).collect()
}

/// Renders one shape-2/3 slot as a display label. Field precedence within
/// an object: `start_time`+`end_time` pair, then `time`, then `display`.
/// Time strings are used verbatim — only shape 1 documents `HH:MM:SS` times
/// that need truncation.
fn render_slot_value(value: &SlotValue) -> Option<TimeSlot> {
    fn non_empty(s: &Option<String>) -> Option<&str> {
        s.as_deref().filter(|s| !s.is_empty())
    }

    match value {
        SlotValue::Text(text) if !text.is_empty() => Some(TimeSlot::Display(text.clone())),
        SlotValue::Text(_) => None,
        SlotValue::Entry(entry) => {
            if let (Some(start), Some(end)) =
                (non_empty(&entry.start_time), non_empty(&entry.end_time))
            {
                return Some(TimeSlot::Display(format!("{start} - {end}")));
            }
            if let Some(time) = non_empty(&entry.time) {
                return Some(TimeSlot::Display(time.to_owned()));
            }
            non_empty(&entry.display).map(|d| TimeSlot::Display(d.to_owned()))
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// `2025-08-20` becomes `Aug 20, 2025`; anything that is not an ISO date is
/// kept unchanged.
fn format_date_label(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_or_else(|_| raw.to_owned(), |d| d.format("%b %d, %Y").to_string())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
