use serde_json::json;

use super::*;

// ---------------------------------------------------------------------------
// Shape 1: body.details.daily_details
// ---------------------------------------------------------------------------

#[test]
fn daily_details_truncates_seconds_and_reformats_date() {
    let raw = json!({
        "body": {
            "details": {
                "daily_details": [
                    {
                        "date": "2025-08-20",
                        "times": [
                            {"start_time": "09:00:00", "end_time": "10:30:00"}
                        ]
                    }
                ]
            }
        }
    });

    let slots = normalize(&raw);
    assert_eq!(slots.len(), 1);
    let day = slots.get("Aug 20, 2025").expect("reformatted date key");
    assert_eq!(day.len(), 1);
    assert_eq!(day[0].to_string(), "09:00 - 10:30");
}

#[test]
fn daily_details_preserves_upstream_slot_order() {
    let raw = json!({
        "body": {"details": {"daily_details": [
            {"date": "2025-08-21", "times": [
                {"start_time": "18:00:00", "end_time": "19:00:00"},
                {"start_time": "09:00:00", "end_time": "10:00:00"}
            ]}
        ]}}
    });

    let slots = normalize(&raw);
    let day = &slots["Aug 21, 2025"];
    // Emission order, not chronological order.
    assert_eq!(day[0].to_string(), "18:00 - 19:00");
    assert_eq!(day[1].to_string(), "09:00 - 10:00");
}

#[test]
fn daily_details_omits_days_with_empty_times() {
    let raw = json!({
        "body": {"details": {"daily_details": [
            {"date": "2025-08-20", "times": []},
            {"date": "2025-08-21", "times": [
                {"start_time": "10:00:00", "end_time": "11:00:00"}
            ]}
        ]}}
    });

    let slots = normalize(&raw);
    assert_eq!(slots.len(), 1);
    assert!(!slots.contains_key("Aug 20, 2025"));
    assert!(slots.contains_key("Aug 21, 2025"));
}

#[test]
fn daily_details_skips_unparseable_times() {
    let raw = json!({
        "body": {"details": {"daily_details": [
            {"date": "2025-08-20", "times": [
                {"start_time": "soon", "end_time": "later"},
                {"start_time": "14:00:00", "end_time": "15:00:00"}
            ]}
        ]}}
    });

    let slots = normalize(&raw);
    let day = &slots["Aug 20, 2025"];
    assert_eq!(day.len(), 1);
    assert_eq!(day[0].to_string(), "14:00 - 15:00");
}

#[test]
fn daily_details_keeps_unparseable_date_keys_raw() {
    let raw = json!({
        "body": {"details": {"daily_details": [
            {"date": "next tuesday", "times": [
                {"start_time": "09:00:00", "end_time": "10:00:00"}
            ]}
        ]}}
    });

    let slots = normalize(&raw);
    assert!(slots.contains_key("next tuesday"));
}

// ---------------------------------------------------------------------------
// Shape 2: flat date -> slots map
// ---------------------------------------------------------------------------

#[test]
fn flat_map_accepts_bare_strings_verbatim() {
    let raw = json!({
        "2025-08-20": ["9:00 AM - 10:00 AM", "1:00 PM - 2:00 PM"]
    });

    let slots = normalize(&raw);
    let day = &slots["Aug 20, 2025"];
    assert_eq!(day.len(), 2);
    assert_eq!(day[0].to_string(), "9:00 AM - 10:00 AM");
}

#[test]
fn flat_map_renders_start_end_objects_verbatim() {
    // Shape 2 times are not truncated — only shape 1 documents seconds.
    let raw = json!({
        "2025-08-20": [
            {"start_time": "09:00", "end_time": "10:30"},
            {"startTime": "11:00", "endTime": "12:00"}
        ]
    });

    let slots = normalize(&raw);
    let day = &slots["Aug 20, 2025"];
    assert_eq!(day[0].to_string(), "09:00 - 10:30");
    assert_eq!(day[1].to_string(), "11:00 - 12:00");
}

#[test]
fn flat_map_falls_back_to_time_then_display_fields() {
    let raw = json!({
        "2025-08-22": [
            {"time": "7:00 PM"},
            {"display": "Evening block"}
        ]
    });

    let slots = normalize(&raw);
    let day = &slots["Aug 22, 2025"];
    assert_eq!(day[0].to_string(), "7:00 PM");
    assert_eq!(day[1].to_string(), "Evening block");
}

#[test]
fn flat_map_prefers_start_end_pair_over_display() {
    let raw = json!({
        "2025-08-22": [
            {"start_time": "09:00", "end_time": "10:00", "display": "ignored"}
        ]
    });

    let slots = normalize(&raw);
    assert_eq!(slots["Aug 22, 2025"][0].to_string(), "09:00 - 10:00");
}

#[test]
fn flat_map_omits_days_whose_slots_all_render_empty() {
    let raw = json!({
        "2025-08-20": [{"note": "closed for maintenance"}],
        "2025-08-21": ["10:00 - 11:00"]
    });

    let slots = normalize(&raw);
    assert_eq!(slots.len(), 1);
    assert!(slots.contains_key("Aug 21, 2025"));
}

// ---------------------------------------------------------------------------
// Shape 3: array of day objects
// ---------------------------------------------------------------------------

#[test]
fn day_array_reads_slots_field() {
    let raw = json!([
        {"date": "2025-08-20", "slots": ["10:00 - 11:00"]}
    ]);

    let slots = normalize(&raw);
    assert_eq!(slots["Aug 20, 2025"][0].to_string(), "10:00 - 11:00");
}

#[test]
fn day_array_reads_aliased_slot_fields() {
    let timeslots = json!([{"date": "2025-08-20", "timeslots": ["10:00"]}]);
    let times = json!([{"date": "2025-08-21", "times": [{"time": "11:00"}]}]);
    let availability = json!([{"date": "2025-08-22", "availability": [{"display": "noon"}]}]);

    assert_eq!(normalize(&timeslots)["Aug 20, 2025"][0].to_string(), "10:00");
    assert_eq!(normalize(&times)["Aug 21, 2025"][0].to_string(), "11:00");
    assert_eq!(normalize(&availability)["Aug 22, 2025"][0].to_string(), "noon");
}

// ---------------------------------------------------------------------------
// Totality
// ---------------------------------------------------------------------------

#[test]
fn malformed_input_yields_empty_mapping() {
    assert!(normalize(&json!(null)).is_empty());
    assert!(normalize(&json!({})).is_empty());
    assert!(normalize(&json!(42)).is_empty());
    assert!(normalize(&json!("just a string")).is_empty());
    assert!(normalize(&json!({"body": {"unrelated": true}})).is_empty());
    assert!(normalize(&json!({"error": "Service temporarily unavailable"})).is_empty());
    assert!(normalize(&json!([1, 2, 3])).is_empty());
}

#[test]
fn empty_collections_yield_empty_mapping() {
    assert!(normalize(&json!([])).is_empty());
    assert!(normalize(&json!({"body": {"details": {"daily_details": []}}})).is_empty());
}
