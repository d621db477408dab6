//! Raw response types for the reservation REST endpoints.
//!
//! ## Observed shape from the live deployment
//!
//! The listing endpoint wraps its payload in `{"headers": ..., "body":
//! {"items": [...], "total": n}}`. Each item carries dozens of attributes;
//! only the fields below are modeled — everything else is dropped at
//! ingestion to keep the persisted catalog small and decoupled from
//! upstream schema churn.
//!
//! `total` is the server's record count for the whole listing and is known
//! to go stale; the paginator treats an empty page as authoritative
//! exhaustion regardless of `total`. The page size the server honors can
//! also differ from the one requested, so the item count of the first page
//! is what drives the page arithmetic.

use serde::Deserialize;

use facwatch_core::Facility;

/// Top-level response from the facility listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListingResponse {
    pub body: ListingBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingBody {
    #[serde(default)]
    pub items: Vec<ListingItem>,
    #[serde(default)]
    pub total: u64,
}

/// One page of the listing, as handed to the catalog builder.
#[derive(Debug)]
pub struct ListingPage {
    pub items: Vec<ListingItem>,
    pub total: u64,
}

/// A single facility record from the listing endpoint, reduced to the
/// attributes the catalog retains.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub center_id: Option<i64>,
    #[serde(default)]
    pub center_name: Option<String>,
    #[serde(default)]
    pub max_capacity: Option<i64>,
    /// Set by the deployment for facilities that cannot be reserved online.
    #[serde(default)]
    pub no_internet_permits: bool,
}

impl ListingItem {
    /// Converts the raw listing record into the canonical [`Facility`],
    /// deriving `bookable` and filling the placeholder names the upstream
    /// sometimes omits.
    #[must_use]
    pub fn into_facility(self) -> Facility {
        Facility {
            id: self.id,
            name: self.name,
            type_name: self.type_name.unwrap_or_else(|| "Unknown".to_owned()),
            center_id: self.center_id,
            center_name: self
                .center_name
                .unwrap_or_else(|| "Unknown Center".to_owned()),
            max_capacity: self.max_capacity,
            bookable: !self.no_internet_permits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_item_derives_bookable_from_permit_flag() {
        let item: ListingItem = serde_json::from_value(serde_json::json!({
            "id": 2143,
            "name": "Central Library - Meeting Room 201",
            "type_name": "Meeting Room",
            "center_id": 12,
            "center_name": "Hazel McCallion Central Library",
            "max_capacity": 40,
            "no_internet_permits": true,
        }))
        .unwrap();

        let facility = item.into_facility();
        assert!(!facility.bookable);
        assert_eq!(facility.id, 2143);
        assert_eq!(facility.center_name, "Hazel McCallion Central Library");
    }

    #[test]
    fn listing_item_tolerates_missing_optional_fields() {
        let item: ListingItem = serde_json::from_value(serde_json::json!({
            "id": 9,
            "name": "Outdoor Rink",
        }))
        .unwrap();

        let facility = item.into_facility();
        assert!(facility.bookable, "permit flag defaults to bookable");
        assert_eq!(facility.type_name, "Unknown");
        assert_eq!(facility.center_name, "Unknown Center");
        assert_eq!(facility.max_capacity, None);
    }

    #[test]
    fn listing_item_ignores_extra_upstream_attributes() {
        let item: ListingItem = serde_json::from_value(serde_json::json!({
            "id": 5,
            "name": "Pool Lane 1",
            "facility_surface": "water",
            "amenities": ["lifeguard", "lockers"],
            "quantity": 1,
        }))
        .unwrap();
        assert_eq!(item.id, 5);
    }
}
