pub mod aggregate;
pub mod catalog;
pub mod client;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod session;
pub mod types;

pub use aggregate::{Aggregator, DetailedReport, FacilityReport, GroupedAvailability, RunReport};
pub use catalog::{discover, DiscoveryReport};
pub use client::ReservationClient;
pub use error::ScraperError;
pub use fetch::{fetch_all, FetchOptions, FetchTotals};
pub use normalize::normalize;
pub use session::{acquire, CommandSessionProvider, SessionProvider};
pub use types::{ListingItem, ListingPage};
