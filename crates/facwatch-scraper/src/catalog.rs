//! Paginated facility discovery with incremental merge into the persisted
//! catalog.
//!
//! Pagination is strictly sequential: the upstream paginator is unreliable
//! under concurrent offset requests, and the page arithmetic depends on the
//! first page's observed item count. The listing's `total` is known to go
//! stale, so an empty page ends the walk early regardless of what `total`
//! promised.

use std::time::Duration;

use facwatch_core::Catalog;

use crate::client::ReservationClient;
use crate::types::ListingItem;

/// Outcome of one discovery pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Facilities inserted this pass (ids not previously in the catalog).
    pub new_facilities: usize,
    /// Listing pages actually requested.
    pub pages_fetched: usize,
    /// `true` when a transport error or malformed page aborted pagination
    /// before the computed page count was reached. The returned catalog
    /// holds whatever was accumulated; the caller decides whether to
    /// persist it.
    pub partial: bool,
}

/// Walks the facility listing and merges newly discovered facilities into
/// `existing`.
///
/// Page arithmetic: the first page's response supplies `total` and the item
/// count the server actually honored (which can differ from the requested
/// `page_size`); `total_pages = ceil(total / items_per_page)`, with a zero
/// item count treated as a single page. Pages `2..=total_pages` follow
/// sequentially with a politeness delay of `page_delay_ms` between
/// requests. The first page is never re-fetched.
///
/// Merge is set-union by facility id: existing entries are never
/// overwritten, and facilities that have disappeared upstream are never
/// pruned (the catalog is append-only across runs, matching the source
/// system's behavior).
///
/// This function does not fail: any per-page error aborts pagination, and
/// the accumulated catalog is returned with `partial` set.
pub async fn discover(
    client: &ReservationClient,
    existing: Catalog,
    page_size: u32,
    page_delay_ms: u64,
) -> (Catalog, DiscoveryReport) {
    let mut catalog = existing;
    let mut report = DiscoveryReport::default();

    let first = match client.fetch_listing_page(1, page_size).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(error = %e, "listing page 1 failed; keeping existing catalog");
            report.partial = true;
            return (catalog, report);
        }
    };
    report.pages_fetched = 1;

    // Trust the response, not the request: the server may honor a different
    // page size than the one asked for.
    let items_per_page = first.items.len() as u64;
    let total = first.total;
    let total_pages = if items_per_page == 0 {
        1
    } else {
        total.div_ceil(items_per_page)
    };
    tracing::info!(
        total,
        items_per_page,
        total_pages,
        "listing page 1 received"
    );

    ingest_page(&mut catalog, first.items, &mut report);

    for page in 2..=total_pages {
        if page_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(page_delay_ms)).await;
        }

        match client.fetch_listing_page(page, page_size).await {
            Ok(p) => {
                report.pages_fetched += 1;
                if p.items.is_empty() {
                    // Stale `total`: the listing is exhausted even though
                    // more pages were promised.
                    tracing::info!(page, "empty listing page, stopping early");
                    break;
                }
                ingest_page(&mut catalog, p.items, &mut report);
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "listing page failed; aborting pagination");
                report.partial = true;
                break;
            }
        }
    }

    tracing::info!(
        new_facilities = report.new_facilities,
        total_facilities = catalog.facility_count(),
        pages = report.pages_fetched,
        partial = report.partial,
        "discovery pass complete"
    );
    (catalog, report)
}

/// Inserts a page's items, counting only facilities whose id was not
/// already known. The check-then-insert is atomic here because pagination
/// is single-threaded.
fn ingest_page(catalog: &mut Catalog, items: Vec<ListingItem>, report: &mut DiscoveryReport) {
    let mut added = 0usize;
    for item in items {
        if catalog.insert(item.into_facility()) {
            added += 1;
        }
    }
    report.new_facilities += added;
    tracing::debug!(added, "listing page ingested");
}
