//! HTTP client for the reservation deployment's REST endpoints.
//!
//! Two endpoints are exercised: the paginated facility listing (a POST that
//! carries its page cursor in a JSON-encoded `page_info` header, an upstream
//! quirk) and the per-facility daily availability endpoint (a GET that
//! requires browser-derived session cookies and a millisecond-timestamp
//! `ui_random` cache-buster).
//!
//! Per-page and per-facility failures are typed, logged by callers, and
//! never retried within a run.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;

use facwatch_core::{DateWindow, Session};

use crate::error::ScraperError;
use crate::types::{ListingPage, ListingResponse};

/// HTTP client for the facility listing and availability endpoints.
pub struct ReservationClient {
    client: Client,
    base_url: String,
    origin: String,
    locale: String,
    availability_timeout: Duration,
}

impl ReservationClient {
    /// Creates a `ReservationClient` with configured timeouts and
    /// `User-Agent`.
    ///
    /// `listing_timeout_secs` is the whole-request timeout for listing
    /// pages; `availability_timeout_secs` applies per availability request.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if `base_url` cannot be
    /// parsed, or [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        locale: &str,
        user_agent: &str,
        listing_timeout_secs: u64,
        availability_timeout_secs: u64,
    ) -> Result<Self, ScraperError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let parsed =
            reqwest::Url::parse(&base_url).map_err(|e| ScraperError::InvalidBaseUrl {
                base_url: base_url.clone(),
                reason: e.to_string(),
            })?;
        let origin = parsed.origin().ascii_serialization();

        let client = Client::builder()
            .timeout(Duration::from_secs(listing_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url,
            origin,
            locale: locale.to_owned(),
            availability_timeout: Duration::from_secs(availability_timeout_secs),
        })
    }

    /// Fetches one page of the facility listing.
    ///
    /// The page cursor travels in a `page_info` header as JSON; the body is
    /// an empty JSON object. The requested page size is advisory — callers
    /// must trust the item count the server actually returns.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UnexpectedStatus`] — any non-2xx status.
    /// - [`ScraperError::Http`] — network, TLS, or timeout failure.
    /// - [`ScraperError::Deserialize`] — body is not the expected JSON.
    pub async fn fetch_listing_page(
        &self,
        page_number: u64,
        page_size: u32,
    ) -> Result<ListingPage, ScraperError> {
        let url = format!("{}/rest/reservation/resource", self.base_url);
        let page_info = serde_json::json!({
            "page_number": page_number,
            "total_records_per_page": page_size,
        })
        .to_string();

        let response = self
            .client
            .post(&url)
            .query(&[("locale", self.locale.as_str())])
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/json;charset=utf-8",
            )
            .header("X-Requested-With", "XMLHttpRequest")
            .header("page_info", &page_info)
            .header(reqwest::header::ORIGIN, &self.origin)
            .header(
                reqwest::header::REFERER,
                format!("{}/reservation/landing/search", self.base_url),
            )
            .body("{}")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let parsed =
            serde_json::from_str::<ListingResponse>(&body).map_err(|e| {
                ScraperError::Deserialize {
                    context: format!("listing page {page_number}"),
                    source: e,
                }
            })?;

        Ok(ListingPage {
            items: parsed.body.items,
            total: parsed.body.total,
        })
    }

    /// Fetches the raw daily-availability document for one facility.
    ///
    /// The session's cookies are attached read-only; `ui_random` is a fresh
    /// millisecond timestamp on every call (the upstream uses it to defeat
    /// caching). The raw document is returned unparsed — shape recognition
    /// belongs to the normalizer.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UnexpectedStatus`] — any non-2xx status (an expired
    ///   session typically surfaces here).
    /// - [`ScraperError::Http`] — network failure or per-request timeout.
    /// - [`ScraperError::Deserialize`] — body is not JSON at all.
    pub async fn fetch_daily_availability(
        &self,
        facility_id: i64,
        window: &DateWindow,
        session: &Session,
    ) -> Result<serde_json::Value, ScraperError> {
        let url = format!(
            "{}/rest/reservation/resource/availability/daily/{facility_id}",
            self.base_url
        );
        let ui_random = Utc::now().timestamp_millis().to_string();

        let response = self
            .client
            .get(&url)
            .timeout(self.availability_timeout)
            .query(&[
                ("start_date", window.start_iso().as_str()),
                ("end_date", window.end_iso().as_str()),
                ("customer_id", "0"),
                ("company_id", "0"),
                ("locale", self.locale.as_str()),
                ("ui_random", ui_random.as_str()),
            ])
            .header(
                reqwest::header::ACCEPT,
                "application/json, text/javascript, */*; q=0.01",
            )
            .header("X-Requested-With", "XMLHttpRequest")
            .header(
                reqwest::header::REFERER,
                format!(
                    "{}/reservation/landing/search/detail/{facility_id}",
                    self.base_url
                ),
            )
            .header(reqwest::header::COOKIE, session.cookie_header())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<serde_json::Value>(&body).map_err(|e| ScraperError::Deserialize {
            context: format!("availability for facility {facility_id}"),
            source: e,
        })
    }
}
