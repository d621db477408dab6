use std::path::PathBuf;

/// Runtime configuration for a scan, sourced from `FACWATCH_*` environment
/// variables (see `config.rs` for defaults).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of the reservation deployment, e.g.
    /// `https://anc.ca.apm.activecommunities.com/activemississauga`.
    pub base_url: String,
    pub locale: String,
    /// Requested listing page size. The paginator trusts the page size the
    /// server actually returns, not this value.
    pub page_size: u32,
    pub listing_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Fetcher pool width. Kept small to respect upstream rate limits.
    pub concurrency: usize,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    pub window_days: i64,
    /// Politeness delay between sequential listing page requests.
    pub page_delay_ms: u64,
    pub data_dir: PathBuf,
    pub user_agent: String,
    /// Shell command whose stdout is the session cookie JSON (the headless
    /// browser automation). Absent means availability scans cannot run.
    pub session_command: Option<String>,
}
