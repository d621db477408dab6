use crate::app_config::AppConfig;
use crate::ConfigError;

/// Default deployment root; override with `FACWATCH_BASE_URL` to point the
/// scraper at another ActiveCommunities-style site.
const DEFAULT_BASE_URL: &str = "https://anc.ca.apm.activecommunities.com/activemississauga";

/// The availability API rejects obviously non-browser agents, so the default
/// mimics a desktop Firefox.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:142.0) Gecko/20100101 Firefox/142.0";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup
/// function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup — no
/// `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let base_url = or_default("FACWATCH_BASE_URL", DEFAULT_BASE_URL)
        .trim_end_matches('/')
        .to_string();
    let locale = or_default("FACWATCH_LOCALE", "en-US");

    let page_size = parse_u32("FACWATCH_PAGE_SIZE", "100")?;
    if page_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "FACWATCH_PAGE_SIZE".to_string(),
            reason: "page size must be at least 1".to_string(),
        });
    }

    let listing_timeout_secs = parse_u64("FACWATCH_LISTING_TIMEOUT_SECS", "15")?;
    let request_timeout_secs = parse_u64("FACWATCH_REQUEST_TIMEOUT_SECS", "10")?;
    let concurrency = parse_usize("FACWATCH_CONCURRENCY", "3")?;

    let jitter_min_ms = parse_u64("FACWATCH_JITTER_MIN_MS", "100")?;
    let jitter_max_ms = parse_u64("FACWATCH_JITTER_MAX_MS", "2500")?;
    if jitter_min_ms > jitter_max_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "FACWATCH_JITTER_MIN_MS".to_string(),
            reason: format!(
                "jitter lower bound {jitter_min_ms}ms exceeds upper bound {jitter_max_ms}ms"
            ),
        });
    }

    let window_days = parse_i64("FACWATCH_WINDOW_DAYS", "14")?;
    let page_delay_ms = parse_u64("FACWATCH_PAGE_DELAY_MS", "300")?;
    let data_dir = PathBuf::from(or_default("FACWATCH_DATA_DIR", "./data"));
    let user_agent = or_default("FACWATCH_USER_AGENT", DEFAULT_USER_AGENT);
    let session_command = lookup("FACWATCH_SESSION_COMMAND").ok();

    Ok(AppConfig {
        base_url,
        locale,
        page_size,
        listing_timeout_secs,
        request_timeout_secs,
        concurrency,
        jitter_min_ms,
        jitter_max_ms,
        window_days,
        page_delay_ms,
        data_dir,
        user_agent,
        session_command,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
