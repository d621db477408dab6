//! Session acquisition against the reservation deployment.
//!
//! The availability API only answers requests that carry browser-derived
//! cookies. How those cookies are produced is a collaborator concern
//! ([`SessionProvider`]); this module owns the one-per-run acquisition and
//! the fatality rule: no cookies means no run.
//!
//! There is deliberately no expiry detection and no mid-run re-acquisition.
//! An expired session shows up as per-facility fetch failures, which the
//! pool tolerates; the next run acquires a fresh session.

use std::collections::BTreeMap;

use serde::Deserialize;

use facwatch_core::Session;

use crate::error::ScraperError;

/// Produces the cookie set for one run. Implementations wrap whatever
/// browser automation the deployment requires; tests inject a fake.
#[allow(async_fn_in_trait)]
pub trait SessionProvider {
    async fn obtain_cookies(&self) -> Result<BTreeMap<String, String>, ScraperError>;
}

/// Acquires the run's single [`Session`] from `provider`.
///
/// # Errors
///
/// Returns [`ScraperError::SessionUnavailable`] if the provider fails or
/// returns zero cookies. This is fatal for the run: no availability fetch
/// can succeed without a session, so callers must not proceed past this
/// step on failure.
pub async fn acquire<P: SessionProvider>(provider: &P) -> Result<Session, ScraperError> {
    let cookies = provider.obtain_cookies().await?;
    if cookies.is_empty() {
        return Err(ScraperError::SessionUnavailable {
            reason: "provider returned zero cookies".to_owned(),
        });
    }

    let session = Session::new(cookies);
    tracing::info!(cookies = session.cookies.len(), "session acquired");
    Ok(session)
}

/// A cookie record as exported by browser-automation tooling
/// (`driver.get_cookies()` shape: one object per cookie).
#[derive(Debug, Deserialize)]
struct CookieRecord {
    name: String,
    value: String,
}

/// Production [`SessionProvider`]: spawns a configured shell command (the
/// headless-browser automation) and reads the cookie set from its stdout.
///
/// Accepted stdout shapes:
/// - a JSON object `{"NAME": "VALUE", ...}`
/// - a browser-export JSON array `[{"name": ..., "value": ...}, ...]`
pub struct CommandSessionProvider {
    command: String,
}

impl CommandSessionProvider {
    #[must_use]
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

impl SessionProvider for CommandSessionProvider {
    async fn obtain_cookies(&self) -> Result<BTreeMap<String, String>, ScraperError> {
        tracing::info!("running session command for fresh cookies");

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .await
            .map_err(|e| ScraperError::SessionUnavailable {
                reason: format!("session command could not be spawned: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScraperError::SessionUnavailable {
                reason: format!(
                    "session command exited with {}: {}",
                    output.status,
                    stderr.trim()
                ),
            });
        }

        parse_cookie_output(&output.stdout)
    }
}

fn parse_cookie_output(stdout: &[u8]) -> Result<BTreeMap<String, String>, ScraperError> {
    if let Ok(map) = serde_json::from_slice::<BTreeMap<String, String>>(stdout) {
        return Ok(map);
    }

    let records = serde_json::from_slice::<Vec<CookieRecord>>(stdout).map_err(|e| {
        ScraperError::SessionUnavailable {
            reason: format!("session command output is not cookie JSON: {e}"),
        }
    })?;

    Ok(records
        .into_iter()
        .map(|record| (record.name, record.value))
        .collect())
}
