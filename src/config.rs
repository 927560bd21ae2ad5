// =============================================================================
// CONFIGURATION MODULE
// =============================================================================
// Loads client configuration from environment variables.
//
// NOTES:
// - Every value has a default so the client boots with an empty environment
// - Parsing goes through `from_lookup` so tests never touch the process env
// =============================================================================

use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

use crate::source::SourceStrategy;

/// Quiet period used by the filter debouncer when nothing else is configured.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Rows per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// -----------------------------------------------------------------------------
// CONFIG STRUCT
// -----------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct Config {
    /// REST API base URL, without trailing slash
    /// Example: https://catalog.example.com/api
    pub api_base_url: String,

    /// Where durable blobs live: `memory`, `redis://...`, or a directory path
    pub storage_url: String,

    /// Which tier serves reads (remote, fixture, or remote with fallback)
    pub data_source: SourceStrategy,

    /// Quiet period before filter edits are committed
    pub filter_debounce: Duration,

    /// Default page size for every resource store
    pub page_size: u32,

    /// Optional transport timeout; `None` keeps the HTTP client default
    pub request_timeout: Option<Duration>,

    /// Persist each store's last applied collection
    pub persist_snapshots: bool,
}

impl Config {
    // -------------------------------------------------------------------------
    // LOAD CONFIGURATION FROM ENVIRONMENT
    // -------------------------------------------------------------------------
    /// Creates a Config by reading environment variables.
    ///
    /// # Example
    /// ```ignore
    /// let config = Config::from_env()?;
    /// println!("Talking to {}", config.api_base_url);
    /// ```
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a Config from any key lookup (the environment, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("API_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000/api".to_string())
            .trim_end_matches('/')
            .to_string();
        if api_base_url.is_empty() {
            bail!("API_BASE_URL must not be empty");
        }

        let data_source = match lookup("DATA_SOURCE") {
            Some(raw) => raw
                .parse::<SourceStrategy>()
                .map_err(anyhow::Error::msg)
                .context("Failed to parse DATA_SOURCE")?,
            None => SourceStrategy::RemoteWithFallback,
        };

        let debounce_ms: u64 = lookup("FILTER_DEBOUNCE_MS")
            .unwrap_or_else(|| DEFAULT_DEBOUNCE_MS.to_string())
            .parse()
            .context("Failed to parse FILTER_DEBOUNCE_MS as a number")?;

        let page_size: u32 = lookup("PAGE_SIZE")
            .unwrap_or_else(|| DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .context("Failed to parse PAGE_SIZE as a number")?;
        if page_size == 0 {
            bail!("PAGE_SIZE must be greater than zero");
        }

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(
                raw.parse()
                    .context("Failed to parse REQUEST_TIMEOUT_SECS as a number")?,
            )),
            None => None,
        };

        let persist_snapshots = match lookup("PERSIST_SNAPSHOTS") {
            Some(raw) => parse_flag(&raw).context("Failed to parse PERSIST_SNAPSHOTS")?,
            None => false,
        };

        Ok(Self {
            api_base_url,
            storage_url: lookup("STORAGE_URL").unwrap_or_else(|| ".catalog-admin".to_string()),
            data_source,
            filter_debounce: Duration::from_millis(debounce_ms),
            page_size,
            request_timeout,
            persist_snapshots,
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}
