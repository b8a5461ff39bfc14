//! Configuration loader for the `typhoon-tracks` proxy.
//!
//! Upstream URLs, the API key and timeouts are read once at start-up from
//! environment variables (with optional `.env` support provided by the
//! caller) and handed to the routes. Parsers never see this configuration.
//!
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::parsers::atcf::DialectMode;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

pub const DEFAULT_TYPHOON_API_URL: &str =
    "https://opendata.cwa.gov.tw/api/v1/rest/datastore/W-C0034-005";
pub const DEFAULT_RSS_WARNING_URL: &str = "https://www.cwa.gov.tw/rss/Data/cwa_warning.xml";

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Key forwarded to the CWA open-data API.
    pub cwa_api_key: String,

    /// CWA tropical cyclone JSON endpoint, passed through verbatim.
    pub typhoon_api_url: String,

    /// RSS/Atom warnings feed.
    pub rss_warning_url: String,

    /// KML file with forecast track placemarks.
    pub track_kml_url: Option<String>,

    /// CSV dataset index that links to the current track KML.
    pub track_csv_index_url: Option<String>,

    /// ATCF bulletin candidates, tried in order.
    pub atcf_urls: Vec<String>,

    /// Column layout of the ATCF bulletins.
    pub atcf_dialect: DialectMode,

    /// Agency label attached to ATCF tracks.
    pub atcf_agency: String,

    /// Per-request upstream timeout in milliseconds.
    pub upstream_timeout_ms: u32,

    /// Port the HTTP server binds to.
    pub listen_port: u16,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `CWA_API_KEY` – key for the CWA open-data API
///
/// Optional:
/// - `CWA_TYPHOON_API_URL`, `CWA_RSS_WARNING_URL` – upstream overrides
/// - `TRACK_KML_URL`, `TRACK_CSV_INDEX_URL` – track sources (unset: no data)
/// - `ATCF_URLS` – comma-separated bulletin candidates (default: none)
/// - `ATCF_DIALECT` – `auto`, `compact`, `named` or `tcvitals` (default: `named`)
/// - `ATCF_AGENCY` – agency label (default: `JTWC`)
/// - `UPSTREAM_TIMEOUT_MS` – upstream timeout (default: 10000)
/// - `LISTEN_PORT` – HTTP port (default: 8080)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let cwa_api_key = require_env!("CWA_API_KEY");
    let typhoon_api_url = optional_env("CWA_TYPHOON_API_URL")
        .unwrap_or_else(|| DEFAULT_TYPHOON_API_URL.to_string());
    let rss_warning_url = optional_env("CWA_RSS_WARNING_URL")
        .unwrap_or_else(|| DEFAULT_RSS_WARNING_URL.to_string());
    let track_kml_url = optional_env("TRACK_KML_URL");
    let track_csv_index_url = optional_env("TRACK_CSV_INDEX_URL");
    let atcf_urls = optional_env("ATCF_URLS")
        .map(|v| parse_list(&v))
        .unwrap_or_default();
    let atcf_dialect = optional_env("ATCF_DIALECT")
        .map(|v| v.parse::<DialectMode>())
        .transpose()
        .map_err(|e| anyhow!("Invalid ATCF_DIALECT: {}", e))?
        .unwrap_or(DialectMode::Named);
    let atcf_agency = optional_env("ATCF_AGENCY").unwrap_or_else(|| "JTWC".to_string());
    let upstream_timeout_ms = parse_env_u32!("UPSTREAM_TIMEOUT_MS", 10_000);
    let listen_port = u16::try_from(parse_env_u32!("LISTEN_PORT", 8080))
        .map_err(|e| anyhow!("Invalid LISTEN_PORT: {}", e))?;

    Ok(Config {
        cwa_api_key,
        typhoon_api_url,
        rss_warning_url,
        track_kml_url,
        track_csv_index_url,
        atcf_urls,
        atcf_dialect,
        atcf_agency,
        upstream_timeout_ms,
        listen_port,
    })
}

/// Non-empty value of an optional variable.
fn optional_env(var_name: &str) -> Option<String> {
    env::var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a comma-separated list, dropping empty entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.upstream_timeout_ms))
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// The API key is masked; everything else is shown as loaded.
    pub fn log_config(&self) {
        // ---
        let masked_key = match self.cwa_api_key.get(..4) {
            Some(prefix) if self.cwa_api_key.len() > 8 => format!("{prefix}****"),
            _ => "****".to_string(),
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  CWA_API_KEY         : {}", masked_key);
        tracing::info!("  CWA_TYPHOON_API_URL : {}", self.typhoon_api_url);
        tracing::info!("  CWA_RSS_WARNING_URL : {}", self.rss_warning_url);
        tracing::info!("  TRACK_KML_URL       : {:?}", self.track_kml_url);
        tracing::info!("  TRACK_CSV_INDEX_URL : {:?}", self.track_csv_index_url);
        tracing::info!("  ATCF_URLS           : {:?}", self.atcf_urls);
        tracing::info!("  ATCF_DIALECT        : {:?}", self.atcf_dialect);
        tracing::info!("  ATCF_AGENCY         : {}", self.atcf_agency);
        tracing::info!("  UPSTREAM_TIMEOUT_MS : {}", self.upstream_timeout_ms);
        tracing::info!("  LISTEN_PORT         : {}", self.listen_port);
    }
}
