//! Client configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use storage::FileStore;

use crate::error::Result;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Storefront client configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `API_BASE_URL`: backend base URL (default: `"http://localhost:8080/api"`)
/// - `REQUEST_TIMEOUT_SECS`: bound on every backend call (default: `10`)
/// - `CLEAR_CART_ON_SUBMIT`: empty the cart after a placed order (default: `true`)
/// - `STORE_PATH`: file backing the persisted store (default: none, in memory)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON logs (default: human readable)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub clear_cart_on_submit: bool,
    pub store_path: Option<PathBuf>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl ClientConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: std::env::var("API_BASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.api_base_url),
            request_timeout: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            clear_cart_on_submit: std::env::var("CLEAR_CART_ON_SUBMIT")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.clear_cart_on_submit),
            store_path: std::env::var_os("STORE_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: std::env::var("LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
        }
    }

    /// Returns the URL for an endpoint path such as `/pedidos`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Opens the configured file store, if a path is set.
    pub fn open_file_store(&self) -> Result<Option<FileStore>> {
        match &self.store_path {
            Some(path) => Ok(Some(FileStore::open(path)?)),
            None => Ok(None),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            request_timeout: Duration::from_secs(10),
            clear_cart_on_submit: true,
            store_path: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
