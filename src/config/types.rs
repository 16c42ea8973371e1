// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub api: ApiConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Single-page application being served
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Directory holding the compiled assets
    pub static_root: PathBuf,
    /// Entry document served for client-side routes
    /// (defaults to `index.html` under the static root)
    #[serde(default)]
    pub fallback_document: Option<PathBuf>,
    /// `message` field of the `/api` informational payload
    pub message: String,
    /// `version` field of the `/api` informational payload
    pub version: String,
}

impl SiteConfig {
    pub fn fallback_document_path(&self) -> PathBuf {
        self.fallback_document
            .clone()
            .unwrap_or_else(|| self.static_root.join("index.html"))
    }
}

/// API layer that `/api/v1` requests are delegated to
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ApiConfig {
    /// Base URL of the upstream API server, e.g. `http://127.0.0.1:3000`
    #[serde(default)]
    pub upstream: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Seconds a connection may wait for its next request head; 0 disables keep-alive
    pub keep_alive_timeout: u64,
    /// Seconds allowed for receiving a request body, and for the request head
    /// when keep-alive is disabled
    pub read_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
}
