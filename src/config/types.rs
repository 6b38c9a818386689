// Configuration types module
// Settings for the bundled server binary; the router library itself takes
// plain values.

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Transport settings
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds
    pub read_timeout: u64,
    /// Seconds
    pub write_timeout: u64,
    pub max_body_size: u64,
}

/// Static files and templates served by the binary
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AssetsConfig {
    /// Root directory for static files
    #[serde(default)]
    pub static_dir: Option<String>,
    /// Route prefix such as `/static/`; the catch-all route is used when unset
    #[serde(default)]
    pub static_prefix: Option<String>,
    /// Glob patterns of template files, one GET route per match
    #[serde(default)]
    pub templates: Vec<String>,
}
