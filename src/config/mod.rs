// Configuration module entry point
// Layered settings: defaults, then an optional config file, then environment

mod types;

use std::net::SocketAddr;
use std::time::Duration;

pub use types::{AssetsConfig, Config, LoggingConfig, PerformanceConfig, ServerConfig};

use crate::static_files::StaticPolicy;

impl Config {
    /// Load configuration from the given file path (extension optional).
    /// A missing file is fine; `ROUTEKIT_*` variables override it, e.g.
    /// `ROUTEKIT_SERVER__PORT=9000`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", 15)?
            .set_default("performance.write_timeout", 15)?
            .set_default("performance.max_body_size", 10_485_760)? // 10MB
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("ROUTEKIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Deadline applied to a whole connection
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(
            self.performance
                .read_timeout
                .max(self.performance.write_timeout),
        )
    }

    /// Static route policy derived from `assets.static_prefix`
    pub fn static_policy(&self) -> StaticPolicy {
        match self.assets.static_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => StaticPolicy::Prefixed {
                prefix: prefix.to_string(),
            },
            _ => StaticPolicy::CatchAll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist-routekit").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.performance.read_timeout, 15);
        assert_eq!(cfg.connection_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.assets.templates.is_empty());
        assert_eq!(cfg.static_policy(), StaticPolicy::CatchAll);
    }

    #[test]
    fn test_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routekit.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9100

[assets]
static_dir = "public"
static_prefix = "/static/"
templates = ["pages/*.html"]
"#,
        )
        .unwrap();

        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.assets.static_dir.as_deref(), Some("public"));
        assert_eq!(cfg.assets.templates, vec!["pages/*.html".to_string()]);
        assert_eq!(
            cfg.static_policy(),
            StaticPolicy::Prefixed {
                prefix: "/static/".to_string()
            }
        );
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:9100".parse().unwrap()
        );
    }
}
