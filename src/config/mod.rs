//! Configuration module entry point
//!
//! Loads, validates and exposes the startup configuration

mod state;
mod types;

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, DatabaseConfig, HealthConfig, IntakeConfig, LoggingConfig, MailConfig,
    RedirectConfig, ResponseMode, ServerConfig,
};

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("table name pattern is valid")
});

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("INTAKE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.keep_alive_timeout", 75)?
            .set_default("server.read_timeout", 30)?
            .set_default("server.write_timeout", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("database.host", "127.0.0.1")?
            .set_default("database.port", 3306)?
            .set_default("database.table", "subscribers")?
            .set_default("intake.path", "/")?
            .set_default("intake.response_mode", "json")?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject combinations that would only fail at request time
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.logging
            .level
            .parse::<crate::logger::Level>()
            .map_err(|e| config::ConfigError::Message(format!("logging.level: {e}")))?;

        if !TABLE_NAME.is_match(&self.database.table) {
            return Err(config::ConfigError::Message(format!(
                "database.table '{}' is not a plain SQL identifier",
                self.database.table
            )));
        }

        if !self.intake.path.starts_with('/') {
            return Err(config::ConfigError::Message(format!(
                "intake.path '{}' must start with '/'",
                self.intake.path
            )));
        }

        if self.intake.response_mode == ResponseMode::Redirect {
            if self.redirect.advisory.is_none() {
                return Err(missing("redirect.advisory", "response_mode = \"redirect\""));
            }
            if self.redirect.newsletter.is_none() {
                return Err(missing("redirect.newsletter", "response_mode = \"redirect\""));
            }
        }

        if self.mail.enabled {
            if self.mail.api_key.is_none() {
                return Err(missing("mail.api_key", "mail.enabled"));
            }
            if self.mail.template_path.is_none() {
                return Err(missing("mail.template_path", "mail.enabled"));
            }
            if self.mail.from_address.is_none() {
                return Err(missing("mail.from_address", "mail.enabled"));
            }
        }

        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

fn missing(key: &str, because: &str) -> config::ConfigError {
    config::ConfigError::Message(format!("{key} is required when {because}"))
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Baseline configuration used across the crate's tests
    pub fn sample_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                workers: None,
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                health: HealthConfig::default(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            database: DatabaseConfig {
                host: "127.0.0.1".to_string(),
                port: 3306,
                name: "intake".to_string(),
                user: "intake".to_string(),
                password: "secret".to_string(),
                table: "subscribers".to_string(),
            },
            intake: IntakeConfig {
                path: "/".to_string(),
                response_mode: ResponseMode::Json,
                require_routable_tag: false,
            },
            redirect: RedirectConfig {
                advisory: Some("https://example.com/asesoria".to_string()),
                newsletter: Some("https://example.com/newsletter".to_string()),
            },
            mail: MailConfig::default(),
        }
    }

    #[test]
    fn test_sample_config_is_valid() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_rejects_injected_table_name() {
        let mut cfg = sample_config();
        cfg.database.table = "subscribers; DROP TABLE x".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_redirect_mode_requires_targets() {
        let mut cfg = sample_config();
        cfg.intake.response_mode = ResponseMode::Redirect;
        cfg.redirect.newsletter = None;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("redirect.newsletter"), "got: {err}");
    }

    #[test]
    fn test_json_mode_ignores_missing_targets() {
        let mut cfg = sample_config();
        cfg.redirect = RedirectConfig::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_enabled_mail_requires_key() {
        let mut cfg = sample_config();
        cfg.mail.enabled = true;
        cfg.mail.template_path = Some("mail.html".to_string());
        cfg.mail.from_address = Some("hola@example.com".to_string());
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("mail.api_key"), "got: {err}");
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut cfg = sample_config();
        cfg.logging.level = "loud".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_path_must_be_absolute() {
        let mut cfg = sample_config();
        cfg.intake.path = "subscribe".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_database_debug_redacts_password() {
        let rendered = format!("{:?}", sample_config().database);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_socket_addr() {
        let addr = sample_config().get_socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }
}
