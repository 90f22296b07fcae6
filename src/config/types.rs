//! Configuration types module
//!
//! Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub intake: IntakeConfig,
    #[serde(default)]
    pub redirect: RedirectConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    /// Health check configuration
    #[serde(default)]
    pub health: HealthConfig,
}

/// Health check configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthConfig {
    /// Enable health check endpoints
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Liveness probe path (default: /healthz)
    #[serde(default = "default_healthz_path")]
    pub liveness_path: String,
    /// Readiness probe path (default: /readyz), checks the database
    #[serde(default = "default_readyz_path")]
    pub readiness_path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_healthz_path() -> String {
    "/healthz".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_readyz_path() -> String {
    "/readyz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            liveness_path: default_healthz_path(),
            readiness_path: default_readyz_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
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

/// Relational store connection settings
#[derive(Deserialize, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Table receiving submissions
    pub table: String,
}

// Hand-written so the password never reaches a log line.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("table", &self.table)
            .finish()
    }
}

/// How a successful POST is answered
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// JSON envelope carrying the subscriber code
    Json,
    /// HTTP redirect chosen by the submitted tags
    Redirect,
}

/// Intake endpoint behavior
#[derive(Debug, Deserialize, Clone)]
pub struct IntakeConfig {
    /// The single path the endpoint answers on
    pub path: String,
    pub response_mode: ResponseMode,
    /// Resolve the redirect target before persisting, rejecting unroutable tags
    #[serde(default)]
    pub require_routable_tag: bool,
}

/// Redirect destinations per tag category
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RedirectConfig {
    #[serde(default)]
    pub advisory: Option<String>,
    #[serde(default)]
    pub newsletter: Option<String>,
}

/// Outbound notification settings (Mandrill transactional API)
#[derive(Deserialize, Clone)]
pub struct MailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_mail_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub template_path: Option<String>,
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default = "default_mail_subject")]
    pub subject: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_mail_api_url() -> String {
    "https://mandrillapp.com/api/1.0/messages/send.json".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_mail_subject() -> String {
    "Thank you for your submission!".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            api_url: default_mail_api_url(),
            template_path: None,
            from_address: None,
            from_name: None,
            subject: default_mail_subject(),
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("template_path", &self.template_path)
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("subject", &self.subject)
            .finish()
    }
}
