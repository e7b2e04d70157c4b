// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact form relay.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `CONTACT_RELAY__`-prefixed environment variables (nested keys joined with
//! `__`, e.g. `CONTACT_RELAY__RATE_LIMIT__MAX_REQUESTS=10`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming the config file to load.
pub const CONFIG_PATH_ENV: &str = "CONTACT_RELAY_CONFIG";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "CONTACT_RELAY";

/// Configuration for the contact form relay service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Cross-origin settings
    #[serde(default)]
    pub cors: CorsConfig,

    /// Outgoing mail settings
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Secret store settings
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Route the form is served on (default: /contact-form)
    #[serde(default = "default_form_path")]
    pub form_path: String,

    /// Use the first `X-Forwarded-For` hop as the client id (default: false)
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Maximum accepted request body in bytes (default: 64 KiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Sliding-window rate limit for form submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum submissions per client inside the window (default: 5)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Length of the trailing window in seconds (default: 900)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How often idle clients are evicted, in seconds (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins that receive CORS headers. Anything else is served without them.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// SMTP relay configuration.
///
/// `username`, `password` and `recipient` are the fallback used when the
/// secret provider cannot supply them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Use STARTTLS on `port` instead of implicit TLS (default: true)
    #[serde(default = "default_true")]
    pub starttls: bool,

    /// Sender mailbox, e.g. `Contact Form <noreply@example.com>`
    #[serde(default = "default_from_address")]
    pub from_address: String,

    /// Transport timeout in seconds (default: 10)
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub recipient: Option<String>,
}

/// Where SMTP credentials are looked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// `env` or `file` (default: env)
    #[serde(default)]
    pub provider: SecretProviderKind,

    /// Directory holding one file per secret when `provider = "file"`
    #[serde(default = "default_secrets_dir")]
    pub dir: String,

    #[serde(default = "default_username_secret")]
    pub username_secret: String,

    #[serde(default = "default_password_secret")]
    pub password_secret: String,

    #[serde(default = "default_recipient_secret")]
    pub recipient_secret: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretProviderKind {
    #[default]
    Env,
    File,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_form_path() -> String {
    "/contact-form".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "Contact Form <noreply@localhost.localdomain>".to_string()
}

fn default_smtp_timeout_secs() -> u64 {
    10
}

fn default_secrets_dir() -> String {
    "/run/secrets".to_string()
}

fn default_username_secret() -> String {
    "SMTP_USERNAME".to_string()
}

fn default_password_secret() -> String {
    "SMTP_PASSWORD".to_string()
}

fn default_recipient_secret() -> String {
    "CONTACT_RECIPIENT".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            form_path: default_form_path(),
            trust_forwarded_for: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            starttls: default_true(),
            from_address: default_from_address(),
            timeout_secs: default_smtp_timeout_secs(),
            username: None,
            password: None,
            recipient: None,
        }
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            provider: SecretProviderKind::default(),
            dir: default_secrets_dir(),
            username_secret: default_username_secret(),
            password_secret: default_password_secret(),
            recipient_secret: default_recipient_secret(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the idle eviction interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl SmtpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the optional file named by
    /// `CONTACT_RELAY_CONFIG` (default `contact-relay.toml`) and the
    /// environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "contact-relay.toml".to_string());
        Self::load_from(&path)
    }

    /// Load configuration from `path` (which may be missing) and the environment.
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
