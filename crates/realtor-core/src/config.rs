//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub stripe: StripeConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub billing: BillingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Comma separated list of allowed CORS origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_cors_origins() -> String {
    "http://localhost:5173,http://127.0.0.1:5173".to_string()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Authentication configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,

    /// JWT token expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: i64,
}

fn default_jwt_expiration() -> i64 {
    86_400
}

/// Payment processor configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_test_...` or `sk_live_...`)
    pub secret_key: String,

    /// ISO currency code used for top-ups
    #[serde(default = "default_currency")]
    pub currency: String,

    /// API base URL, overridable for test doubles
    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_stripe_timeout")]
    pub timeout_secs: u64,
}

fn default_currency() -> String {
    "cad".to_string()
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com/v1".to_string()
}

fn default_stripe_timeout() -> u64 {
    30
}

/// Transactional mail configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// Whether outbound mail is delivered or only logged
    #[serde(default)]
    pub enabled: bool,

    /// Mail API key
    #[serde(default)]
    pub api_key: String,

    /// Sender address
    #[serde(default = "default_mail_from")]
    pub from: String,

    /// Public URL of the web app, used for dashboard links
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Mail API base URL
    #[serde(default = "default_mail_api_base")]
    pub api_base: String,
}

fn default_mail_from() -> String {
    "Realtor Service <info@realtorservice.com>".to_string()
}

fn default_app_url() -> String {
    "https://realtorservice.com".to_string()
}

fn default_mail_api_base() -> String {
    "https://api.resend.com".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            from: default_mail_from(),
            app_url: default_app_url(),
            api_base: default_mail_api_base(),
        }
    }
}

/// Credit ledger configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BillingConfig {
    /// Smallest top-up accepted, in credits
    #[serde(default = "default_min_topup")]
    pub min_topup: i64,

    /// Top-ups at or above this amount earn the bonus
    #[serde(default = "default_bonus_threshold")]
    pub bonus_threshold: i64,

    /// Bonus credits granted on large top-ups
    #[serde(default = "default_bonus_credits")]
    pub bonus_credits: i64,
}

fn default_min_topup() -> i64 {
    50
}

fn default_bonus_threshold() -> i64 {
    500
}

fn default_bonus_credits() -> i64 {
    50
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            min_topup: default_min_topup(),
            bonus_threshold: default_bonus_threshold(),
            bonus_credits: default_bonus_credits(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("auth.jwt_expiration_secs", 86_400)?
            .set_default("stripe.currency", "cad")?
            .set_default("billing.min_topup", 50)?
            .set_default("billing.bonus_threshold", 500)?
            .set_default("billing.bonus_credits", 50)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with REALTOR_ prefix
            .add_source(
                Environment::with_prefix("REALTOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("REALTOR").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_billing_config() {
        let config = BillingConfig::default();
        assert_eq!(config.min_topup, 50);
        assert_eq!(config.bonus_threshold, 500);
        assert_eq!(config.bonus_credits, 50);
    }

    #[test]
    fn test_mail_disabled_by_default() {
        let config = MailConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.api_base, "https://api.resend.com");
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let config = Config::builder()
            .set_override("server.port", 9000)
            .unwrap()
            .set_override("database.url", "postgresql://localhost/realtor")
            .unwrap()
            .set_override("auth.jwt_secret", "secret")
            .unwrap()
            .set_override("stripe.secret_key", "sk_test_123")
            .unwrap()
            .build()
            .unwrap();

        let app: AppConfig = config.try_deserialize().unwrap();
        assert_eq!(app.server_addr(), "0.0.0.0:9000");
        assert_eq!(app.stripe.currency, "cad");
        assert_eq!(app.billing.bonus_credits, 50);
        assert_eq!(app.auth.jwt_expiration_secs, 86_400);
    }
}
