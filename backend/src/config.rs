//! Configuration management for the storefront server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with STORE_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::external::messaging::click_to_chat_link;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Checkout handoff to the messaging service
    pub messaging: MessagingConfig,

    /// Uploaded media storage
    pub storage: StorageConfig,

    /// Storefront presentation settings
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessagingConfig {
    /// Store phone number receiving checkout messages, digits only
    pub phone_number: String,

    /// Base URL of the click-to-chat link
    pub link_base: String,

    /// Optional endpoint notified of every checkout
    pub webhook_url: Option<String>,

    /// Secret used to sign webhook payloads
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded product images
    pub media_dir: String,

    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Currency symbol used in customer-facing text
    pub currency: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("STORE_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 604800)?
            .set_default("messaging.link_base", "https://wa.me")?
            .set_default("storage.media_dir", "media")?
            .set_default("storage.max_upload_bytes", 5 * 1024 * 1024)?
            .set_default("store.currency", "R$")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (STORE_ prefix)
            .add_source(
                Environment::with_prefix("STORE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.messaging.check()?;
        Ok(config)
    }
}

impl MessagingConfig {
    /// Fails when no checkout link could be built from these settings
    pub fn check(&self) -> Result<(), ConfigError> {
        click_to_chat_link(&self.link_base, &self.phone_number, "")
            .map(|_| ())
            .map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messaging(link_base: &str, phone_number: &str) -> MessagingConfig {
        MessagingConfig {
            phone_number: phone_number.to_string(),
            link_base: link_base.to_string(),
            webhook_url: None,
            webhook_secret: None,
        }
    }

    #[test]
    fn test_messaging_check_accepts_formatted_phone() {
        assert!(messaging("https://wa.me", "+55 (11) 99999-9999").check().is_ok());
    }

    #[test]
    fn test_messaging_check_rejects_unusable_settings() {
        assert!(messaging("https://wa.me", "").check().is_err());
        assert!(messaging("https://wa.me", "call us").check().is_err());
        assert!(messaging("not a url", "5511999999999").check().is_err());
    }
}
