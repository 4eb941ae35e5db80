//! Configuration module for aftersale-server.
//!
//! Handles loading configuration from TOML files, CLI arguments, and
//! environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{SecurityConfig, ServerConfig, SharedConfig};
use aftersale_core::courier::CourierConfig;
use aftersale_core::gateway::GatewayConfig;
use aftersale_core::processors::MailConfig;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub gateway: GatewayConfig,
    pub courier: CourierConfig,
    pub mail: MailConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            security: Arc::new(RwLock::new(self.security)),
            gateway: Arc::new(RwLock::new(self.gateway)),
            courier: Arc::new(RwLock::new(self.courier)),
            mail: Arc::new(RwLock::new(self.mail)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;

        Ok(LoadedConfig {
            server: ServerConfig {
                listen: file_config.server.listen,
            },
            security: SecurityConfig {
                otp_secret: file_config
                    .security
                    .otp_secret
                    .into_bytes()
                    .into_boxed_slice(),
            },
            gateway: GatewayConfig {
                base_url: file_config.gateway.base_url,
                merchant_id: file_config.gateway.merchant_id,
                salt: file_config.gateway.salt,
            },
            courier: CourierConfig {
                base_url: file_config.courier.base_url,
                api_key: file_config.courier.api_key,
            },
            mail: MailConfig {
                base_url: file_config.mail.base_url,
                api_key: file_config.mail.api_key,
                from: file_config.mail.from,
            },
        })
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    /// Credentials are checked here so a refund can never reach the
    /// dispatch path with an unsigned payload.
    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.security.otp_secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "security.otp_secret must not be empty".to_owned(),
            ));
        }
        if config.gateway.merchant_id.is_empty() || config.gateway.salt.is_empty() {
            return Err(ConfigError::ValidationError(
                "gateway.merchant_id and gateway.salt must not be empty".to_owned(),
            ));
        }
        if config.mail.from.is_empty() {
            return Err(ConfigError::ValidationError(
                "mail.from must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
