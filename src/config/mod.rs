//! Configuration management for the Gateway
//!
//! This module handles loading and validation of gateway configuration.

pub mod models;

pub use models::*;

use crate::utils::error::{GatewayError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the Gateway
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Gateway configuration
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from a YAML file, then apply env overrides
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::Config(format!("Failed to read config file: {}", e)))?;

        let mut gateway: GatewayConfig = serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))?;
        gateway.apply_env();

        let config = Self { gateway };
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Build configuration from defaults plus environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut gateway = GatewayConfig::default();
        gateway.apply_env();

        let config = Self { gateway };
        config.validate()?;
        Ok(config)
    }

    /// Get server configuration
    pub fn server(&self) -> &ServerConfig {
        &self.gateway.server
    }

    /// Get LLM configuration
    pub fn llm(&self) -> &LlmConfig {
        &self.gateway.llm
    }

    /// Get cache configuration
    pub fn cache(&self) -> &CacheConfig {
        &self.gateway.cache
    }

    /// Get policy configuration
    pub fn policy(&self) -> &PolicyConfig {
        &self.gateway.policy
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.gateway
            .server
            .validate()
            .map_err(|e| GatewayError::Config(format!("Server config error: {}", e)))?;

        self.gateway
            .llm
            .validate()
            .map_err(|e| GatewayError::Config(format!("LLM config error: {}", e)))?;

        self.gateway
            .cache
            .validate()
            .map_err(|e| GatewayError::Config(format!("Cache config error: {}", e)))?;

        self.gateway
            .policy
            .rate_limit
            .validate()
            .map_err(|e| GatewayError::Config(format!("Rate limit config error: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }
}
