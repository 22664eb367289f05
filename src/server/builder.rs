//! Server builder and run_server function
//!
//! This module provides the ServerBuilder for easier server configuration
//! and the run_server function for automatic configuration loading.

use crate::config::Config;
use crate::server::server::HttpServer;
use crate::utils::error::{GatewayError, Result};
use tracing::info;

/// Server builder for easier configuration
pub struct ServerBuilder {
    config: Option<Config>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Set configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the HTTP server
    pub async fn build(self) -> Result<HttpServer> {
        let config = self
            .config
            .ok_or_else(|| GatewayError::Config("Configuration is required".to_string()))?;

        HttpServer::new(&config).await
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the server with automatic configuration loading
pub async fn run_server() -> Result<()> {
    info!("🚀 Starting Wellscore Gateway");

    // Pick up a local .env before reading overrides
    dotenvy::dotenv().ok();

    let config_path = "config/gateway.yaml";
    info!("📄 Loading configuration file: {}", config_path);

    let config = match Config::from_file(config_path).await {
        Ok(config) => {
            info!("✅ Configuration file loaded successfully");
            config
        }
        Err(e) => {
            info!(
                "⚠️  Configuration file loading failed, using defaults with env overrides: {}",
                e
            );
            Config::from_env()?
        }
    };

    let server = HttpServer::new(&config).await?;
    info!(
        "🌐 Server starting at: http://{}:{}",
        config.server().host,
        config.server().port
    );
    info!("📋 API Endpoints:");
    info!("   GET  /health - Health check");
    info!("   GET  /health/detailed - Cache and credential diagnostics");
    info!("   GET  /version - Version information");
    info!("   POST /v1/analysis - Assessment analysis");
    info!("   GET  /v1/analysis/cache/stats - Cache statistics");

    server.start().await
}
