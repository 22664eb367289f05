//! HTTP server core implementation
//!
//! This module provides the HttpServer struct and its core methods.

use crate::config::{Config, ServerConfig};
use crate::server::routes;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_cors::Cors;
use actix_web::{App, HttpServer as ActixHttpServer, middleware::DefaultHeaders, web};
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let state = AppState::new(config.clone())?;

        Ok(Self {
            config: config.server().clone(),
            state,
        })
    }

    /// Create the Actix-web application
    fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let cors_config = &state.config.server().cors;
        let mut cors = Cors::default();

        if cors_config.enabled {
            if cors_config.allows_all_origins() {
                cors = cors.allow_any_origin();
            } else {
                for origin in &cors_config.allowed_origins {
                    cors = cors.allowed_origin(origin);
                }
            }
            cors = cors.allow_any_method().allow_any_header().max_age(3600);
        }

        App::new()
            .app_data(state)
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(DefaultHeaders::new().add(("Server", "Wellscore")))
            .configure(routes::analysis::configure_routes)
            .configure(routes::health::configure_routes)
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();

        info!("Starting HTTP server on {}", bind_addr);

        let state = web::Data::new(self.state);
        let workers = self.config.workers;

        let mut server = ActixHttpServer::new(move || Self::create_app(state.clone()))
            .bind(&bind_addr)
            .map_err(|e| {
                warn!(error = %e, "failed to bind {}", bind_addr);
                GatewayError::Config(format!("Failed to bind {}: {}", bind_addr, e))
            })?;

        if let Some(workers) = workers {
            server = server.workers(workers);
        }

        info!("HTTP server listening on {}", bind_addr);

        server
            .run()
            .await
            .map_err(|e| GatewayError::server(format!("Server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
