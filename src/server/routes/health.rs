//! Health check and status endpoints
//!
//! This module provides health check and system status endpoints.

use crate::core::cache::CacheStats;
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use actix_web::{HttpResponse, Result as ActixResult, web};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::time::Instant;
use tracing::debug;

/// Process start marker for uptime reporting
static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Configure health check routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(health_check))
            .route("/detailed", web::get().to(detailed_health_check)),
    )
    .route("/version", web::get().to(version_info));
}

#[derive(Debug, serde::Serialize)]
struct HealthStatus {
    status: Cow<'static, str>,
    timestamp: DateTime<Utc>,
    version: Cow<'static, str>,
}

/// Basic health check endpoint
///
/// Returns a simple health status indicating if the service is running.
/// This endpoint is typically used by load balancers and monitoring systems.
pub async fn health_check(_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("Health check requested");

    let health_status = HealthStatus {
        status: Cow::Borrowed("healthy"),
        timestamp: Utc::now(),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(health_status)))
}

#[derive(Debug, serde::Serialize)]
struct DetailedHealthStatus {
    status: Cow<'static, str>,
    timestamp: DateTime<Utc>,
    version: Cow<'static, str>,
    uptime_seconds: u64,
    /// Whether an LLM client is configured; without one, every analysis is
    /// served by the rule-based synthesizer (still a healthy state)
    llm_configured: bool,
    cache_enabled: bool,
    cache: CacheStats,
    cache_hit_rate: f64,
}

/// Detailed health check endpoint
///
/// Returns cache statistics and the state of the LLM credential
/// configuration, for diagnostics beyond the load-balancer probe.
async fn detailed_health_check(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("Detailed health check requested");

    let cache = state.cache.stats().await;
    let cache_hit_rate = cache.hit_rate();

    let detailed_status = DetailedHealthStatus {
        status: Cow::Borrowed("healthy"),
        timestamp: Utc::now(),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
        uptime_seconds: STARTED_AT.elapsed().as_secs(),
        llm_configured: state.generator.llm_enabled(),
        cache_enabled: state.config.cache().enabled,
        cache,
        cache_hit_rate,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(detailed_status)))
}

#[derive(Debug, serde::Serialize)]
struct VersionInfo {
    name: Cow<'static, str>,
    version: Cow<'static, str>,
    description: Cow<'static, str>,
}

/// Version information endpoint
async fn version_info() -> ActixResult<HttpResponse> {
    let info = VersionInfo {
        name: Cow::Borrowed(env!("CARGO_PKG_NAME")),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
        description: Cow::Borrowed(env!("CARGO_PKG_DESCRIPTION")),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(info)))
}
