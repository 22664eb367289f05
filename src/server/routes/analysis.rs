//! Assessment analysis endpoint
//!
//! `POST /v1/analysis` runs the full pipeline: validate, normalize to a
//! pattern key, admit through the rate limiter, serve from cache or
//! generate, then cache the fresh result. Generation cannot fail, so the
//! only error responses here are validation (400) and rate limiting (429).

use crate::core::pattern::PatternKey;
use crate::core::result::AnalysisResult;
use crate::core::types::AnalysisInput;
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::utils::error::GatewayError;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Configure analysis routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1/analysis")
            .route("", web::post().to(create_analysis))
            .route("/cache/stats", web::get().to(cache_stats)),
    );
}

/// Request body: the raw assessment submission
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub input: AnalysisInput,
}

/// Response body for a completed analysis
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis: AnalysisResult,
    /// Whether the analysis was served from the pattern cache
    pub cached: bool,
    /// Wall-clock time spent on this request; 0 for cache hits
    pub processing_time_ms: u64,
    /// Hit count for the cached entry, including this request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hits: Option<u64>,
}

/// Analyze an assessment submission
pub async fn create_analysis(
    state: web::Data<AppState>,
    request: web::Json<AnalysisRequest>,
) -> ActixResult<HttpResponse> {
    let request_id = Uuid::new_v4();
    let input = request.into_inner().input;

    if let Err(failure) = input.validate() {
        warn!(%request_id, error = %failure, "rejected invalid assessment input");
        return Err(GatewayError::from(failure).into());
    }

    let key = PatternKey::from_input(&input);
    let fingerprint = key.fingerprint();

    if let Err(failure) = state.rate_limit.check(&fingerprint) {
        warn!(%request_id, %fingerprint, "rate limit rejected analysis request");
        return Err(GatewayError::from(failure).into());
    }

    if let Some(hit) = state.cache.lookup(&key).await {
        info!(%request_id, %fingerprint, hits = hit.cache_hits, "served analysis from cache");
        return Ok(HttpResponse::Ok().json(AnalysisResponse {
            analysis: hit.analysis,
            cached: true,
            processing_time_ms: 0,
            cache_hits: Some(hit.cache_hits),
        }));
    }

    let analysis = state.generator.generate(&input).await;
    state.cache.store(&key, &analysis).await;

    info!(
        %request_id,
        %fingerprint,
        model = %analysis.model,
        processing_time_ms = analysis.processing_time_ms,
        "generated fresh analysis"
    );

    let processing_time_ms = analysis.processing_time_ms;
    Ok(HttpResponse::Ok().json(AnalysisResponse {
        analysis,
        cached: false,
        processing_time_ms,
        cache_hits: None,
    }))
}

/// Cache statistics view, including the derived hit rate
#[derive(Debug, Serialize)]
struct CacheStatsView {
    #[serde(flatten)]
    stats: crate::core::cache::CacheStats,
    hit_rate: f64,
}

/// Report analysis-cache statistics
pub async fn cache_stats(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let stats = state.cache.stats().await;
    let hit_rate = stats.hit_rate();
    Ok(HttpResponse::Ok().json(ApiResponse::success(CacheStatsView { stats, hit_rate })))
}
