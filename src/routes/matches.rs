use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::pipeline::{MatchingPipeline, PipelineError, RunOptions};
use crate::models::{
    BuyerRunRequest, ClearMatchesRequest, ErrorResponse, HealthResponse, MatchRunResponse,
    PropertyRunRequest, RunMatchingRequest, ClearMatchesResponse,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MatchingPipeline>,
    pub default_min_score: u8,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/run", web::post().to(run_matching))
        .route("/matches/run/buyer", web::post().to(run_for_buyer))
        .route("/matches/run/property", web::post().to(run_for_property))
        .route("/matches/clear", web::post().to(clear_matches));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

fn pipeline_error(e: PipelineError) -> HttpResponse {
    match &e {
        PipelineError::BuyerNotFound(_) | PipelineError::PropertyNotFound(_) => {
            HttpResponse::NotFound().json(ErrorResponse {
                error: "Not found".to_string(),
                message: e.to_string(),
                status_code: 404,
            })
        }
        PipelineError::CollectionFetch { .. } => {
            tracing::error!("Matching run failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Matching run failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Full matching run endpoint
///
/// POST /api/v1/matches/run
///
/// Request body:
/// ```json
/// {
///   "minScore": 30,
///   "refreshAll": false
/// }
/// ```
///
/// A run with per-pair errors still returns 200; the error count is part
/// of the stats payload.
async fn run_matching(
    state: web::Data<AppState>,
    req: web::Json<RunMatchingRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let options = RunOptions {
        min_score: req.min_score.unwrap_or(state.default_min_score),
        refresh_all: req.refresh_all,
    };

    tracing::info!(
        min_score = options.min_score,
        refresh_all = options.refresh_all,
        "Starting full matching run"
    );

    match state.pipeline.run_full(options).await {
        Ok(stats) => HttpResponse::Ok().json(MatchRunResponse { stats }),
        Err(e) => pipeline_error(e),
    }
}

/// Single-buyer run endpoint
///
/// POST /api/v1/matches/run/buyer
async fn run_for_buyer(
    state: web::Data<AppState>,
    req: web::Json<BuyerRunRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let options = RunOptions {
        min_score: req.min_score.unwrap_or(state.default_min_score),
        refresh_all: false,
    };

    tracing::info!(buyer_id = %req.buyer_id, "Starting single-buyer matching run");

    match state.pipeline.run_for_buyer(&req.buyer_id, options).await {
        Ok(stats) => HttpResponse::Ok().json(MatchRunResponse { stats }),
        Err(e) => pipeline_error(e),
    }
}

/// Single-property run endpoint
///
/// POST /api/v1/matches/run/property
async fn run_for_property(
    state: web::Data<AppState>,
    req: web::Json<PropertyRunRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let options = RunOptions {
        min_score: req.min_score.unwrap_or(state.default_min_score),
        refresh_all: false,
    };

    tracing::info!(property_id = %req.property_id, "Starting single-property matching run");

    match state.pipeline.run_for_property(&req.property_id, options).await {
        Ok(stats) => HttpResponse::Ok().json(MatchRunResponse { stats }),
        Err(e) => pipeline_error(e),
    }
}

/// Bulk clear endpoint. Destructive and non-recoverable; requires an
/// explicit confirm flag.
///
/// POST /api/v1/matches/clear
async fn clear_matches(
    state: web::Data<AppState>,
    req: web::Json<ClearMatchesRequest>,
) -> impl Responder {
    if !req.confirm {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Confirmation required".to_string(),
            message: "Clearing the match table is irreversible; pass \"confirm\": true".to_string(),
            status_code: 400,
        });
    }

    tracing::warn!("Clearing the entire match table");

    match state.pipeline.clear_all().await {
        Ok(deleted) => HttpResponse::Ok().json(ClearMatchesResponse { deleted }),
        Err(e) => pipeline_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }
}
