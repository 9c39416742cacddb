use crate::batch::ScoringBatch;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{ApplicantRecord, ErrorBody, ScoredApplicant};
use crate::scoring::{ScorerMode, ScoringEngine};
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Scoring handle built once at startup; never mutated afterwards.
    pub engine: ScoringEngine,
}

impl AppState {
    pub fn new(config: Config, engine: ScoringEngine) -> Self {
        Self { config, engine }
    }
}

/// Fixed payload returned by `GET /`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceBanner {
    pub status: &'static str,
    pub message: &'static str,
    pub endpoint: &'static str,
}

pub const BANNER: ServiceBanner = ServiceBanner {
    status: "API is operational",
    message: "Welcome to the Credit Risk Scoring API!",
    endpoint: "POST JSON data to /score/credit for predictions.",
};

/// GET /
///
/// Returns a fixed welcome payload. Never fails.
#[utoipa::path(
    get,
    path = "/",
    tag = "scoring",
    responses((status = 200, description = "Service banner", body = ServiceBanner))
)]
pub async fn root() -> Json<ServiceBanner> {
    Json(BANNER)
}

/// GET /health
///
/// Returns the service status, version, scorer information and request limits.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
#[utoipa::path(
    get,
    path = "/health",
    tag = "scoring",
    responses((status = 200, description = "Service health and scorer status"))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "scorer": state.engine.status(),
            "limits": {
                "max_body_bytes": state.config.max_body_bytes,
                "rate_limit_per_second": state.config.rate_limit_per_second,
                "rate_limit_burst": state.config.rate_limit_burst,
            },
        })),
    )
}

/// POST /score/credit
///
/// Scores one applicant (JSON object) or a batch (JSON array of objects).
/// Each response element is the submitted record extended with
/// `CREDIT_RISK_SCORE`, `FRAUD_PROBABILITY`, `FINAL_DECISION` and, when the
/// model provides it, `AML_SUSPICION`.
///
/// The body is parsed as JSON whatever the declared content type.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `body` - Raw request body.
///
/// # Returns
///
/// * `Result<Json<Vec<Map<String, Value>>>, AppError>` - Scored records in request order, or an error.
#[utoipa::path(
    post,
    path = "/score/credit",
    tag = "scoring",
    request_body(
        content = Vec<ApplicantRecord>,
        description = "A single applicant object or an array of applicants",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Scored records, same length and order as the request", body = [ScoredApplicant]),
        (status = 400, description = "Body is not JSON", body = ErrorBody),
        (status = 422, description = "Records do not match the applicant schema", body = ErrorBody),
        (status = 500, description = "Scoring or internal failure", body = ErrorBody)
    )
)]
pub async fn score_credit(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Vec<Map<String, Value>>>, AppError> {
    let request_id = Uuid::new_v4();
    tracing::info!("POST /score/credit [{}] - {} bytes", request_id, body.len());

    let payload: Value = serde_json::from_slice(&body)?;
    let batch = ScoringBatch::from_json(payload)?;

    tracing::debug!(
        "[{}] Built batch: {} record(s), columns {:?}",
        request_id,
        batch.len(),
        batch.columns()
    );

    let duplicates = batch.duplicate_ids();
    if !duplicates.is_empty() {
        tracing::warn!(
            "[{}] Duplicate SK_ID_CURR values in batch: {:?}",
            request_id,
            duplicates
        );
    }

    if state.engine.mode() == ScorerMode::Degraded {
        tracing::warn!(
            "[{}] Risk model not loaded; returning degraded response",
            request_id
        );
    }

    let records = state.engine.score(batch)?;

    tracing::info!(
        "[{}] Scoring completed for {} record(s)",
        request_id,
        records.len()
    );

    Ok(Json(records))
}
