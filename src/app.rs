//! Router assembly and OpenAPI document.

use crate::handlers::{self, AppState, ServiceBanner};
use crate::models::{
    AmlSuspicion, ApplicantRecord, CodeGender, ErrorBody, FinalDecision, IncomeType,
    RiskAssessment, ScoredApplicant,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::root, handlers::health, handlers::score_credit),
    components(schemas(
        ApplicantRecord,
        RiskAssessment,
        ScoredApplicant,
        ErrorBody,
        ServiceBanner,
        CodeGender,
        IncomeType,
        AmlSuspicion,
        FinalDecision
    )),
    tags((name = "scoring", description = "Credit, fraud and AML risk scoring"))
)]
pub struct ApiDoc;

/// Public scoring routes with the request-size limit applied.
///
/// The caller may add further layers (e.g. rate limiting) before handing the
/// router to [`build_app`].
pub fn api_routes(max_body_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/score/credit", post(handlers::score_credit))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
}

/// Builds the full application: health check and API docs (never rate
/// limited) merged with the given scoring routes.
pub fn build_app(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
        assert!(paths.iter().any(|p| p.as_str() == "/score/credit"));
    }
}
