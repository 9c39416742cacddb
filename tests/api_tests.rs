/// Router-level tests for the scoring service
/// Drives the full axum app with in-memory requests (no socket, no rate limiting)
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use credit_risk_api::api::app::{api_routes, build_app};
use credit_risk_api::batch::ScoringBatch;
use credit_risk_api::config::Config;
use credit_risk_api::core::scoring::{Scorer, ScoringEngine, ScoringError};
use credit_risk_api::handlers::AppState;
use credit_risk_api::model_artifact::ModelArtifact;
use credit_risk_api::models::RiskAssessment;
use credit_risk_api::presets::builtin_presets;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SHIPPED_MODEL: &[u8] = include_bytes!("../models/credit_risk_model.json");

fn app_with(engine: ScoringEngine) -> Router {
    let config = Config::default();
    let api = api_routes(config.max_body_bytes);
    build_app(Arc::new(AppState::new(config, engine)), api)
}

fn model_app() -> Router {
    let loaded = ModelArtifact::from_bytes(SHIPPED_MODEL).unwrap();
    app_with(ScoringEngine::from_artifact(loaded))
}

async fn post_score(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/score/credit")
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn preset_values(index: usize) -> Value {
    Value::Object(builtin_presets()[index].values().clone())
}

#[cfg(test)]
mod root_and_health {
    use super::*;

    #[tokio::test]
    async fn root_returns_banner() {
        let (status, body) = get_json(model_app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "API is operational",
                "message": "Welcome to the Credit Risk Scoring API!",
                "endpoint": "POST JSON data to /score/credit for predictions."
            })
        );
    }

    #[tokio::test]
    async fn health_reports_loaded_model() {
        let (status, body) = get_json(model_app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["scorer"]["mode"], "model");
        assert_eq!(body["scorer"]["model"]["name"], "integrated-risk");
    }

    #[tokio::test]
    async fn health_reports_configured_limits() {
        let config = Config {
            max_body_bytes: 4096,
            rate_limit_per_second: 3,
            rate_limit_burst: 7,
            ..Config::default()
        };
        let api = api_routes(config.max_body_bytes);
        let app = build_app(Arc::new(AppState::new(config, ScoringEngine::degraded())), api);

        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["limits"],
            json!({"max_body_bytes": 4096, "rate_limit_per_second": 3, "rate_limit_burst": 7})
        );
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let (status, body) = get_json(model_app(), "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/score/credit"].is_object());
    }
}

#[cfg(test)]
mod request_errors {
    use super::*;

    #[tokio::test]
    async fn non_json_body_is_400() {
        let (status, body) = post_score(model_app(), "SK_ID_CURR=1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Request payload must be JSON."}));
    }

    #[tokio::test]
    async fn schema_violations_are_422() {
        let cases = [
            json!([]),
            json!("text"),
            json!([1, 2]),
            json!([{"AMT_CREDIT": 1000.0}]),
            json!([{"SK_ID_CURR": 1, "EXT_SOURCE_1": 1.5}]),
            json!([{"SK_ID_CURR": 1, "DAYS_BIRTH": 100}]),
            json!([{"SK_ID_CURR": 1, "CODE_GENDER": "X"}]),
        ];
        for payload in cases {
            let (status, body) = post_score(model_app(), payload.to_string()).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", payload);
            assert_eq!(body["error"], "Processing error. Check input data format.");
            assert_eq!(body["kind"], "validation");
            assert!(body["details"].is_string());
        }
    }

    struct ShortScorer;

    impl Scorer for ShortScorer {
        fn name(&self) -> &str {
            "short"
        }

        fn score_batch(&self, _: &ScoringBatch) -> Result<Vec<RiskAssessment>, ScoringError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn scorer_contract_violation_is_500() {
        let app = app_with(ScoringEngine::with_scorer(Arc::new(ShortScorer)));
        let (status, body) = post_score(app, json!([{"SK_ID_CURR": 1}]).to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "scoring");
        assert!(body["details"].as_str().unwrap().contains("for 1 records"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let config = Config {
            max_body_bytes: 64,
            ..Config::default()
        };
        let api = api_routes(config.max_body_bytes);
        let app = build_app(
            Arc::new(AppState::new(config, ScoringEngine::degraded())),
            api,
        );
        let payload = json!([{"SK_ID_CURR": 1, "ORGANIZATION_TYPE": "x".repeat(200)}]);
        let (status, _) = post_score(app, payload.to_string()).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}

#[cfg(test)]
mod scoring {
    use super::*;

    #[tokio::test]
    async fn single_object_is_scored_as_one_element_batch() {
        let (status, body) = post_score(model_app(), preset_values(1).to_string()).await;
        assert_eq!(status, StatusCode::OK);
        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["SK_ID_CURR"], 100002);
    }

    #[tokio::test]
    async fn response_echoes_input_and_adds_risk_fields() {
        let input = json!([{"SK_ID_CURR": 42, "EXT_SOURCE_2": 0.3, "CUSTOM_NOTE": "kept"}]);
        let (status, body) = post_score(model_app(), input.to_string()).await;
        assert_eq!(status, StatusCode::OK);

        let record = &body[0];
        assert_eq!(record["SK_ID_CURR"], 42);
        assert_eq!(record["EXT_SOURCE_2"], 0.3);
        assert_eq!(record["CUSTOM_NOTE"], "kept");
        for key in ["CREDIT_RISK_SCORE", "FRAUD_PROBABILITY"] {
            let p = record[key].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&p), "{} = {}", key, p);
        }
        assert!(["Low", "Neutral", "High"].contains(&record["AML_SUSPICION"].as_str().unwrap()));
        assert!(["Approve", "Review", "Reject"]
            .contains(&record["FINAL_DECISION"].as_str().unwrap()));
    }

    #[tokio::test]
    async fn batch_preserves_length_and_order() {
        let batch: Vec<Value> = (0..5).map(preset_values).collect();
        let (status, body) = post_score(model_app(), Value::Array(batch).to_string()).await;
        assert_eq!(status, StatusCode::OK);

        let ids: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["SK_ID_CURR"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![100001, 100002, 100003, 100004, 100005]);
    }

    #[tokio::test]
    async fn shipped_model_matches_preset_expectations() {
        let batch: Vec<Value> = (0..5).map(preset_values).collect();
        let (_, body) = post_score(model_app(), Value::Array(batch).to_string()).await;
        let decisions: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["FINAL_DECISION"].as_str().unwrap())
            .collect();
        assert_eq!(
            decisions,
            vec!["Review", "Approve", "Review", "Reject", "Review"]
        );
        assert_eq!(body[4]["AML_SUSPICION"], "High");
    }

    #[tokio::test]
    async fn scoring_is_idempotent() {
        let payload = Value::Array((0..5).map(preset_values).collect()).to_string();
        let (_, first) = post_score(model_app(), payload.clone()).await;
        let (_, second) = post_score(model_app(), payload).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn degraded_mode_returns_one_dummy_per_record() {
        let app = app_with(ScoringEngine::degraded());
        let payload = json!([{"SK_ID_CURR": 1}, {"SK_ID_CURR": 2}, {"SK_ID_CURR": 3}]);
        let (status, body) = post_score(app, payload.to_string()).await;
        assert_eq!(status, StatusCode::OK);

        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 3);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record["SK_ID_CURR"], (i + 1) as i64);
            assert_eq!(record["CREDIT_RISK_SCORE"], 0.85);
            assert_eq!(record["FRAUD_PROBABILITY"], 0.12);
            assert_eq!(record["FINAL_DECISION"], "Review");
            assert!(record.get("AML_SUSPICION").is_none());
        }
    }

    #[tokio::test]
    async fn content_type_is_not_required() {
        let response = model_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/score/credit")
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::from(json!([{"SK_ID_CURR": 9}]).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
