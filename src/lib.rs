//! Credit Risk Scoring API Library
//!
//! This library provides the scoring service (credit default, fraud and AML
//! heads combined into one decision) and the interactive console client that
//! submits applicants to it.
//!
//! # Modules
//!
//! - `api`: HTTP-layer components.
//! - `core`: Scoring domain: records, batches, features and the model.
//! - `integrations`: Outbound clients (scoring endpoint, identity provider).
//! - `app`: Router assembly and OpenAPI document.
//! - `batch`: Request payload to record batch conversion.
//! - `config`: Service and console configuration.
//! - `console`: Console command parsing.
//! - `errors`: Error handling types.
//! - `features`: Feature extraction for the model.
//! - `form_state`: Applicant form and submission state machine.
//! - `handlers`: HTTP request handlers.
//! - `identity`: Bearer token minting and caching.
//! - `model_artifact`: Serialized model format and loading.
//! - `models`: Core data models.
//! - `presets`: Built-in applicant profiles.
//! - `render`: Result presentation and export.
//! - `scoring`: Scorers and the scoring engine.
//! - `scoring_client`: HTTP client for the scoring endpoint.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod app;
pub mod batch;
pub mod config;
pub mod console;
pub mod errors;
pub mod features;
pub mod form_state;
pub mod handlers;
pub mod identity;
pub mod model_artifact;
pub mod models;
pub mod presets;
pub mod render;
pub mod scoring;
pub mod scoring_client;
