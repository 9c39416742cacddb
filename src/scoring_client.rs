use crate::config::ConsoleConfig;
use crate::identity::{audience_for, AuthError, IdentityTokenSource};
use crate::models::ApplicantRecord;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

const NO_DETAILS: &str = "No specific details provided by the server.";

/// Categorized failure of a scoring submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    Timeout,
    Network(String),
    Http { status: u16, details: String },
    UnexpectedFormat(String),
    Auth(String),
    Unexpected(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Timeout => write!(
                f,
                "Request Timeout: The API took too long to respond. Please try again later."
            ),
            SubmitError::Network(_) => write!(
                f,
                "Network Error: Could not connect to the API. Check your internet connection or the API status."
            ),
            SubmitError::Http { status, details } => write!(
                f,
                "API Error: The server returned status code {}. (Expected 200)\nServer details: {}",
                status, details
            ),
            SubmitError::UnexpectedFormat(msg) => write!(
                f,
                "API returned an unexpected response format. {}",
                msg
            ),
            SubmitError::Auth(msg) => write!(f, "Authentication Failed: {}", msg),
            SubmitError::Unexpected(msg) => write!(f, "An unexpected error occurred: {}", msg),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<AuthError> for SubmitError {
    fn from(err: AuthError) -> Self {
        SubmitError::Auth(err.to_string())
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SubmitError::Timeout
        } else if err.is_connect() {
            SubmitError::Network(err.to_string())
        } else {
            SubmitError::Unexpected(err.to_string())
        }
    }
}

/// Extracts the server's explanation from an error response body.
///
/// JSON bodies yield their `details` key (or a fixed notice when absent);
/// anything else is returned verbatim.
pub fn error_details(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("details") {
            Some(Value::String(details)) => details.clone(),
            Some(other) => other.to_string(),
            None => NO_DETAILS.to_string(),
        },
        Ok(_) => NO_DETAILS.to_string(),
        Err(_) => body.to_string(),
    }
}

/// Client for the scoring endpoint.
#[derive(Clone)]
pub struct ScoringClient {
    client: reqwest::Client,
    api_url: String,
    audience: String,
    tokens: Option<IdentityTokenSource>,
}

impl ScoringClient {
    /// Creates a new `ScoringClient`.
    ///
    /// # Arguments
    ///
    /// * `api_url` - Full URL of the scoring endpoint.
    /// * `timeout` - Upper bound on one request, connection included.
    /// * `tokens` - Credential source, or `None` to send unauthenticated requests.
    pub fn new(
        api_url: impl Into<String>,
        timeout: Duration,
        tokens: Option<IdentityTokenSource>,
    ) -> Result<Self, SubmitError> {
        let api_url = api_url.into();
        let audience = audience_for(&api_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Unexpected(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            api_url,
            audience,
            tokens,
        })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self, SubmitError> {
        let tokens = if config.auth_enabled {
            Some(IdentityTokenSource::new(config.key_file.clone())?)
        } else {
            None
        };
        Self::new(config.api_url.clone(), config.request_timeout, tokens)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Scores one applicant.
    ///
    /// The record is sent as a one-element array and the first element of
    /// the response array is returned.
    pub async fn submit(&self, record: &ApplicantRecord) -> Result<Map<String, Value>, SubmitError> {
        let mut request = self.client.post(&self.api_url).json(&[record]);

        if let Some(tokens) = &self.tokens {
            let token = tokens.token_for(&self.audience).await?;
            request = request.bearer_auth(token);
        }

        tracing::info!(
            "Submitting applicant {} to {}",
            record.sk_id_curr,
            self.api_url
        );

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::new());
            let details = error_details(&body);
            tracing::warn!("Scoring service returned {}: {}", status, details);
            return Err(SubmitError::Http { status, details });
        }

        let body = response.bytes().await?;
        let payload: Value = serde_json::from_slice(&body).map_err(|e| {
            SubmitError::UnexpectedFormat(format!("Response is not JSON: {}", e))
        })?;

        first_record(payload)
    }
}

fn first_record(payload: Value) -> Result<Map<String, Value>, SubmitError> {
    let expected = || SubmitError::UnexpectedFormat("Expected a list of results.".to_string());
    match payload {
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Object(record)) => Ok(record),
            _ => Err(expected()),
        },
        _ => Err(expected()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn details_prefer_json_key() {
        assert_eq!(
            error_details(r#"{"error":"x","details":"bureau.csv missing"}"#),
            "bureau.csv missing"
        );
        assert_eq!(error_details(r#"{"error":"x"}"#), NO_DETAILS);
        assert_eq!(error_details("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn first_record_requires_non_empty_array_of_objects() {
        assert!(first_record(json!([])).is_err());
        assert!(first_record(json!({"a": 1})).is_err());
        assert!(first_record(json!([1])).is_err());
        let record = first_record(json!([{"a": 1}, {"a": 2}])).unwrap();
        assert_eq!(record["a"], 1);
    }

    #[test]
    fn client_derives_audience() {
        let client =
            ScoringClient::new("http://localhost:5000/score/credit", Duration::from_secs(5), None)
                .unwrap();
        assert_eq!(client.audience(), "http://localhost:5000");
    }

    #[test]
    fn messages_are_user_facing() {
        assert!(SubmitError::Timeout.to_string().starts_with("Request Timeout"));
        let http = SubmitError::Http {
            status: 503,
            details: "down".to_string(),
        };
        assert!(http.to_string().contains("503"));
        assert!(http.to_string().contains("down"));
    }
}
