//! Bearer credentials for the scoring service.
//!
//! Tokens are minted from a client-credentials key file and cached per
//! audience until shortly before they expire.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use moka::future::Cache;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Tokens within this many seconds of expiry are refreshed.
/// Short-lived tokens use a tenth of their lifetime instead.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the provider omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Provider lifetimes are clamped to one day.
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// Contents of the key file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
    access_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
    refresh_at: DateTime<Utc>,
}

/// Clamped token lifetime and the number of seconds after which it should be
/// replaced, both derived from the provider's `expires_in`.
fn token_window(expires_in: Option<i64>) -> (i64, i64) {
    let lifetime = expires_in
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
        .min(MAX_TOKEN_LIFETIME_SECS);
    let margin = EXPIRY_MARGIN_SECS.min(lifetime / 10);
    (lifetime, lifetime - margin)
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    KeyFileMissing(PathBuf),
    KeyFileInvalid(String),
    InvalidAudience(String),
    Exchange(String),
    MissingToken,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::KeyFileMissing(path) => {
                write!(f, "Key file not found at {}", path.display())
            }
            AuthError::KeyFileInvalid(msg) => write!(f, "Key file is invalid: {}", msg),
            AuthError::InvalidAudience(msg) => write!(f, "Cannot derive token audience: {}", msg),
            AuthError::Exchange(msg) => write!(f, "Token exchange failed: {}", msg),
            AuthError::MissingToken => write!(f, "Token endpoint returned no token"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Derives the token audience (scheme, host and port) from the scoring URL.
pub fn audience_for(api_url: &str) -> Result<String, AuthError> {
    let url = url::Url::parse(api_url).map_err(|e| AuthError::InvalidAudience(e.to_string()))?;
    if !url.has_host() {
        return Err(AuthError::InvalidAudience(format!(
            "{} has no host",
            api_url
        )));
    }
    Ok(url.origin().ascii_serialization())
}

/// Mints and caches identity tokens from a key file.
#[derive(Clone)]
pub struct IdentityTokenSource {
    client: reqwest::Client,
    key_file: PathBuf,
    cache: Cache<String, CachedToken>,
}

impl IdentityTokenSource {
    pub fn new(key_file: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::Exchange(format!("Failed to create HTTP client: {}", e)))?;

        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(MAX_TOKEN_LIFETIME_SECS as u64))
            .max_capacity(16)
            .build();

        Ok(Self {
            client,
            key_file: key_file.into(),
            cache,
        })
    }

    /// Returns a token valid for `audience`, minting one when the cache has
    /// none or the cached one is about to expire.
    pub async fn token_for(&self, audience: &str) -> Result<String, AuthError> {
        if let Some(cached) = self.cache.get(audience).await {
            if cached.refresh_at > Utc::now() {
                tracing::debug!("Using cached identity token for {}", audience);
                return Ok(cached.token);
            }
            tracing::debug!("Cached identity token for {} is expiring", audience);
        }

        let key = self.read_key().await?;
        let fresh = self.exchange(&key, audience).await?;
        self.cache.insert(audience.to_string(), fresh.clone()).await;

        tracing::info!(
            "Identity token generated for {} (expires {})",
            audience,
            fresh.expires_at.to_rfc3339()
        );
        Ok(fresh.token)
    }

    async fn read_key(&self) -> Result<ServiceAccountKey, AuthError> {
        let raw = match tokio::fs::read(&self.key_file).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::KeyFileMissing(self.key_file.clone()))
            }
            Err(e) => return Err(AuthError::KeyFileInvalid(e.to_string())),
        };
        serde_json::from_slice(&raw).map_err(|e| AuthError::KeyFileInvalid(e.to_string()))
    }

    async fn exchange(
        &self,
        key: &ServiceAccountKey,
        audience: &str,
    ) -> Result<CachedToken, AuthError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", key.client_id.as_str()),
            ("client_secret", key.client_secret.as_str()),
            ("audience", audience),
        ];

        let response = self
            .client
            .post(&key.token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Exchange(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AuthError::Exchange(format!(
                "provider returned {}: {}",
                status, error_text
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(format!("invalid token response: {}", e)))?;

        let token = body
            .id_token
            .or(body.access_token)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let (lifetime, refresh_after) = token_window(body.expires_in);
        let issued = Utc::now();
        let after = |secs: i64| {
            issued
                .checked_add_signed(ChronoDuration::seconds(secs))
                .ok_or_else(|| AuthError::Exchange(format!("token lifetime {}s out of range", secs)))
        };

        Ok(CachedToken {
            token,
            expires_at: after(lifetime)?,
            refresh_at: after(refresh_after)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audience_is_origin_of_scoring_url() {
        assert_eq!(
            audience_for("https://risk.example.run.app/score/credit").unwrap(),
            "https://risk.example.run.app"
        );
        assert_eq!(
            audience_for("http://127.0.0.1:5000/score/credit").unwrap(),
            "http://127.0.0.1:5000"
        );
        assert!(audience_for("not a url").is_err());
    }

    #[test]
    fn token_window_clamps_and_scales_margin() {
        assert_eq!(token_window(None), (3600, 3540));
        assert_eq!(token_window(Some(0)), (3600, 3540));
        assert_eq!(token_window(Some(-5)), (3600, 3540));
        assert_eq!(token_window(Some(i64::MAX)), (86_400, 86_340));
        assert_eq!(token_window(Some(30)), (30, 27));
        assert_eq!(token_window(Some(5)), (5, 5));
    }

    #[tokio::test]
    async fn missing_key_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = IdentityTokenSource::new(dir.path().join("absent.json")).unwrap();
        let err = source.token_for("https://svc").await.unwrap_err();
        assert!(matches!(err, AuthError::KeyFileMissing(_)));
    }

    #[tokio::test]
    async fn malformed_key_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa_key.json");
        std::fs::write(&path, "{\"client_id\": 1}").unwrap();
        let source = IdentityTokenSource::new(&path).unwrap();
        let err = source.token_for("https://svc").await.unwrap_err();
        assert!(matches!(err, AuthError::KeyFileInvalid(_)));
    }
}
