use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the serialized risk model.
pub const DEFAULT_MODEL_PATH: &str = "models/credit_risk_model.json";

/// Scoring endpoint used by the console when `SCORING_API_URL` is unset.
pub const DEFAULT_SCORING_API_URL: &str =
    "https://integrated-risk-api-670590024965.us-central1.run.app/score/credit";

pub const DEFAULT_KEY_FILE: &str = "sa_key.json";

/// Upper bound on a single scoring round trip from the console.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 900;

/// Scoring service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub max_body_bytes: usize,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            max_body_bytes: 5 * 1024 * 1024,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            host: std::env::var("HOST")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            model_path: std::env::var("MODEL_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .unwrap_or_else(|_| defaults.max_body_bytes.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a positive integer"))
                .and_then(|bytes: usize| {
                    if bytes == 0 {
                        anyhow::bail!("MAX_BODY_BYTES cannot be zero");
                    }
                    Ok(bytes)
                })?,
            rate_limit_per_second: std::env::var("RATE_LIMIT_PER_SECOND")
                .unwrap_or_else(|_| defaults.rate_limit_per_second.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_PER_SECOND must be a positive integer"))
                .and_then(|rate: u64| {
                    if rate == 0 {
                        anyhow::bail!("RATE_LIMIT_PER_SECOND cannot be zero");
                    }
                    Ok(rate)
                })?,
            rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                .unwrap_or_else(|_| defaults.rate_limit_burst.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_BURST must be a positive integer"))
                .and_then(|burst: u32| {
                    if burst == 0 {
                        anyhow::bail!("RATE_LIMIT_BURST cannot be zero");
                    }
                    Ok(burst)
                })?,
        };

        tracing::debug!("Bind address: {}:{}", config.host, config.port);
        tracing::debug!("Model path: {}", config.model_path.display());
        tracing::debug!(
            "Rate limit: {}/s, burst {}",
            config.rate_limit_per_second,
            config.rate_limit_burst
        );

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Interactive console configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub key_file: PathBuf,
    pub request_timeout: Duration,
    pub auth_enabled: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_SCORING_API_URL.to_string(),
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            auth_enabled: true,
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            api_url: validate_api_url(
                std::env::var("SCORING_API_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(defaults.api_url),
            )?,
            key_file: std::env::var("SA_KEY_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.key_file),
            request_timeout: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .map(|raw| {
                    raw.parse::<u64>().map_err(|_| {
                        anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be a positive integer")
                    })
                })
                .transpose()?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            auth_enabled: !matches!(
                std::env::var("AUTH_DISABLED").as_deref(),
                Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes")
            ),
        };

        if config.request_timeout.is_zero() {
            anyhow::bail!("REQUEST_TIMEOUT_SECS cannot be zero");
        }

        tracing::debug!("Scoring API URL: {}", config.api_url);
        tracing::debug!("Key file: {}", config.key_file.display());
        tracing::debug!("Request timeout: {:?}", config.request_timeout);
        if !config.auth_enabled {
            tracing::warn!("Authentication disabled, requests will be sent without a bearer token");
        }

        Ok(config)
    }
}

fn validate_api_url(url: String) -> anyhow::Result<String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("SCORING_API_URL must start with http:// or https://");
    }
    url::Url::parse(&url)
        .map_err(|e| anyhow::anyhow!("SCORING_API_URL is not a valid URL: {}", e))?;
    Ok(url)
}
