use crate::features::{is_categorical_feature, is_numeric_feature};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Serialized risk model loaded once at startup.
///
/// The artifact is a JSON document with one linear head per signal and the
/// thresholds that turn the three signals into a decision:
///
/// ```json
/// {
///   "name": "integrated-risk",
///   "version": "2024.1",
///   "credit": { "intercept": -1.0, "features": [...], "categorical": {...} },
///   "fraud":  { ... },
///   "aml":    { "head": { ... }, "high_threshold": 0.5, "neutral_threshold": 0.25 },
///   "decision": { "high_risk_threshold": 0.5, "review_threshold": 0.25, "reject_min_signals": 3 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub version: String,
    pub credit: LinearHead,
    pub fraud: LinearHead,
    pub aml: AmlHead,
    pub decision: DecisionPolicy,
}

/// Logistic head: `intercept + Σ weight·(x − mean)/scale + Σ offsets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearHead {
    pub intercept: f64,
    pub features: Vec<FeatureWeight>,
    /// Column name → level → additive logit offset.
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub name: String,
    pub weight: f64,
    pub mean: f64,
    pub scale: f64,
}

/// AML head and the probability cut-offs of its bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmlHead {
    pub head: LinearHead,
    pub high_threshold: f64,
    pub neutral_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionPolicy {
    /// Credit and fraud probabilities at or above this count as high risk.
    pub high_risk_threshold: f64,
    /// Credit probability at or above this forces at least a review.
    pub review_threshold: f64,
    /// Number of high-risk signals that leads to a rejection.
    pub reject_min_signals: usize,
}

/// Errors raised while loading a model artifact.
#[derive(Debug)]
pub enum ArtifactError {
    /// The artifact file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The artifact is not valid JSON for the expected schema.
    Parse(serde_json::Error),
    /// The artifact parsed but its contents are unusable.
    Invalid(String),
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactError::Io { path, source } => {
                write!(f, "failed to read model artifact {}: {}", path.display(), source)
            }
            ArtifactError::Parse(e) => write!(f, "malformed model artifact: {}", e),
            ArtifactError::Invalid(msg) => write!(f, "invalid model artifact: {}", msg),
        }
    }
}

impl std::error::Error for ArtifactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArtifactError::Io { source, .. } => Some(source),
            ArtifactError::Parse(e) => Some(e),
            ArtifactError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ArtifactError {
    fn from(err: serde_json::Error) -> Self {
        ArtifactError::Parse(err)
    }
}

/// A validated artifact together with the SHA-256 checksum of its bytes.
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    pub artifact: ModelArtifact,
    /// Hex-encoded SHA-256 of the file contents.
    pub checksum: String,
}

impl ModelArtifact {
    /// Reads, checksums and validates the artifact at `path`.
    pub async fn load(path: &Path) -> Result<LoadedArtifact, ArtifactError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<LoadedArtifact, ArtifactError> {
        let checksum = compute_checksum(bytes);
        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        artifact.validate()?;
        Ok(LoadedArtifact { artifact, checksum })
    }

    /// Rejects artifacts that would produce meaningless scores.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        validate_head("credit", &self.credit)?;
        validate_head("fraud", &self.fraud)?;
        validate_head("aml", &self.aml.head)?;

        let aml = &self.aml;
        if !(0.0..=1.0).contains(&aml.neutral_threshold)
            || !(0.0..=1.0).contains(&aml.high_threshold)
            || aml.neutral_threshold > aml.high_threshold
        {
            return Err(ArtifactError::Invalid(format!(
                "aml thresholds must satisfy 0 <= neutral ({}) <= high ({}) <= 1",
                aml.neutral_threshold, aml.high_threshold
            )));
        }

        let policy = &self.decision;
        if !(0.0..=1.0).contains(&policy.high_risk_threshold)
            || !(0.0..=1.0).contains(&policy.review_threshold)
        {
            return Err(ArtifactError::Invalid(
                "decision thresholds must lie within [0, 1]".to_string(),
            ));
        }
        if policy.reject_min_signals == 0 || policy.reject_min_signals > 3 {
            return Err(ArtifactError::Invalid(format!(
                "reject_min_signals must be between 1 and 3, got {}",
                policy.reject_min_signals
            )));
        }

        Ok(())
    }
}

fn validate_head(label: &str, head: &LinearHead) -> Result<(), ArtifactError> {
    if !head.intercept.is_finite() {
        return Err(ArtifactError::Invalid(format!(
            "{} intercept is not finite",
            label
        )));
    }
    if head.features.is_empty() {
        return Err(ArtifactError::Invalid(format!(
            "{} head has no features",
            label
        )));
    }
    for feature in &head.features {
        if !is_numeric_feature(&feature.name) {
            return Err(ArtifactError::Invalid(format!(
                "{} head references unknown feature '{}'",
                label, feature.name
            )));
        }
        if !feature.weight.is_finite() || !feature.mean.is_finite() {
            return Err(ArtifactError::Invalid(format!(
                "{} feature '{}' has a non-finite coefficient",
                label, feature.name
            )));
        }
        if !(feature.scale.is_finite() && feature.scale > 0.0) {
            return Err(ArtifactError::Invalid(format!(
                "{} feature '{}' must have a positive scale",
                label, feature.name
            )));
        }
    }
    for (column, levels) in &head.categorical {
        if !is_categorical_feature(column) {
            return Err(ArtifactError::Invalid(format!(
                "{} head references unknown categorical column '{}'",
                label, column
            )));
        }
        if levels.values().any(|offset| !offset.is_finite()) {
            return Err(ArtifactError::Invalid(format!(
                "{} column '{}' has a non-finite offset",
                label, column
            )));
        }
    }
    Ok(())
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
