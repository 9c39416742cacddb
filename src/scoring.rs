use crate::batch::ScoringBatch;
use crate::features::{categorical_value, numeric_value};
use crate::model_artifact::{LinearHead, LoadedArtifact, ModelArtifact};
use crate::models::{AmlSuspicion, ApplicantRecord, FinalDecision, RiskAssessment};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Dummy values returned while no model is available.
pub const DEGRADED_CREDIT_RISK_SCORE: f64 = 0.85;
pub const DEGRADED_FRAUD_PROBABILITY: f64 = 0.12;
pub const DEGRADED_DECISION: FinalDecision = FinalDecision::Review;

/// Errors raised while scoring a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// The scorer returned a different number of assessments than records.
    LengthMismatch { expected: usize, actual: usize },
    /// The scorer itself failed.
    Model(String),
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringError::LengthMismatch { expected, actual } => write!(
                f,
                "scorer returned {} assessments for {} records",
                actual, expected
            ),
            ScoringError::Model(msg) => write!(f, "scorer failed: {}", msg),
        }
    }
}

impl std::error::Error for ScoringError {}

/// Turns a batch of applicants into risk assessments, one per record and in
/// the same order.
pub trait Scorer: Send + Sync {
    fn name(&self) -> &str;

    fn score_batch(&self, batch: &ScoringBatch) -> Result<Vec<RiskAssessment>, ScoringError>;
}

/// Logistic scorer driven by a [`ModelArtifact`].
pub struct LinearRiskScorer {
    artifact: ModelArtifact,
}

impl LinearRiskScorer {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }

    /// Scores one applicant. Pure and deterministic.
    pub fn assess(&self, applicant: &ApplicantRecord) -> RiskAssessment {
        let credit_risk_score = sigmoid(logit(&self.artifact.credit, applicant));
        let fraud_probability = sigmoid(logit(&self.artifact.fraud, applicant));
        let aml_probability = sigmoid(logit(&self.artifact.aml.head, applicant));

        let aml = &self.artifact.aml;
        let aml_suspicion = if aml_probability >= aml.high_threshold {
            AmlSuspicion::High
        } else if aml_probability >= aml.neutral_threshold {
            AmlSuspicion::Neutral
        } else {
            AmlSuspicion::Low
        };

        let final_decision = self.decide(credit_risk_score, fraud_probability, aml_suspicion);

        RiskAssessment {
            credit_risk_score,
            fraud_probability,
            aml_suspicion: Some(aml_suspicion),
            final_decision,
        }
    }

    fn decide(&self, credit: f64, fraud: f64, aml: AmlSuspicion) -> FinalDecision {
        let policy = &self.artifact.decision;
        let high_signals = [
            credit >= policy.high_risk_threshold,
            fraud >= policy.high_risk_threshold,
            aml == AmlSuspicion::High,
        ]
        .iter()
        .filter(|high| **high)
        .count();

        if high_signals >= policy.reject_min_signals {
            FinalDecision::Reject
        } else if high_signals > 0 || credit >= policy.review_threshold {
            FinalDecision::Review
        } else {
            FinalDecision::Approve
        }
    }
}

impl Scorer for LinearRiskScorer {
    fn name(&self) -> &str {
        &self.artifact.name
    }

    fn score_batch(&self, batch: &ScoringBatch) -> Result<Vec<RiskAssessment>, ScoringError> {
        Ok(batch.applicants().map(|a| self.assess(a)).collect())
    }
}

/// Stand-in used when the model could not be loaded.
///
/// Produces the same fixed assessment for every record, without an AML signal.
pub struct DegradedScorer;

impl DegradedScorer {
    pub fn assessment() -> RiskAssessment {
        RiskAssessment {
            credit_risk_score: DEGRADED_CREDIT_RISK_SCORE,
            fraud_probability: DEGRADED_FRAUD_PROBABILITY,
            aml_suspicion: None,
            final_decision: DEGRADED_DECISION,
        }
    }
}

impl Scorer for DegradedScorer {
    fn name(&self) -> &str {
        "degraded"
    }

    fn score_batch(&self, batch: &ScoringBatch) -> Result<Vec<RiskAssessment>, ScoringError> {
        Ok(vec![Self::assessment(); batch.len()])
    }
}

fn logit(head: &LinearHead, applicant: &ApplicantRecord) -> f64 {
    let numeric: f64 = head
        .features
        .iter()
        .map(|f| match numeric_value(applicant, &f.name) {
            Some(x) => f.weight * (x - f.mean) / f.scale,
            // missing inputs are imputed with the feature mean
            None => 0.0,
        })
        .sum();

    let categorical: f64 = head
        .categorical
        .iter()
        .filter_map(|(column, levels)| {
            categorical_value(applicant, column).and_then(|level| levels.get(level))
        })
        .sum();

    head.intercept + numeric + categorical
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

// ============ Engine ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerMode {
    Model,
    Degraded,
}

/// Identity of the loaded model artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub checksum: String,
    pub loaded_at: DateTime<Utc>,
}

/// Scorer status reported by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ScorerStatus {
    pub mode: ScorerMode,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelInfo>,
}

/// Process-wide scoring handle. Built once at startup and shared read-only.
#[derive(Clone)]
pub struct ScoringEngine {
    scorer: Arc<dyn Scorer>,
    mode: ScorerMode,
    model: Option<ModelInfo>,
}

impl ScoringEngine {
    /// Loads the artifact at `path`, falling back to degraded mode on failure.
    pub async fn load(path: &Path) -> Self {
        tracing::info!("Loading model artifact from {}", path.display());
        match ModelArtifact::load(path).await {
            Ok(loaded) => {
                let engine = Self::from_artifact(loaded);
                if let Some(ref info) = engine.model {
                    tracing::info!(
                        "✓ Risk model '{}' v{} loaded (sha256 {})",
                        info.name,
                        info.version,
                        info.checksum
                    );
                }
                engine
            }
            Err(e) => {
                tracing::warn!(
                    "Model load failed, serving degraded dummy responses: {}",
                    e
                );
                Self::degraded()
            }
        }
    }

    pub fn from_artifact(loaded: LoadedArtifact) -> Self {
        let info = ModelInfo {
            name: loaded.artifact.name.clone(),
            version: loaded.artifact.version.clone(),
            checksum: loaded.checksum,
            loaded_at: Utc::now(),
        };
        Self {
            scorer: Arc::new(LinearRiskScorer::new(loaded.artifact)),
            mode: ScorerMode::Model,
            model: Some(info),
        }
    }

    pub fn degraded() -> Self {
        Self {
            scorer: Arc::new(DegradedScorer),
            mode: ScorerMode::Degraded,
            model: None,
        }
    }

    /// Wraps an arbitrary scorer implementation.
    pub fn with_scorer(scorer: Arc<dyn Scorer>) -> Self {
        Self {
            scorer,
            mode: ScorerMode::Model,
            model: None,
        }
    }

    pub fn mode(&self) -> ScorerMode {
        self.mode
    }

    pub fn status(&self) -> ScorerStatus {
        ScorerStatus {
            mode: self.mode,
            name: self.scorer.name().to_string(),
            model: self.model.clone(),
        }
    }

    /// Scores the batch and returns each submitted record extended with its
    /// risk fields, in request order.
    pub fn score(&self, batch: ScoringBatch) -> Result<Vec<Map<String, Value>>, ScoringError> {
        let assessments = self.scorer.score_batch(&batch)?;
        if assessments.len() != batch.len() {
            return Err(ScoringError::LengthMismatch {
                expected: batch.len(),
                actual: assessments.len(),
            });
        }

        Ok(batch
            .into_rows()
            .into_iter()
            .zip(assessments.iter())
            .map(|(row, assessment)| row.into_scored(assessment))
            .collect())
    }
}
