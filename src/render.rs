//! Presentation of a scored record in the console.

use crate::models::{
    AmlSuspicion, FinalDecision, AML_SUSPICION, CREDIT_RISK_SCORE, FINAL_DECISION,
    FRAUD_PROBABILITY,
};
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::path::Path;

pub const GREEN: &str = "#4CAF50";
pub const AMBER: &str = "#FFC107";
pub const RED: &str = "#F44336";
pub const GRAY: &str = "gray";

/// Scores at or above this value are shown as high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.5;

pub const EXPORT_FILE_NAME: &str = "risk_assessment_results.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionBanner {
    pub label: &'static str,
    pub color: &'static str,
    pub message: &'static str,
}

/// Maps a decision string to its banner. Unknown values get a gray banner.
pub fn decision_banner(decision: &str) -> DecisionBanner {
    match decision {
        d if d == FinalDecision::Approve.as_str() => DecisionBanner {
            label: "APPROVED",
            color: GREEN,
            message: "This applicant meets the low-risk criteria across all models.",
        },
        d if d == FinalDecision::Review.as_str() => DecisionBanner {
            label: "FOR REVIEW",
            color: AMBER,
            message: "Further manual underwriting is required due to mixed or elevated risk in one or more models.",
        },
        d if d == FinalDecision::Reject.as_str() => DecisionBanner {
            label: "REJECTED",
            color: RED,
            message: "This application presents an unacceptably high risk profile (Credit, Fraud, and/or AML).",
        },
        _ => DecisionBanner {
            label: "UNKNOWN",
            color: GRAY,
            message: "Decision status is unclear.",
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTone {
    Normal,
    HighRisk,
}

impl RiskTone {
    pub fn color(&self) -> &'static str {
        match self {
            RiskTone::Normal => GREEN,
            RiskTone::HighRisk => RED,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTone::Normal => "low",
            RiskTone::HighRisk => "HIGH",
        }
    }
}

pub fn risk_tone(value: f64, threshold: f64) -> RiskTone {
    if value >= threshold {
        RiskTone::HighRisk
    } else {
        RiskTone::Normal
    }
}

pub fn aml_color(aml_suspicion: &str) -> &'static str {
    if aml_suspicion == AmlSuspicion::High.as_str() {
        RED
    } else if aml_suspicion == AmlSuspicion::Neutral.as_str() {
        AMBER
    } else {
        GREEN
    }
}

/// Display model of one result record, with defaults for missing fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub decision: String,
    pub banner: DecisionBanner,
    pub credit_risk_score: f64,
    pub credit_tone: RiskTone,
    pub fraud_probability: f64,
    pub fraud_tone: RiskTone,
    pub aml_suspicion: String,
    pub aml_color: &'static str,
}

impl ResultView {
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let decision = record
            .get(FINAL_DECISION)
            .and_then(Value::as_str)
            .unwrap_or(FinalDecision::Review.as_str())
            .to_string();
        let credit_risk_score = record
            .get(CREDIT_RISK_SCORE)
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let fraud_probability = record
            .get(FRAUD_PROBABILITY)
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let aml_suspicion = record
            .get(AML_SUSPICION)
            .and_then(Value::as_str)
            .unwrap_or(AmlSuspicion::Neutral.as_str())
            .to_string();

        Self {
            banner: decision_banner(&decision),
            decision,
            credit_risk_score,
            credit_tone: risk_tone(credit_risk_score, HIGH_RISK_THRESHOLD),
            fraud_probability,
            fraud_tone: risk_tone(fraud_probability, HIGH_RISK_THRESHOLD),
            aml_color: aml_color(&aml_suspicion),
            aml_suspicion,
        }
    }

    /// Plain-text rendering for the terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "  {}  [{}]", self.banner.label, self.banner.color);
        let _ = writeln!(out, "  {}", self.banner.message);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            "  Multi-model risk scores (>= {} is high risk)",
            HIGH_RISK_THRESHOLD
        );
        let _ = writeln!(
            out,
            "  Credit default probability : {:.3}  ({}, {})",
            self.credit_risk_score,
            self.credit_tone.label(),
            self.credit_tone.color()
        );
        let _ = writeln!(
            out,
            "  Fraud risk probability     : {:.3}  ({}, {})",
            self.fraud_probability,
            self.fraud_tone.label(),
            self.fraud_tone.color()
        );
        let _ = writeln!(
            out,
            "  AML suspicion              : {}  ({})",
            self.aml_suspicion, self.aml_color
        );
        out
    }
}

/// Pretty-printed JSON of the raw result record.
pub fn export_json(record: &Map<String, Value>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(record)
}

/// Writes [`export_json`] output to `path`.
pub async fn export_to_file(record: &Map<String, Value>, path: &Path) -> anyhow::Result<()> {
    let json = export_json(record)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
    tracing::info!("Exported result to {}", path.display());
    Ok(())
}
