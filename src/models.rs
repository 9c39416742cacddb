use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

// ============ Field Names ============

pub const SK_ID_CURR: &str = "SK_ID_CURR";
pub const AMT_INCOME_TOTAL: &str = "AMT_INCOME_TOTAL";
pub const AMT_CREDIT: &str = "AMT_CREDIT";
pub const AMT_ANNUITY: &str = "AMT_ANNUITY";
pub const AMT_GOODS_PRICE: &str = "AMT_GOODS_PRICE";
pub const DAYS_BIRTH: &str = "DAYS_BIRTH";
pub const DAYS_EMPLOYED: &str = "DAYS_EMPLOYED";
pub const CODE_GENDER: &str = "CODE_GENDER";
pub const NAME_INCOME_TYPE: &str = "NAME_INCOME_TYPE";
pub const ORGANIZATION_TYPE: &str = "ORGANIZATION_TYPE";
pub const EXT_SOURCE_1: &str = "EXT_SOURCE_1";
pub const EXT_SOURCE_2: &str = "EXT_SOURCE_2";
pub const EXT_SOURCE_3: &str = "EXT_SOURCE_3";

pub const CREDIT_RISK_SCORE: &str = "CREDIT_RISK_SCORE";
pub const FRAUD_PROBABILITY: &str = "FRAUD_PROBABILITY";
pub const AML_SUSPICION: &str = "AML_SUSPICION";
pub const FINAL_DECISION: &str = "FINAL_DECISION";

// ============ Categorical Values ============

/// Applicant gender as recorded on the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum CodeGender {
    M,
    F,
}

impl CodeGender {
    pub const ALL: [CodeGender; 2] = [CodeGender::M, CodeGender::F];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeGender::M => "M",
            CodeGender::F => "F",
        }
    }
}

impl FromStr for CodeGender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" => Ok(CodeGender::M),
            "F" => Ok(CodeGender::F),
            other => Err(format!("unknown CODE_GENDER '{}' (expected M or F)", other)),
        }
    }
}

/// Income category of the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum IncomeType {
    Working,
    Businessman,
    #[serde(rename = "State servant")]
    StateServant,
    #[serde(rename = "Commercial associate")]
    CommercialAssociate,
    Pensioner,
}

impl IncomeType {
    pub const ALL: [IncomeType; 5] = [
        IncomeType::Working,
        IncomeType::Businessman,
        IncomeType::StateServant,
        IncomeType::CommercialAssociate,
        IncomeType::Pensioner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeType::Working => "Working",
            IncomeType::Businessman => "Businessman",
            IncomeType::StateServant => "State servant",
            IncomeType::CommercialAssociate => "Commercial associate",
            IncomeType::Pensioner => "Pensioner",
        }
    }
}

impl FromStr for IncomeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        IncomeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                format!(
                    "unknown NAME_INCOME_TYPE '{}' (expected one of: {})",
                    trimmed,
                    IncomeType::ALL
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// Organization catalog offered by the console. The service accepts any string.
pub const ORGANIZATION_TYPES: [&str; 5] = [
    "Transport: type 3",
    "Business Entity Type 3",
    "Government",
    "Trade: type 7",
    "Transport: type 2",
];

/// Anti-money-laundering suspicion band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AmlSuspicion {
    Low,
    Neutral,
    High,
}

impl AmlSuspicion {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmlSuspicion::Low => "Low",
            AmlSuspicion::Neutral => "Neutral",
            AmlSuspicion::High => "High",
        }
    }
}

/// Final underwriting decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FinalDecision {
    Approve,
    Review,
    Reject,
}

impl FinalDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalDecision::Approve => "Approve",
            FinalDecision::Review => "Review",
            FinalDecision::Reject => "Reject",
        }
    }
}

impl fmt::Display for FinalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Applicant Records ============

/// A single loan applicant as submitted for scoring.
///
/// Only `SK_ID_CURR` is mandatory. Every other documented field may be
/// omitted (or `null`); the scorer imputes missing numeric inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ApplicantRecord {
    /// Applicant identifier, echoed back in the response.
    pub sk_id_curr: i64,
    /// Total income of the applicant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amt_income_total: Option<f64>,
    /// Loan amount applied for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amt_credit: Option<f64>,
    /// Loan annuity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amt_annuity: Option<f64>,
    /// Price of the goods financed by the loan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amt_goods_price: Option<f64>,
    /// Age in days relative to the application date (negative).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_birth: Option<i64>,
    /// Days since the current employment started (negative).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_employed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_gender: Option<CodeGender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_income_type: Option<IncomeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_type: Option<String>,
    /// Normalized external bureau score in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_source_1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_source_2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_source_3: Option<f64>,
}

impl ApplicantRecord {
    /// Creates a record carrying only the identifier.
    pub fn with_id(sk_id_curr: i64) -> Self {
        Self {
            sk_id_curr,
            amt_income_total: None,
            amt_credit: None,
            amt_annuity: None,
            amt_goods_price: None,
            days_birth: None,
            days_employed: None,
            code_gender: None,
            name_income_type: None,
            organization_type: None,
            ext_source_1: None,
            ext_source_2: None,
            ext_source_3: None,
        }
    }

    /// Checks the documented value ranges.
    ///
    /// Returns every violation found, not only the first one.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        let amounts = [
            (AMT_INCOME_TOTAL, self.amt_income_total),
            (AMT_CREDIT, self.amt_credit),
            (AMT_ANNUITY, self.amt_annuity),
            (AMT_GOODS_PRICE, self.amt_goods_price),
        ];
        for (name, value) in amounts {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    violations.push(format!("{} must be a non-negative amount, got {}", name, v));
                }
            }
        }

        let offsets = [
            (DAYS_BIRTH, self.days_birth),
            (DAYS_EMPLOYED, self.days_employed),
        ];
        for (name, value) in offsets {
            if let Some(v) = value {
                if v > 0 {
                    violations.push(format!("{} must be a non-positive day offset, got {}", name, v));
                }
            }
        }

        let bureau_scores = [
            (EXT_SOURCE_1, self.ext_source_1),
            (EXT_SOURCE_2, self.ext_source_2),
            (EXT_SOURCE_3, self.ext_source_3),
        ];
        for (name, value) in bureau_scores {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    violations.push(format!("{} must be within [0, 1], got {}", name, v));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Risk fields computed by the scorer and appended to each record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RiskAssessment {
    /// Probability of credit default in `[0, 1]`.
    pub credit_risk_score: f64,
    /// Probability of application fraud in `[0, 1]`.
    pub fraud_probability: f64,
    /// Omitted when the scorer does not produce an AML signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aml_suspicion: Option<AmlSuspicion>,
    pub final_decision: FinalDecision,
}

/// Shape of one element of the `/score/credit` response: the submitted
/// record extended with the computed risk fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScoredApplicant {
    #[serde(flatten)]
    pub applicant: ApplicantRecord,
    #[serde(flatten)]
    pub assessment: RiskAssessment,
}

/// JSON error body returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}
