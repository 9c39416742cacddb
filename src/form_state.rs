//! Applicant form and console session state.
//!
//! Everything here is a pure state transition: no I/O, no rendering. The
//! console binary drives these transitions and performs the network call
//! between [`ConsoleSession::begin_submit`] and
//! [`ConsoleSession::complete_submit`].

use crate::models::{
    ApplicantRecord, CodeGender, IncomeType, AMT_ANNUITY, AMT_CREDIT, AMT_GOODS_PRICE,
    AMT_INCOME_TOTAL, CODE_GENDER, DAYS_BIRTH, DAYS_EMPLOYED, EXT_SOURCE_1, EXT_SOURCE_2,
    EXT_SOURCE_3, NAME_INCOME_TYPE, ORGANIZATION_TYPE, ORGANIZATION_TYPES, SK_ID_CURR,
};
use crate::presets::Preset;
use crate::scoring_client::SubmitError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Editable fields of the applicant form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    SkIdCurr,
    AmtIncomeTotal,
    AmtCredit,
    AmtAnnuity,
    AmtGoodsPrice,
    DaysBirth,
    DaysEmployed,
    CodeGender,
    NameIncomeType,
    OrganizationType,
    ExtSource1,
    ExtSource2,
    ExtSource3,
}

/// Accepted range of a numeric field, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    Int { min: i64, max: Option<i64> },
    Float { min: f64, max: f64 },
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bounds::Int { min, max: Some(max) } => write!(f, "[{}, {}]", min, max),
            Bounds::Int { min, max: None } => write!(f, ">= {}", min),
            Bounds::Float { min, max } => write!(f, "[{}, {}]", min, max),
        }
    }
}

const MONEY_BOUNDS: Bounds = Bounds::Float {
    min: 50_000.0,
    max: 1_000_000.0,
};
const BUREAU_BOUNDS: Bounds = Bounds::Float { min: 0.0, max: 1.0 };

impl FormField {
    pub const ALL: [FormField; 13] = [
        FormField::SkIdCurr,
        FormField::AmtIncomeTotal,
        FormField::AmtCredit,
        FormField::AmtAnnuity,
        FormField::AmtGoodsPrice,
        FormField::DaysBirth,
        FormField::DaysEmployed,
        FormField::CodeGender,
        FormField::NameIncomeType,
        FormField::OrganizationType,
        FormField::ExtSource1,
        FormField::ExtSource2,
        FormField::ExtSource3,
    ];

    /// Wire name of the field.
    pub fn name(&self) -> &'static str {
        match self {
            FormField::SkIdCurr => SK_ID_CURR,
            FormField::AmtIncomeTotal => AMT_INCOME_TOTAL,
            FormField::AmtCredit => AMT_CREDIT,
            FormField::AmtAnnuity => AMT_ANNUITY,
            FormField::AmtGoodsPrice => AMT_GOODS_PRICE,
            FormField::DaysBirth => DAYS_BIRTH,
            FormField::DaysEmployed => DAYS_EMPLOYED,
            FormField::CodeGender => CODE_GENDER,
            FormField::NameIncomeType => NAME_INCOME_TYPE,
            FormField::OrganizationType => ORGANIZATION_TYPE,
            FormField::ExtSource1 => EXT_SOURCE_1,
            FormField::ExtSource2 => EXT_SOURCE_2,
            FormField::ExtSource3 => EXT_SOURCE_3,
        }
    }

    /// Case-insensitive lookup by wire name.
    pub fn from_name(name: &str) -> Option<FormField> {
        FormField::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            FormField::SkIdCurr => Some(Bounds::Int { min: 1, max: None }),
            FormField::DaysBirth => Some(Bounds::Int {
                min: -25_000,
                max: Some(-5_000),
            }),
            FormField::DaysEmployed => Some(Bounds::Int {
                min: -10_000,
                max: Some(-100),
            }),
            FormField::AmtIncomeTotal | FormField::AmtCredit | FormField::AmtGoodsPrice => {
                Some(MONEY_BOUNDS)
            }
            FormField::AmtAnnuity => Some(Bounds::Float {
                min: 5_000.0,
                max: 50_000.0,
            }),
            FormField::ExtSource1 | FormField::ExtSource2 | FormField::ExtSource3 => {
                Some(BUREAU_BOUNDS)
            }
            FormField::CodeGender | FormField::NameIncomeType | FormField::OrganizationType => {
                None
            }
        }
    }

    /// Values offered for the categorical fields.
    ///
    /// `ORGANIZATION_TYPE` lists suggestions only; any non-empty text is accepted.
    pub fn choices(&self) -> Option<Vec<&'static str>> {
        match self {
            FormField::CodeGender => Some(CodeGender::ALL.iter().map(|g| g.as_str()).collect()),
            FormField::NameIncomeType => {
                Some(IncomeType::ALL.iter().map(|t| t.as_str()).collect())
            }
            FormField::OrganizationType => Some(ORGANIZATION_TYPES.to_vec()),
            _ => None,
        }
    }
}

/// Errors raised when editing a form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    UnknownField(String),
    Parse { field: &'static str, message: String },
    OutOfRange {
        field: &'static str,
        value: String,
        bounds: Bounds,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::UnknownField(name) => write!(f, "unknown field '{}'", name),
            FieldError::Parse { field, message } => write!(f, "{}: {}", field, message),
            FieldError::OutOfRange {
                field,
                value,
                bounds,
            } => write!(f, "{} = {} is outside {}", field, value, bounds),
        }
    }
}

impl std::error::Error for FieldError {}

/// Current values of every form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ApplicantForm {
    pub sk_id_curr: i64,
    pub amt_income_total: f64,
    pub amt_credit: f64,
    pub amt_annuity: f64,
    pub amt_goods_price: f64,
    pub days_birth: i64,
    pub days_employed: i64,
    pub code_gender: CodeGender,
    pub name_income_type: IncomeType,
    pub organization_type: String,
    pub ext_source_1: f64,
    pub ext_source_2: f64,
    pub ext_source_3: f64,
}

impl Default for ApplicantForm {
    fn default() -> Self {
        Self {
            sk_id_curr: 100001,
            amt_income_total: 250_000.0,
            amt_credit: 300_000.0,
            amt_annuity: 15_000.0,
            amt_goods_price: 250_000.0,
            days_birth: -10_000,
            days_employed: -2_000,
            code_gender: CodeGender::F,
            name_income_type: IncomeType::Working,
            organization_type: "Business Entity Type 3".to_string(),
            ext_source_1: 0.5,
            ext_source_2: 0.5,
            ext_source_3: 0.5,
        }
    }
}

impl ApplicantForm {
    /// Parses `raw` for `field`, enforcing its type and range.
    ///
    /// The form is left untouched when the value is rejected.
    pub fn set(&mut self, field: FormField, raw: &str) -> Result<(), FieldError> {
        let raw = raw.trim();
        match field {
            FormField::CodeGender => {
                self.code_gender = raw.parse().map_err(|message| FieldError::Parse {
                    field: field.name(),
                    message,
                })?;
            }
            FormField::NameIncomeType => {
                self.name_income_type = raw.parse().map_err(|message| FieldError::Parse {
                    field: field.name(),
                    message,
                })?;
            }
            FormField::OrganizationType => {
                if raw.is_empty() {
                    return Err(FieldError::Parse {
                        field: field.name(),
                        message: "value cannot be empty".to_string(),
                    });
                }
                self.organization_type = raw.to_string();
            }
            FormField::SkIdCurr | FormField::DaysBirth | FormField::DaysEmployed => {
                let value = raw.parse::<i64>().map_err(|e| FieldError::Parse {
                    field: field.name(),
                    message: format!("expected an integer: {}", e),
                })?;
                self.set_int(field, value)?;
            }
            _ => {
                let value = raw.parse::<f64>().map_err(|e| FieldError::Parse {
                    field: field.name(),
                    message: format!("expected a number: {}", e),
                })?;
                self.set_float(field, value)?;
            }
        }
        Ok(())
    }

    /// Sets `field` from a JSON value (used when loading presets).
    pub fn set_json(&mut self, field: FormField, value: &Value) -> Result<(), FieldError> {
        let type_error = |expected: &str| FieldError::Parse {
            field: field.name(),
            message: format!("expected {}, got {}", expected, value),
        };

        match field {
            FormField::CodeGender | FormField::NameIncomeType | FormField::OrganizationType => {
                let text = value.as_str().ok_or_else(|| type_error("a string"))?;
                self.set(field, text)
            }
            FormField::SkIdCurr | FormField::DaysBirth | FormField::DaysEmployed => {
                let int = value
                    .as_i64()
                    .or_else(|| {
                        value
                            .as_f64()
                            .filter(|f| f.fract() == 0.0)
                            .map(|f| f as i64)
                    })
                    .ok_or_else(|| type_error("an integer"))?;
                self.set_int(field, int)
            }
            _ => {
                let float = value.as_f64().ok_or_else(|| type_error("a number"))?;
                self.set_float(field, float)
            }
        }
    }

    fn set_int(&mut self, field: FormField, value: i64) -> Result<(), FieldError> {
        if let Some(bounds @ Bounds::Int { min, max }) = field.bounds() {
            if value < min || max.is_some_and(|max| value > max) {
                return Err(FieldError::OutOfRange {
                    field: field.name(),
                    value: value.to_string(),
                    bounds,
                });
            }
        }
        match field {
            FormField::SkIdCurr => self.sk_id_curr = value,
            FormField::DaysBirth => self.days_birth = value,
            FormField::DaysEmployed => self.days_employed = value,
            _ => {
                return Err(FieldError::Parse {
                    field: field.name(),
                    message: "not an integer field".to_string(),
                })
            }
        }
        Ok(())
    }

    fn set_float(&mut self, field: FormField, value: f64) -> Result<(), FieldError> {
        if let Some(bounds @ Bounds::Float { min, max }) = field.bounds() {
            if !value.is_finite() || value < min || value > max {
                return Err(FieldError::OutOfRange {
                    field: field.name(),
                    value: value.to_string(),
                    bounds,
                });
            }
        }
        match field {
            FormField::AmtIncomeTotal => self.amt_income_total = value,
            FormField::AmtCredit => self.amt_credit = value,
            FormField::AmtAnnuity => self.amt_annuity = value,
            FormField::AmtGoodsPrice => self.amt_goods_price = value,
            FormField::ExtSource1 => self.ext_source_1 = value,
            FormField::ExtSource2 => self.ext_source_2 = value,
            FormField::ExtSource3 => self.ext_source_3 = value,
            _ => {
                return Err(FieldError::Parse {
                    field: field.name(),
                    message: "not a numeric field".to_string(),
                })
            }
        }
        Ok(())
    }

    /// Current value of `field` formatted for display.
    pub fn display_value(&self, field: FormField) -> String {
        match field {
            FormField::SkIdCurr => self.sk_id_curr.to_string(),
            FormField::AmtIncomeTotal => format!("{:.0}", self.amt_income_total),
            FormField::AmtCredit => format!("{:.0}", self.amt_credit),
            FormField::AmtAnnuity => format!("{:.0}", self.amt_annuity),
            FormField::AmtGoodsPrice => format!("{:.0}", self.amt_goods_price),
            FormField::DaysBirth => self.days_birth.to_string(),
            FormField::DaysEmployed => self.days_employed.to_string(),
            FormField::CodeGender => self.code_gender.as_str().to_string(),
            FormField::NameIncomeType => self.name_income_type.as_str().to_string(),
            FormField::OrganizationType => self.organization_type.clone(),
            FormField::ExtSource1 => format!("{:.2}", self.ext_source_1),
            FormField::ExtSource2 => format!("{:.2}", self.ext_source_2),
            FormField::ExtSource3 => format!("{:.2}", self.ext_source_3),
        }
    }

    /// Builds the typed applicant record sent to the service.
    pub fn to_record(&self) -> ApplicantRecord {
        ApplicantRecord {
            sk_id_curr: self.sk_id_curr,
            amt_income_total: Some(self.amt_income_total),
            amt_credit: Some(self.amt_credit),
            amt_annuity: Some(self.amt_annuity),
            amt_goods_price: Some(self.amt_goods_price),
            days_birth: Some(self.days_birth),
            days_employed: Some(self.days_employed),
            code_gender: Some(self.code_gender),
            name_income_type: Some(self.name_income_type),
            organization_type: Some(self.organization_type.clone()),
            ext_source_1: Some(self.ext_source_1),
            ext_source_2: Some(self.ext_source_2),
            ext_source_3: Some(self.ext_source_3),
        }
    }
}

// ============ Session ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Pending,
    ResultShown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// A submission is already in flight.
    SubmissionPending,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::SubmissionPending => {
                write!(f, "a submission is already in progress, wait for it to finish")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Form state plus the outcome of the last submission.
/// Ticket for one in-flight submission.
///
/// Carries the record to send and the generation that
/// [`ConsoleSession::complete_submit`] checks before accepting an outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: u64,
    pub record: ApplicantRecord,
}

/// Form state plus the outcome of the last submission.
#[derive(Debug, Clone)]
pub struct ConsoleSession {
    form: ApplicantForm,
    phase: SubmissionPhase,
    result: Option<Map<String, Value>>,
    last_error: Option<SubmitError>,
    // id of the latest submission
    generation: u64,
}

impl Default for ConsoleSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSession {
    pub fn new() -> Self {
        Self {
            form: ApplicantForm::default(),
            phase: SubmissionPhase::Idle,
            result: None,
            last_error: None,
            generation: 0,
        }
    }

    pub fn form(&self) -> &ApplicantForm {
        &self.form
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    pub fn result(&self) -> Option<&Map<String, Value>> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&SubmitError> {
        self.last_error.as_ref()
    }

    /// Edits one field by wire name.
    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<(), FieldError> {
        let field =
            FormField::from_name(name).ok_or_else(|| FieldError::UnknownField(name.to_string()))?;
        self.form.set(field, raw)
    }

    /// Overwrites the fields present in `preset` and clears the result.
    ///
    /// Keys that are not form fields are ignored. Returns the number of
    /// fields applied. On error the form keeps its previous values.
    pub fn apply_preset(&mut self, preset: &Preset) -> Result<usize, FieldError> {
        let mut form = self.form.clone();
        let mut applied = 0;
        for (key, value) in preset.values() {
            if let Some(field) = FormField::from_name(key) {
                form.set_json(field, value)?;
                applied += 1;
            }
        }
        self.form = form;
        self.clear_result();
        Ok(applied)
    }

    /// Resets every field to its default and clears the result.
    pub fn reset(&mut self) {
        self.form = ApplicantForm::default();
        self.clear_result();
    }

    fn clear_result(&mut self) {
        self.result = None;
        self.last_error = None;
        self.phase = SubmissionPhase::Idle;
    }

    /// Moves to `Pending` and returns the ticket for the new submission.
    ///
    /// Refused while another submission is pending.
    pub fn begin_submit(&mut self) -> Result<Submission, SessionError> {
        if self.phase == SubmissionPhase::Pending {
            return Err(SessionError::SubmissionPending);
        }
        self.generation += 1;
        self.phase = SubmissionPhase::Pending;
        self.result = None;
        self.last_error = None;
        Ok(Submission {
            id: self.generation,
            record: self.form.to_record(),
        })
    }

    /// Records the outcome of submission `id`.
    ///
    /// Returns `false` (and changes nothing) unless `id` is the submission
    /// currently pending. Outcomes of requests orphaned by a reset or preset
    /// load are dropped this way, even after a newer submit has started.
    pub fn complete_submit(
        &mut self,
        id: u64,
        outcome: Result<Map<String, Value>, SubmitError>,
    ) -> bool {
        if self.phase != SubmissionPhase::Pending || id != self.generation {
            return false;
        }
        match outcome {
            Ok(record) => {
                self.result = Some(record);
                self.last_error = None;
                self.phase = SubmissionPhase::ResultShown;
            }
            Err(err) => {
                self.result = None;
                self.last_error = Some(err);
                self.phase = SubmissionPhase::Idle;
            }
        }
        true
    }
}
