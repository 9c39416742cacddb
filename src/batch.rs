use crate::models::{
    ApplicantRecord, RiskAssessment, AML_SUSPICION, CREDIT_RISK_SCORE, FINAL_DECISION,
    FRAUD_PROBABILITY,
};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Reasons a request payload cannot be turned into a scoring batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchError {
    /// The payload was an empty array.
    Empty,
    /// The payload was neither an object nor an array (e.g. a bare number).
    UnsupportedShape(&'static str),
    /// An array element was not a JSON object.
    NotAnObject { index: usize },
    /// An element did not match the applicant schema.
    InvalidRecord { index: usize, message: String },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Empty => write!(f, "request batch must contain at least one record"),
            BatchError::UnsupportedShape(kind) => {
                write!(f, "expected a JSON object or array of objects, got {}", kind)
            }
            BatchError::NotAnObject { index } => {
                write!(f, "record {} is not a JSON object", index)
            }
            BatchError::InvalidRecord { index, message } => {
                write!(f, "record {}: {}", index, message)
            }
        }
    }
}

impl std::error::Error for BatchError {}

/// One row of the batch: the record exactly as submitted plus its typed view.
#[derive(Debug, Clone)]
pub struct BatchRow {
    fields: Map<String, Value>,
    applicant: ApplicantRecord,
}

impl BatchRow {
    pub fn applicant(&self) -> &ApplicantRecord {
        &self.applicant
    }

    /// Extends the submitted record with the computed risk fields.
    ///
    /// Every submitted key is kept, including ones the schema does not know.
    pub fn into_scored(self, assessment: &RiskAssessment) -> Map<String, Value> {
        let mut record = self.fields;
        record.insert(
            CREDIT_RISK_SCORE.to_string(),
            json!(assessment.credit_risk_score),
        );
        record.insert(
            FRAUD_PROBABILITY.to_string(),
            json!(assessment.fraud_probability),
        );
        if let Some(aml) = assessment.aml_suspicion {
            record.insert(AML_SUSPICION.to_string(), json!(aml.as_str()));
        }
        record.insert(
            FINAL_DECISION.to_string(),
            json!(assessment.final_decision.as_str()),
        );
        record
    }
}

/// Ordered, non-empty batch of applicant records.
#[derive(Debug, Clone)]
pub struct ScoringBatch {
    rows: Vec<BatchRow>,
}

impl ScoringBatch {
    /// Builds a batch from a parsed request body.
    ///
    /// A single object becomes a one-element batch. Each element is
    /// validated against the applicant schema and the documented ranges.
    pub fn from_json(payload: Value) -> Result<Self, BatchError> {
        let elements = match payload {
            Value::Array(items) => items,
            object @ Value::Object(_) => vec![object],
            Value::Null => return Err(BatchError::UnsupportedShape("null")),
            Value::Bool(_) => return Err(BatchError::UnsupportedShape("a boolean")),
            Value::Number(_) => return Err(BatchError::UnsupportedShape("a number")),
            Value::String(_) => return Err(BatchError::UnsupportedShape("a string")),
        };

        if elements.is_empty() {
            return Err(BatchError::Empty);
        }

        let rows = elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| Self::parse_row(index, element))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rows })
    }

    fn parse_row(index: usize, element: Value) -> Result<BatchRow, BatchError> {
        let Value::Object(fields) = element else {
            return Err(BatchError::NotAnObject { index });
        };

        let applicant: ApplicantRecord = serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|e| BatchError::InvalidRecord {
                index,
                message: e.to_string(),
            })?;

        applicant
            .validate()
            .map_err(|violations| BatchError::InvalidRecord {
                index,
                message: violations.join("; "),
            })?;

        Ok(BatchRow { fields, applicant })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[BatchRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<BatchRow> {
        self.rows
    }

    pub fn applicants(&self) -> impl Iterator<Item = &ApplicantRecord> {
        self.rows.iter().map(|row| &row.applicant)
    }

    /// Union of the keys present across all records, in first-seen order.
    pub fn columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for row in &self.rows {
            for key in row.fields.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    /// Identifiers that appear more than once in the batch.
    pub fn duplicate_ids(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for applicant in self.applicants() {
            if !seen.insert(applicant.sk_id_curr) && !duplicates.contains(&applicant.sk_id_curr)
            {
                duplicates.push(applicant.sk_id_curr);
            }
        }
        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AmlSuspicion, FinalDecision};

    #[test]
    fn single_object_becomes_one_element_batch() {
        let batch = ScoringBatch::from_json(json!({"SK_ID_CURR": 7})).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.rows()[0].applicant().sk_id_curr, 7);
    }

    #[test]
    fn empty_array_is_rejected() {
        let err = ScoringBatch::from_json(json!([])).unwrap_err();
        assert_eq!(err, BatchError::Empty);
    }

    #[test]
    fn scalar_payload_is_rejected() {
        let err = ScoringBatch::from_json(json!(42)).unwrap_err();
        assert_eq!(err, BatchError::UnsupportedShape("a number"));
    }

    #[test]
    fn non_object_element_reports_its_index() {
        let err = ScoringBatch::from_json(json!([{"SK_ID_CURR": 1}, "oops"])).unwrap_err();
        assert_eq!(err, BatchError::NotAnObject { index: 1 });
    }

    #[test]
    fn missing_identifier_is_invalid() {
        let err = ScoringBatch::from_json(json!({"AMT_CREDIT": 1000.0})).unwrap_err();
        match err {
            BatchError::InvalidRecord { index, message } => {
                assert_eq!(index, 0);
                assert!(message.contains("SK_ID_CURR"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn out_of_range_bureau_score_is_invalid() {
        let err =
            ScoringBatch::from_json(json!({"SK_ID_CURR": 1, "EXT_SOURCE_3": 2.0})).unwrap_err();
        assert!(matches!(err, BatchError::InvalidRecord { index: 0, .. }));
    }

    #[test]
    fn columns_are_the_union_of_record_keys() {
        let batch = ScoringBatch::from_json(json!([
            {"SK_ID_CURR": 1, "AMT_CREDIT": 10.0},
            {"SK_ID_CURR": 2, "CUSTOM_FLAG": true}
        ]))
        .unwrap();

        let columns = batch.columns();
        assert_eq!(columns.len(), 3);
        assert!(columns.contains(&"CUSTOM_FLAG".to_string()));
    }

    #[test]
    fn duplicate_ids_are_reported_once() {
        let batch = ScoringBatch::from_json(json!([
            {"SK_ID_CURR": 1},
            {"SK_ID_CURR": 1},
            {"SK_ID_CURR": 1},
            {"SK_ID_CURR": 2}
        ]))
        .unwrap();
        assert_eq!(batch.duplicate_ids(), vec![1]);
    }

    #[test]
    fn scored_row_keeps_unknown_keys() {
        let batch =
            ScoringBatch::from_json(json!({"SK_ID_CURR": 9, "CHANNEL": "branch"})).unwrap();
        let row = batch.into_rows().remove(0);
        let scored = row.into_scored(&RiskAssessment {
            credit_risk_score: 0.2,
            fraud_probability: 0.1,
            aml_suspicion: Some(AmlSuspicion::Low),
            final_decision: FinalDecision::Approve,
        });

        assert_eq!(scored["CHANNEL"], "branch");
        assert_eq!(scored["SK_ID_CURR"], 9);
        assert_eq!(scored["AML_SUSPICION"], "Low");
        assert_eq!(scored["FINAL_DECISION"], "Approve");
    }
}
