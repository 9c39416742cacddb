/// Property-based tests using proptest
/// Tests invariants of batching, scoring and the applicant form for arbitrary inputs
use credit_risk_api::batch::ScoringBatch;
use credit_risk_api::form_state::{ApplicantForm, Bounds, ConsoleSession, FormField, SubmissionPhase};
use credit_risk_api::model_artifact::ModelArtifact;
use credit_risk_api::scoring::ScoringEngine;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

const SHIPPED_MODEL: &[u8] = include_bytes!("../models/credit_risk_model.json");

fn shipped_engine() -> ScoringEngine {
    ScoringEngine::from_artifact(ModelArtifact::from_bytes(SHIPPED_MODEL).unwrap())
}

prop_compose! {
    fn applicant()(
        id in 1i64..10_000_000,
        income in proptest::option::of(50_000.0f64..1_000_000.0),
        credit in proptest::option::of(0.0f64..1_000_000.0),
        annuity in proptest::option::of(0.0f64..50_000.0),
        goods in proptest::option::of(0.0f64..1_000_000.0),
        birth in proptest::option::of(-25_000i64..=-5_000),
        employed in proptest::option::of(-10_000i64..=0),
        gender in proptest::option::of(prop_oneof![Just("M"), Just("F")]),
        income_type in proptest::option::of(prop_oneof![
            Just("Working"),
            Just("Businessman"),
            Just("State servant"),
            Just("Commercial associate"),
            Just("Pensioner"),
        ]),
        ext in proptest::collection::vec(proptest::option::of(0.0f64..=1.0), 3),
    ) -> Value {
        let mut record = Map::new();
        record.insert("SK_ID_CURR".to_string(), json!(id));
        let optional = [
            ("AMT_INCOME_TOTAL", income.map(|v| json!(v))),
            ("AMT_CREDIT", credit.map(|v| json!(v))),
            ("AMT_ANNUITY", annuity.map(|v| json!(v))),
            ("AMT_GOODS_PRICE", goods.map(|v| json!(v))),
            ("DAYS_BIRTH", birth.map(|v| json!(v))),
            ("DAYS_EMPLOYED", employed.map(|v| json!(v))),
            ("CODE_GENDER", gender.map(|v| json!(v))),
            ("NAME_INCOME_TYPE", income_type.map(|v| json!(v))),
            ("EXT_SOURCE_1", ext[0].map(|v| json!(v))),
            ("EXT_SOURCE_2", ext[1].map(|v| json!(v))),
            ("EXT_SOURCE_3", ext[2].map(|v| json!(v))),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                record.insert(key.to_string(), value);
            }
        }
        Value::Object(record)
    }
}

// Property: Scoring preserves batch length and order
proptest! {
    #[test]
    fn scored_batch_matches_request(records in proptest::collection::vec(applicant(), 1..20)) {
        let ids: Vec<i64> = records.iter().map(|r| r["SK_ID_CURR"].as_i64().unwrap()).collect();
        let batch = ScoringBatch::from_json(Value::Array(records)).unwrap();
        let scored = shipped_engine().score(batch).unwrap();

        prop_assert_eq!(scored.len(), ids.len());
        for (record, id) in scored.iter().zip(ids) {
            prop_assert_eq!(record["SK_ID_CURR"].as_i64(), Some(id));
        }
    }

    #[test]
    fn probabilities_stay_in_unit_interval(record in applicant()) {
        let batch = ScoringBatch::from_json(record).unwrap();
        let scored = shipped_engine().score(batch).unwrap();
        for key in ["CREDIT_RISK_SCORE", "FRAUD_PROBABILITY"] {
            let p = scored[0][key].as_f64().unwrap();
            prop_assert!((0.0..=1.0).contains(&p), "{} = {}", key, p);
        }
    }

    #[test]
    fn degraded_engine_returns_one_record_per_input(records in proptest::collection::vec(applicant(), 1..20)) {
        let n = records.len();
        let batch = ScoringBatch::from_json(Value::Array(records)).unwrap();
        let scored = ScoringEngine::degraded().score(batch).unwrap();
        prop_assert_eq!(scored.len(), n);
        prop_assert!(scored.iter().all(|r| r["FINAL_DECISION"] == "Review"));
    }

    #[test]
    fn batch_parsing_never_panics(raw in "\\PC*") {
        if let Ok(value) = serde_json::from_str::<Value>(&raw) {
            let _ = ScoringBatch::from_json(value);
        }
    }
}

// Property: The form only ever holds in-range values
proptest! {
    #[test]
    fn form_rejects_out_of_range_and_keeps_value(field_index in 0usize..13, value in -2_000_000.0f64..2_000_000.0) {
        let field = FormField::ALL[field_index];
        let mut form = ApplicantForm::default();
        let before = form.display_value(field);
        let raw = match field.bounds() {
            Some(Bounds::Int { .. }) => format!("{}", value.round() as i64),
            _ => format!("{}", value),
        };

        let accepted = form.set(field, &raw).is_ok();
        match field.bounds() {
            Some(Bounds::Int { min, max }) => {
                let v = value.round() as i64;
                let in_range = v >= min && max.map_or(true, |max| v <= max);
                prop_assert_eq!(accepted, in_range);
            }
            Some(Bounds::Float { min, max }) => {
                prop_assert_eq!(accepted, value >= min && value <= max);
            }
            None => {}
        }
        if !accepted {
            prop_assert_eq!(form.display_value(field), before);
        }
    }

    #[test]
    fn reset_always_clears_result(edits in proptest::collection::vec((0usize..13, "[0-9]{1,6}"), 0..10), submitted in proptest::bool::ANY) {
        let mut session = ConsoleSession::new();
        for (index, raw) in &edits {
            let _ = session.set_field(FormField::ALL[*index].name(), raw);
        }
        if submitted {
            let submission = session.begin_submit().unwrap();
            session.complete_submit(submission.id, Ok(Map::new()));
        }

        session.reset();
        prop_assert!(session.result().is_none());
        prop_assert_eq!(session.phase(), SubmissionPhase::Idle);
        prop_assert_eq!(session.form(), &ApplicantForm::default());
    }
}
