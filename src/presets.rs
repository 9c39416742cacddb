//! Built-in applicant profiles for quick manual testing.

use serde_json::{json, Map, Value};

/// A named set of form values.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    name: String,
    values: Map<String, Value>,
}

impl Preset {
    /// Builds a preset from a JSON object. Non-object values yield an empty preset.
    pub fn new(name: impl Into<String>, values: Value) -> Self {
        let values = match values {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// The five profiles offered by the console, in display order.
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::new(
            "Case 1: High Credit Risk (Review Expected)",
            json!({
                "SK_ID_CURR": 100001, "AMT_INCOME_TOTAL": 100000.0, "AMT_CREDIT": 900000.0,
                "AMT_ANNUITY": 40000.0, "AMT_GOODS_PRICE": 800000.0, "DAYS_BIRTH": -10000,
                "DAYS_EMPLOYED": -300, "CODE_GENDER": "M", "NAME_INCOME_TYPE": "Working",
                "ORGANIZATION_TYPE": "Transport: type 3", "EXT_SOURCE_1": 0.01,
                "EXT_SOURCE_2": 0.01, "EXT_SOURCE_3": 0.01
            }),
        ),
        Preset::new(
            "Case 2: Low Risk (Approve Expected)",
            json!({
                "SK_ID_CURR": 100002, "AMT_INCOME_TOTAL": 650000.0, "AMT_CREDIT": 90000.0,
                "AMT_ANNUITY": 10000.0, "AMT_GOODS_PRICE": 80000.0, "DAYS_BIRTH": -13000,
                "DAYS_EMPLOYED": -5000, "CODE_GENDER": "F", "NAME_INCOME_TYPE": "Businessman",
                "ORGANIZATION_TYPE": "Business Entity Type 3", "EXT_SOURCE_1": 0.9,
                "EXT_SOURCE_2": 0.9, "EXT_SOURCE_3": 0.9
            }),
        ),
        Preset::new(
            "Case 3: Mixed Risk (Review Expected)",
            json!({
                "SK_ID_CURR": 100003, "AMT_INCOME_TOTAL": 250000.0, "AMT_CREDIT": 250000.0,
                "AMT_ANNUITY": 18000.0, "AMT_GOODS_PRICE": 240000.0, "DAYS_BIRTH": -18000,
                "DAYS_EMPLOYED": -1000, "CODE_GENDER": "M", "NAME_INCOME_TYPE": "Working",
                "ORGANIZATION_TYPE": "Transport: type 2", "EXT_SOURCE_1": 0.0,
                "EXT_SOURCE_2": 0.7, "EXT_SOURCE_3": 0.65
            }),
        ),
        Preset::new(
            "Case 4: High All-Risk (Reject Expected)",
            json!({
                "SK_ID_CURR": 100004, "AMT_INCOME_TOTAL": 50000.0, "AMT_CREDIT": 600000.0,
                "AMT_ANNUITY": 28000.0, "AMT_GOODS_PRICE": 500000.0, "DAYS_BIRTH": -11000,
                "DAYS_EMPLOYED": -1200, "CODE_GENDER": "F", "NAME_INCOME_TYPE": "Working",
                "ORGANIZATION_TYPE": "Trade: type 7", "EXT_SOURCE_1": 0.05,
                "EXT_SOURCE_2": 0.05, "EXT_SOURCE_3": 0.05
            }),
        ),
        Preset::new(
            "Case 5: High AML Only (Review Expected)",
            json!({
                "SK_ID_CURR": 100005, "AMT_INCOME_TOTAL": 50000.0, "AMT_CREDIT": 100000.0,
                "AMT_ANNUITY": 15000.0, "AMT_GOODS_PRICE": 90000.0, "DAYS_BIRTH": -15000,
                "DAYS_EMPLOYED": -2500, "CODE_GENDER": "M", "NAME_INCOME_TYPE": "State servant",
                "ORGANIZATION_TYPE": "Government", "EXT_SOURCE_1": 0.9,
                "EXT_SOURCE_2": 0.9, "EXT_SOURCE_3": 0.9
            }),
        ),
    ]
}

/// Looks up a preset by its 1-based position in [`builtin_presets`].
pub fn preset_by_number(number: usize) -> Option<Preset> {
    number
        .checked_sub(1)
        .and_then(|index| builtin_presets().into_iter().nth(index))
}
