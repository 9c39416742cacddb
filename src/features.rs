//! Numeric and categorical feature lookup over an [`ApplicantRecord`].
//!
//! Model artifacts refer to inputs by name. Raw fields use their wire names;
//! the three ratio features are derived here. A feature is `None` when the
//! underlying field is missing (or, for ratios, the denominator is zero).

use crate::models::{
    ApplicantRecord, AMT_ANNUITY, AMT_CREDIT, AMT_GOODS_PRICE, AMT_INCOME_TOTAL, CODE_GENDER,
    DAYS_BIRTH, DAYS_EMPLOYED, EXT_SOURCE_1, EXT_SOURCE_2, EXT_SOURCE_3, NAME_INCOME_TYPE,
    ORGANIZATION_TYPE,
};

pub const CREDIT_INCOME_RATIO: &str = "CREDIT_INCOME_RATIO";
pub const ANNUITY_INCOME_RATIO: &str = "ANNUITY_INCOME_RATIO";
pub const CREDIT_GOODS_RATIO: &str = "CREDIT_GOODS_RATIO";

pub const NUMERIC_FEATURES: [&str; 12] = [
    AMT_INCOME_TOTAL,
    AMT_CREDIT,
    AMT_ANNUITY,
    AMT_GOODS_PRICE,
    DAYS_BIRTH,
    DAYS_EMPLOYED,
    EXT_SOURCE_1,
    EXT_SOURCE_2,
    EXT_SOURCE_3,
    CREDIT_INCOME_RATIO,
    ANNUITY_INCOME_RATIO,
    CREDIT_GOODS_RATIO,
];

pub const CATEGORICAL_FEATURES: [&str; 3] = [CODE_GENDER, NAME_INCOME_TYPE, ORGANIZATION_TYPE];

pub fn is_numeric_feature(name: &str) -> bool {
    NUMERIC_FEATURES.contains(&name)
}

pub fn is_categorical_feature(name: &str) -> bool {
    CATEGORICAL_FEATURES.contains(&name)
}

/// Looks up a numeric feature. Unknown names yield `None`.
pub fn numeric_value(applicant: &ApplicantRecord, name: &str) -> Option<f64> {
    match name {
        AMT_INCOME_TOTAL => applicant.amt_income_total,
        AMT_CREDIT => applicant.amt_credit,
        AMT_ANNUITY => applicant.amt_annuity,
        AMT_GOODS_PRICE => applicant.amt_goods_price,
        DAYS_BIRTH => applicant.days_birth.map(|d| d as f64),
        DAYS_EMPLOYED => applicant.days_employed.map(|d| d as f64),
        EXT_SOURCE_1 => applicant.ext_source_1,
        EXT_SOURCE_2 => applicant.ext_source_2,
        EXT_SOURCE_3 => applicant.ext_source_3,
        CREDIT_INCOME_RATIO => ratio(applicant.amt_credit, applicant.amt_income_total),
        ANNUITY_INCOME_RATIO => ratio(applicant.amt_annuity, applicant.amt_income_total),
        CREDIT_GOODS_RATIO => ratio(applicant.amt_credit, applicant.amt_goods_price),
        _ => None,
    }
}

/// Looks up the level of a categorical feature as its wire string.
pub fn categorical_value<'a>(applicant: &'a ApplicantRecord, column: &str) -> Option<&'a str> {
    match column {
        CODE_GENDER => applicant.code_gender.map(|g| g.as_str()),
        NAME_INCOME_TYPE => applicant.name_income_type.map(|t| t.as_str()),
        ORGANIZATION_TYPE => applicant.organization_type.as_deref(),
        _ => None,
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncomeType;

    #[test]
    fn ratios_are_derived_from_amounts() {
        let mut applicant = ApplicantRecord::with_id(1);
        applicant.amt_credit = Some(600000.0);
        applicant.amt_income_total = Some(50000.0);
        applicant.amt_goods_price = Some(500000.0);

        assert_eq!(numeric_value(&applicant, CREDIT_INCOME_RATIO), Some(12.0));
        assert_eq!(numeric_value(&applicant, CREDIT_GOODS_RATIO), Some(1.2));
        assert_eq!(numeric_value(&applicant, ANNUITY_INCOME_RATIO), None);
    }

    #[test]
    fn zero_income_makes_ratio_missing() {
        let mut applicant = ApplicantRecord::with_id(1);
        applicant.amt_credit = Some(1000.0);
        applicant.amt_income_total = Some(0.0);
        assert_eq!(numeric_value(&applicant, CREDIT_INCOME_RATIO), None);
    }

    #[test]
    fn categorical_levels_use_wire_strings() {
        let mut applicant = ApplicantRecord::with_id(1);
        applicant.name_income_type = Some(IncomeType::StateServant);
        assert_eq!(
            categorical_value(&applicant, NAME_INCOME_TYPE),
            Some("State servant")
        );
        assert_eq!(categorical_value(&applicant, CODE_GENDER), None);
    }
}
