//! Which HMRC return an estate needs

use super::error::IhtError;
use super::uk::{RateTable, TaxYear};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReturnForm {
    /// Excepted estate, short return
    Iht205,
    /// Full account
    Iht400,
}

impl ReturnForm {
    pub fn display(&self) -> &'static str {
        match self {
            ReturnForm::Iht205 => "IHT205",
            ReturnForm::Iht400 => "IHT400",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormRecommendation {
    pub form: ReturnForm,
    pub reasons: Vec<String>,
}

/// Recommend the excepted estate return or a full account.
///
/// A full account is needed whenever tax is due, foreign assets exceed the
/// limit, the deceased had an interest in a trust, or the estate is too
/// large to be an exempt excepted estate.
pub fn check_excepted_estate(
    rates: &RateTable,
    tax_year: TaxYear,
    estate_value: Decimal,
    iht_due: Decimal,
    foreign_assets: Decimal,
    has_trust_interests: bool,
) -> Result<FormRecommendation, IhtError> {
    let limits = &rates.excepted_estate;
    let nil_rate_band = rates.rates(tax_year)?.nil_rate_band;
    let mut reasons = Vec::new();

    if iht_due > Decimal::ZERO {
        reasons.push(format!("inheritance tax of £{:.2} is due", iht_due));
    }
    if foreign_assets > limits.foreign_assets_limit {
        reasons.push(format!(
            "foreign assets of £{:.2} exceed £{:.2}",
            foreign_assets, limits.foreign_assets_limit
        ));
    }
    if has_trust_interests {
        reasons.push("estate includes an interest in a trust".to_string());
    }
    if estate_value > limits.exempt_estate_gross_limit {
        reasons.push(format!(
            "gross estate of £{:.2} exceeds £{:.2}",
            estate_value, limits.exempt_estate_gross_limit
        ));
    }

    if !reasons.is_empty() {
        return Ok(FormRecommendation {
            form: ReturnForm::Iht400,
            reasons,
        });
    }

    let reason = if estate_value <= nil_rate_band {
        "low value estate within the nil-rate band"
    } else {
        "exempt estate with no tax due"
    };
    Ok(FormRecommendation {
        form: ReturnForm::Iht205,
        reasons: vec![reason.to_string()],
    })
}
