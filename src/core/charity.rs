//! Reduced rate for estates leaving 10% or more to charity

use super::uk::YearRates;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

const CHARITY_SHARE: Decimal = dec!(0.10);

/// Rate decision together with the baseline it was derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharityRate {
    pub rate: Decimal,
    pub baseline: Decimal,
    pub qualifies: bool,
}

/// Decide between the standard and reduced rate.
///
/// The baseline is the estate left after the nil-rate bands. With no
/// baseline there is nothing to reduce, so the reduced rate never applies.
/// Years before the reduced rate existed carry it equal to the standard rate.
pub fn qualify_charity_rate(
    rates: &YearRates,
    net_estate: Decimal,
    nil_rate_band: Decimal,
    residence_nil_rate_band: Decimal,
    charitable_legacy: Decimal,
) -> CharityRate {
    let baseline = (net_estate - nil_rate_band - residence_nil_rate_band).max(Decimal::ZERO);
    let qualifies = rates.charity_rate < rates.standard_rate
        && baseline > Decimal::ZERO
        && charitable_legacy >= baseline * CHARITY_SHARE;
    CharityRate {
        rate: if qualifies {
            rates.charity_rate
        } else {
            rates.standard_rate
        },
        baseline,
        qualifies,
    }
}
