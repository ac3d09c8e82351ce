//! Taper relief on tax due on gifts made 3 to 7 years before death.
//!
//! Relief reduces the tax on the gift, never the value of the gift itself.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Gifts this old are outside the cumulation window
pub const SEVEN_YEARS: Decimal = dec!(7);

/// Age of a gift in fractional years (days / 365.25) at the evaluation date.
pub fn years_since(gift_date: NaiveDate, evaluation_date: NaiveDate) -> Decimal {
    let days = (evaluation_date - gift_date).num_days();
    Decimal::from(days) / dec!(365.25)
}

/// Relief rate for a gift of the given age, as a fraction of the tax
pub fn taper_rate(years: Decimal) -> Decimal {
    if years < dec!(3) {
        Decimal::ZERO
    } else if years < dec!(4) {
        dec!(0.20)
    } else if years < dec!(5) {
        dec!(0.40)
    } else if years < dec!(6) {
        dec!(0.60)
    } else if years < SEVEN_YEARS {
        dec!(0.80)
    } else {
        Decimal::ONE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaperRelief {
    pub years: Decimal,
    pub rate: Decimal,
    pub relief: Decimal,
}

/// Taper relief on `tax` for a gift made on `gift_date`.
///
/// Recomputed against `evaluation_date` on every call, so the same gift
/// yields more relief as the evaluation date moves forward.
pub fn calculate_taper_relief(
    gift_date: NaiveDate,
    tax: Decimal,
    evaluation_date: NaiveDate,
) -> TaperRelief {
    let years = years_since(gift_date, evaluation_date);
    let rate = taper_rate(years);
    TaperRelief {
        years,
        rate,
        relief: (tax * rate).round_dp(2),
    }
}
