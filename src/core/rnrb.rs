//! Residence nil-rate band

use super::uk::YearRates;
use rust_decimal::Decimal;
use serde::Serialize;

/// Breakdown of the residence nil-rate band
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResidenceBand {
    /// Own band, limited to the value of the residence
    pub base: Decimal,
    /// Band inherited from a predeceased spouse
    pub transferred: Decimal,
    /// Reduction for estates above the taper threshold
    pub taper: Decimal,
    /// Band available after taper
    pub total: Decimal,
}

/// Residence nil-rate band for an estate.
///
/// `transferred_percent` must already be capped at 100. The band is withdrawn
/// by £1 for every £2 the net estate exceeds the taper threshold.
pub fn calculate_rnrb(
    rates: &YearRates,
    net_estate: Decimal,
    residence_value: Decimal,
    leaves_to_descendants: bool,
    transferred_percent: Decimal,
) -> ResidenceBand {
    if !leaves_to_descendants || residence_value <= Decimal::ZERO {
        return ResidenceBand::default();
    }

    let standard = rates.residence_nil_rate_band;
    let base = standard.min(residence_value);
    let transferred = (standard * transferred_percent / Decimal::ONE_HUNDRED).round_dp(2);
    let untapered = base + transferred;

    let excess = net_estate - rates.rnrb_taper_threshold;
    let taper = if excess > Decimal::ZERO {
        excess / Decimal::TWO
    } else {
        Decimal::ZERO
    };

    let total = (untapered - taper).max(Decimal::ZERO);
    log::debug!(
        "RNRB: base={}, transferred={}, taper={}, total={}",
        base,
        transferred,
        taper,
        total
    );

    ResidenceBand {
        base,
        transferred,
        taper,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::uk::{RateTable, TaxYear};
    use rust_decimal_macros::dec;

    fn rates() -> YearRates {
        RateTable::uk().rates(TaxYear(2025)).unwrap().clone()
    }

    #[test]
    fn no_band_without_descendants() {
        let band = calculate_rnrb(&rates(), dec!(800000), dec!(500000), false, dec!(100));
        assert_eq!(band, ResidenceBand::default());
    }

    #[test]
    fn no_band_without_residence() {
        let band = calculate_rnrb(&rates(), dec!(800000), Decimal::ZERO, true, dec!(100));
        assert_eq!(band.total, Decimal::ZERO);
        assert_eq!(band.taper, Decimal::ZERO);
    }

    #[test]
    fn band_limited_to_residence_value() {
        let band = calculate_rnrb(&rates(), dec!(600000), dec!(120000), true, Decimal::ZERO);
        assert_eq!(band.base, dec!(120000));
        assert_eq!(band.total, dec!(120000));
    }

    #[test]
    fn transferred_band_added() {
        let band = calculate_rnrb(&rates(), dec!(900000), dec!(500000), true, dec!(100));
        assert_eq!(band.base, dec!(175000));
        assert_eq!(band.transferred, dec!(175000));
        assert_eq!(band.total, dec!(350000));
    }

    #[test]
    fn taper_above_two_million() {
        let band = calculate_rnrb(&rates(), dec!(2100000), dec!(500000), true, Decimal::ZERO);
        assert_eq!(band.taper, dec!(50000));
        assert_eq!(band.total, dec!(125000));
    }

    #[test]
    fn taper_consumes_whole_band() {
        let band = calculate_rnrb(&rates(), dec!(2350000), dec!(500000), true, Decimal::ZERO);
        assert_eq!(band.taper, dec!(175000));
        assert_eq!(band.total, Decimal::ZERO);
    }

    #[test]
    fn taper_never_negative_band() {
        let band = calculate_rnrb(&rates(), dec!(5000000), dec!(500000), true, dec!(100));
        assert_eq!(band.total, Decimal::ZERO);
    }

    #[test]
    fn threshold_exactly_no_taper() {
        let band = calculate_rnrb(&rates(), dec!(2000000), dec!(500000), true, Decimal::ZERO);
        assert_eq!(band.taper, Decimal::ZERO);
        assert_eq!(band.total, dec!(175000));
    }
}
