use super::error::IhtError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// UK Tax Year (runs 6 April to 5 April)
/// The year value represents the end year (e.g., 2025 = 2024/25 tax year)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct TaxYear(pub i32);

impl TaxYear {
    /// Create a tax year from a date
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        // 6 April or later belongs to the tax year ending next April
        if (date.month(), date.day()) >= (4, 6) {
            TaxYear(year + 1)
        } else {
            TaxYear(year)
        }
    }

    pub fn previous(&self) -> TaxYear {
        TaxYear(self.0 - 1)
    }

    /// Display as "2024/25" format
    pub fn display(&self) -> String {
        format!("{}/{:02}", self.0 - 1, self.0 % 100)
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Wedding gift caps, keyed by the donor's relationship to the couple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WeddingCaps {
    #[schemars(with = "f64")]
    pub parent: Decimal,
    #[schemars(with = "f64")]
    pub grandparent: Decimal,
    #[schemars(with = "f64")]
    pub other: Decimal,
}

/// Thresholds and rates for a single tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct YearRates {
    pub tax_year: TaxYear,
    #[schemars(with = "f64")]
    pub nil_rate_band: Decimal,
    #[schemars(with = "f64")]
    pub residence_nil_rate_band: Decimal,
    #[schemars(with = "f64")]
    pub rnrb_taper_threshold: Decimal,
    /// Death rate
    #[schemars(with = "f64")]
    pub standard_rate: Decimal,
    /// Reduced death rate when 10% or more of the baseline goes to charity
    #[schemars(with = "f64")]
    pub charity_rate: Decimal,
    /// Rate on chargeable lifetime transfers and the trust charge hypothetical transfer
    #[schemars(with = "f64")]
    pub lifetime_rate: Decimal,
    #[schemars(with = "f64")]
    pub annual_exemption: Decimal,
    #[schemars(with = "f64")]
    pub small_gift_limit: Decimal,
    pub wedding_caps: WeddingCaps,
}

/// Rule changes that take effect on a fixed date rather than per tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForwardRules {
    /// Combined BPR/APR is capped from this date
    pub relief_cap_from: NaiveDate,
    #[schemars(with = "f64")]
    pub relief_cap: Decimal,
    /// Unused pension funds form part of the estate from this date
    pub pensions_in_estate_from: NaiveDate,
}

/// Limits used to decide between the excepted estate return and a full IHT400.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExceptedEstateLimits {
    #[schemars(with = "f64")]
    pub exempt_estate_gross_limit: Decimal,
    #[schemars(with = "f64")]
    pub foreign_assets_limit: Decimal,
}

/// Versioned IHT rates, looked up by tax year.
///
/// Built once (either [`RateTable::uk`] or loaded from JSON) and passed
/// explicitly into every computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RateTable {
    pub years: Vec<YearRates>,
    pub forward: ForwardRules,
    pub excepted_estate: ExceptedEstateLimits,
}

impl RateTable {
    /// Rates from the start of inheritance tax in 1986/87 through 2029/30.
    ///
    /// The nil-rate band has been frozen at £325,000 since 2009/10 and the RNRB
    /// phased in from £100,000 to £175,000 between 2017/18 and 2020/21. The
    /// reduced charity rate applies from 2012/13.
    pub fn uk() -> Self {
        let years = (1987..=2030)
            .map(|end_year| {
                let nil_rate_band = match end_year {
                    ..=1987 => dec!(71000),
                    1988 => dec!(90000),
                    1989 => dec!(110000),
                    1990 => dec!(118000),
                    1991 => dec!(128000),
                    1992 => dec!(140000),
                    1993..=1995 => dec!(150000),
                    1996 => dec!(154000),
                    1997 => dec!(200000),
                    1998 => dec!(215000),
                    1999 => dec!(223000),
                    2000 => dec!(231000),
                    2001 => dec!(234000),
                    2002 => dec!(242000),
                    2003 => dec!(250000),
                    2004 => dec!(255000),
                    2005 => dec!(263000),
                    2006 => dec!(275000),
                    2007 => dec!(285000),
                    2008 => dec!(300000),
                    2009 => dec!(312000),
                    _ => dec!(325000),
                };
                let residence_nil_rate_band = match end_year {
                    ..=2017 => Decimal::ZERO,
                    2018 => dec!(100000),
                    2019 => dec!(125000),
                    2020 => dec!(150000),
                    _ => dec!(175000),
                };
                let charity_rate = if end_year >= 2013 {
                    dec!(0.36)
                } else {
                    dec!(0.40)
                };
                YearRates {
                    tax_year: TaxYear(end_year),
                    nil_rate_band,
                    residence_nil_rate_band,
                    rnrb_taper_threshold: dec!(2000000),
                    standard_rate: dec!(0.40),
                    charity_rate,
                    lifetime_rate: dec!(0.20),
                    annual_exemption: dec!(3000),
                    small_gift_limit: dec!(250),
                    wedding_caps: WeddingCaps {
                        parent: dec!(5000),
                        grandparent: dec!(2500),
                        other: dec!(1000),
                    },
                }
            })
            .collect();

        RateTable {
            years,
            forward: ForwardRules {
                relief_cap_from: NaiveDate::from_ymd_opt(2026, 4, 6).expect("valid date"),
                relief_cap: dec!(1000000),
                pensions_in_estate_from: NaiveDate::from_ymd_opt(2027, 4, 6)
                    .expect("valid date"),
            },
            excepted_estate: ExceptedEstateLimits {
                exempt_estate_gross_limit: dec!(3000000),
                foreign_assets_limit: dec!(100000),
            },
        }
    }

    /// Rates for a tax year, failing if the table has no entry for it.
    pub fn rates(&self, year: TaxYear) -> Result<&YearRates, IhtError> {
        self.years
            .iter()
            .find(|r| r.tax_year == year)
            .ok_or(IhtError::UnknownTaxYear(year))
    }

    /// Rates in force on a date.
    pub fn rates_on(&self, date: NaiveDate) -> Result<&YearRates, IhtError> {
        self.rates(TaxYear::from_date(date))
    }

    pub fn relief_cap_applies(&self, date: NaiveDate) -> bool {
        date >= self.forward.relief_cap_from
    }

    pub fn pensions_in_estate(&self, date: NaiveDate) -> bool {
        date >= self.forward.pensions_in_estate_from
    }
}

impl Default for RateTable {
    fn default() -> Self {
        RateTable::uk()
    }
}
