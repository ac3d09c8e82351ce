//! Relevant property trust charges: entry, ten-year periodic and exit.

use super::error::IhtError;
use super::estate::Trust;
use super::uk::{RateTable, YearRates};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Share of the hypothetical transfer rate charged at each anniversary
const PERIODIC_FRACTION: Decimal = dec!(0.30);
/// Highest possible periodic rate (30% of the 20% lifetime rate)
pub const MAX_PERIODIC_RATE: Decimal = dec!(0.06);
/// Quarters in a ten-year period
const QUARTERS_PER_PERIOD: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrustChargeKind {
    Entry,
    Periodic,
    Exit,
}

impl TrustChargeKind {
    pub fn display(&self) -> &'static str {
        match self {
            TrustChargeKind::Entry => "Entry",
            TrustChargeKind::Periodic => "Ten-Year",
            TrustChargeKind::Exit => "Exit",
        }
    }
}

/// A single charge in a trust's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustCharge {
    pub kind: TrustChargeKind,
    pub date: NaiveDate,
    pub chargeable_value: Decimal,
    /// Rate applied to the chargeable value, as a fraction
    pub rate: Decimal,
    pub tax_due: Decimal,
    /// Tax charged on the trust up to and including this charge
    pub cumulative_tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryCharge {
    pub available_nrb: Decimal,
    pub chargeable: Decimal,
    pub tax: Decimal,
    /// Rate used for exits before the first anniversary
    pub effective_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenYearCharge {
    pub trust_value: Decimal,
    pub available_nrb: Decimal,
    /// Tax on the hypothetical transfer at the lifetime rate
    pub hypothetical_tax: Decimal,
    pub effective_rate: Decimal,
    pub charge: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitCharge {
    pub quarters: u32,
    pub rate: Decimal,
    pub charge: Decimal,
}

fn available_nrb(rates: &YearRates, cumulative_clts: Decimal) -> Decimal {
    (rates.nil_rate_band - cumulative_clts).max(Decimal::ZERO)
}

fn periodic_rate(tax: Decimal, value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (tax / value * PERIODIC_FRACTION).min(MAX_PERIODIC_RATE)
}

/// Lifetime charge when assets are settled into the trust.
pub fn calculate_entry_charge(
    trust_value: Decimal,
    cumulative_clts: Decimal,
    rates: &YearRates,
) -> EntryCharge {
    let available_nrb = available_nrb(rates, cumulative_clts);
    let chargeable = (trust_value - available_nrb).max(Decimal::ZERO);
    let tax = (chargeable * rates.lifetime_rate).round_dp(2);
    EntryCharge {
        available_nrb,
        chargeable,
        tax,
        effective_rate: periodic_rate(tax, trust_value),
    }
}

/// Ten-year anniversary charge.
///
/// The trust value is treated as a fresh transfer by the settlor against the
/// nil-rate band at the anniversary. The effective rate is 30% of the rate
/// that transfer would bear, never more than 6%.
pub fn calculate_ten_year_charge(
    trust_value: Decimal,
    cumulative_clts: Decimal,
    rates: &YearRates,
) -> TenYearCharge {
    let available_nrb = available_nrb(rates, cumulative_clts);
    let hypothetical_tax =
        ((trust_value - available_nrb).max(Decimal::ZERO) * rates.lifetime_rate).round_dp(2);
    let effective_rate = periodic_rate(hypothetical_tax, trust_value);
    TenYearCharge {
        trust_value,
        available_nrb,
        hypothetical_tax,
        effective_rate,
        charge: (trust_value * effective_rate).round_dp(2),
    }
}

/// Charge on property leaving the trust between anniversaries.
///
/// `last_rate` is the effective rate of the previous entry or periodic charge,
/// as a fraction. Quarters above 40 are capped.
pub fn calculate_exit_charge(
    distribution: Decimal,
    last_rate: Decimal,
    quarters_elapsed: u32,
) -> ExitCharge {
    let quarters = quarters_elapsed.min(QUARTERS_PER_PERIOD);
    let rate = last_rate * Decimal::from(quarters) / Decimal::from(QUARTERS_PER_PERIOD);
    ExitCharge {
        quarters,
        rate,
        charge: (distribution * rate).round_dp(2),
    }
}

/// Complete three-month periods between two dates, floored.
pub fn complete_quarters(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    (months.max(0) / 3) as u32
}

/// Charges levied on a trust, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustHistory {
    pub trust_id: String,
    pub charges: Vec<TrustCharge>,
    /// Value left in the trust at the evaluation date
    pub current_value: Decimal,
    /// Rate that an exit at the evaluation date would be based on
    pub last_rate: Decimal,
    pub last_charge_date: Option<NaiveDate>,
    /// First ten-year anniversary after the evaluation date
    pub next_anniversary: Option<NaiveDate>,
}

impl TrustHistory {
    pub fn total_tax(&self) -> Decimal {
        self.charges.iter().map(|c| c.tax_due).sum()
    }

    fn push(
        &mut self,
        kind: TrustChargeKind,
        date: NaiveDate,
        chargeable_value: Decimal,
        rate: Decimal,
        tax_due: Decimal,
    ) {
        let cumulative_tax = self.total_tax() + tax_due;
        log::debug!(
            "Trust {} {} charge on {}: value={}, rate={}, tax={}",
            self.trust_id,
            kind.display(),
            date,
            chargeable_value,
            rate,
            tax_due
        );
        self.charges.push(TrustCharge {
            kind,
            date,
            chargeable_value,
            rate,
            tax_due,
            cumulative_tax,
        });
    }
}

fn next_anniversary(created: NaiveDate, date: NaiveDate) -> Option<NaiveDate> {
    (1..)
        .map_while(|n| anniversary(created, n))
        .find(|a| *a > date)
}

fn anniversary(created: NaiveDate, n: u32) -> Option<NaiveDate> {
    created.checked_add_months(Months::new(120 * n))
}

enum TrustEvent {
    Anniversary(NaiveDate),
    Distribution(NaiveDate, Decimal),
}

impl TrustEvent {
    fn date(&self) -> NaiveDate {
        match self {
            TrustEvent::Anniversary(d) | TrustEvent::Distribution(d, _) => *d,
        }
    }

    // anniversaries before distributions on the same day
    fn order(&self) -> u8 {
        match self {
            TrustEvent::Anniversary(_) => 0,
            TrustEvent::Distribution(..) => 1,
        }
    }
}

/// Build a trust's charge history up to `evaluation_date`.
///
/// Charges are applied in date order since each exit charge depends on the
/// rate of the charge before it. Distributions reduce the value used at later
/// anniversaries unless a valuation is recorded for that anniversary.
pub fn trust_charge_history(
    trust: &Trust,
    rates: &RateTable,
    evaluation_date: NaiveDate,
) -> Result<TrustHistory, IhtError> {
    let mut history = TrustHistory {
        trust_id: trust.id.clone(),
        charges: Vec::new(),
        current_value: trust.value,
        last_rate: Decimal::ZERO,
        last_charge_date: None,
        next_anniversary: None,
    };

    if !trust.relevant_property || trust.created > evaluation_date {
        return Ok(history);
    }

    let creation_rates = rates.rates_on(trust.created)?;
    let entry = calculate_entry_charge(trust.value, trust.settlor_cumulative_clts, creation_rates);
    history.push(
        TrustChargeKind::Entry,
        trust.created,
        entry.chargeable,
        creation_rates.lifetime_rate,
        entry.tax,
    );
    history.last_rate = entry.effective_rate;
    history.last_charge_date = Some(trust.created);
    history.next_anniversary = next_anniversary(trust.created, evaluation_date);

    let mut events: Vec<TrustEvent> = (1..)
        .map_while(|n| anniversary(trust.created, n))
        .take_while(|a| *a <= evaluation_date)
        .map(TrustEvent::Anniversary)
        .collect();
    events.extend(
        trust
            .distributions
            .iter()
            .filter(|d| d.date >= trust.created && d.date <= evaluation_date)
            .map(|d| TrustEvent::Distribution(d.date, d.amount)),
    );
    events.sort_by_key(|e| (e.date(), e.order()));

    for event in events {
        match event {
            TrustEvent::Anniversary(date) => {
                let value = trust
                    .valuations
                    .iter()
                    .find(|v| v.date == date)
                    .map_or(history.current_value, |v| v.value);
                let charge = calculate_ten_year_charge(
                    value,
                    trust.settlor_cumulative_clts,
                    rates.rates_on(date)?,
                );
                history.push(
                    TrustChargeKind::Periodic,
                    date,
                    value,
                    charge.effective_rate,
                    charge.charge,
                );
                history.current_value = value;
                history.last_rate = charge.effective_rate;
                history.last_charge_date = Some(date);
            }
            TrustEvent::Distribution(date, amount) => {
                if amount > history.current_value {
                    return Err(IhtError::DistributionExceedsTrustValue {
                        trust_id: trust.id.clone(),
                        date,
                        amount,
                        available: history.current_value,
                    });
                }
                let last = history.last_charge_date.unwrap_or(trust.created);
                let exit =
                    calculate_exit_charge(amount, history.last_rate, complete_quarters(last, date));
                history.push(
                    TrustChargeKind::Exit,
                    date,
                    amount,
                    exit.rate,
                    exit.charge,
                );
                history.current_value -= amount;
            }
        }
    }

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::estate::{Distribution, Valuation};
    use crate::core::uk::TaxYear;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rates() -> YearRates {
        RateTable::uk().rates(TaxYear(2025)).unwrap().clone()
    }

    fn trust(created: NaiveDate, value: Decimal) -> Trust {
        Trust {
            id: "family".to_string(),
            created,
            value,
            relevant_property: true,
            beneficiaries: vec!["Children".to_string()],
            settlor_cumulative_clts: Decimal::ZERO,
            valuations: vec![],
            distributions: vec![],
        }
    }

    #[test]
    fn entry_charge_above_nrb() {
        let entry = calculate_entry_charge(dec!(425000), Decimal::ZERO, &rates());
        assert_eq!(entry.chargeable, dec!(100000));
        assert_eq!(entry.tax, dec!(20000));
    }

    #[test]
    fn entry_charge_reduced_nrb_after_prior_clts() {
        let entry = calculate_entry_charge(dec!(200000), dec!(225000), &rates());
        assert_eq!(entry.available_nrb, dec!(100000));
        assert_eq!(entry.tax, dec!(20000));
    }

    #[test]
    fn entry_charge_within_nrb() {
        let entry = calculate_entry_charge(dec!(300000), Decimal::ZERO, &rates());
        assert_eq!(entry.tax, Decimal::ZERO);
        assert_eq!(entry.effective_rate, Decimal::ZERO);
    }

    #[test]
    fn ten_year_charge_hypothetical_transfer() {
        // (825,000 - 325,000) * 20% = 100,000; rate 100,000/825,000 * 30%
        let charge = calculate_ten_year_charge(dec!(825000), Decimal::ZERO, &rates());
        assert_eq!(charge.hypothetical_tax, dec!(100000));
        assert_eq!(charge.charge, dec!(30000));
    }

    #[test]
    fn ten_year_rate_never_exceeds_six_percent() {
        let rates = rates();
        for value in [dec!(0), dec!(1), dec!(325001), dec!(1000000), dec!(1000000000)] {
            for clts in [dec!(0), dec!(100000), dec!(325000), dec!(5000000)] {
                let charge = calculate_ten_year_charge(value, clts, &rates);
                assert!(charge.effective_rate <= MAX_PERIODIC_RATE);
                assert!(charge.effective_rate >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn exit_charge_proportional_to_quarters() {
        let exit = calculate_exit_charge(dec!(100000), dec!(0.06), 20);
        assert_eq!(exit.rate, dec!(0.03));
        assert_eq!(exit.charge, dec!(3000));
    }

    #[test]
    fn exit_charge_quarters_capped() {
        let exit = calculate_exit_charge(dec!(100000), dec!(0.05), 55);
        assert_eq!(exit.quarters, 40);
        assert_eq!(exit.charge, dec!(5000));
    }

    #[test]
    fn complete_quarters_floored() {
        assert_eq!(complete_quarters(date(2020, 1, 15), date(2020, 4, 14)), 0);
        assert_eq!(complete_quarters(date(2020, 1, 15), date(2020, 4, 15)), 1);
        assert_eq!(complete_quarters(date(2020, 1, 15), date(2022, 12, 31)), 11);
        assert_eq!(complete_quarters(date(2020, 1, 15), date(2019, 1, 1)), 0);
    }

    #[test]
    fn history_with_anniversary_and_exit() {
        let mut t = trust(date(2012, 5, 1), dec!(500000));
        t.distributions = vec![Distribution {
            date: date(2024, 11, 1),
            amount: dec!(100000),
        }];

        let history = trust_charge_history(&t, &RateTable::uk(), date(2025, 1, 1)).unwrap();
        let kinds: Vec<_> = history.charges.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TrustChargeKind::Entry,
                TrustChargeKind::Periodic,
                TrustChargeKind::Exit
            ]
        );

        // entry: (500,000 - 325,000) * 20%
        assert_eq!(history.charges[0].tax_due, dec!(35000));
        // anniversary 2022-05-01: 35,000 / 500,000 * 30% = 2.1%
        assert_eq!(history.charges[1].date, date(2022, 5, 1));
        assert_eq!(history.charges[1].rate, dec!(0.021));
        assert_eq!(history.charges[1].tax_due, dec!(10500));
        // exit 2024-11-01: 10 complete quarters since the anniversary
        assert_eq!(history.charges[2].rate, dec!(0.00525));
        assert_eq!(history.charges[2].tax_due, dec!(525));
        assert_eq!(history.charges[2].cumulative_tax, dec!(46025));
        assert_eq!(history.current_value, dec!(400000));
        assert_eq!(history.total_tax(), dec!(46025));
    }

    #[test]
    fn anniversary_uses_recorded_valuation() {
        let mut t = trust(date(2013, 3, 1), dec!(400000));
        t.valuations = vec![Valuation {
            date: date(2023, 3, 1),
            value: dec!(825000),
        }];
        let history = trust_charge_history(&t, &RateTable::uk(), date(2024, 1, 1)).unwrap();
        assert_eq!(history.charges[1].chargeable_value, dec!(825000));
        assert_eq!(history.charges[1].tax_due, dec!(30000));
        assert_eq!(history.current_value, dec!(825000));
    }

    #[test]
    fn exit_before_first_anniversary_uses_entry_rate() {
        let mut t = trust(date(2020, 1, 1), dec!(525000));
        t.distributions = vec![Distribution {
            date: date(2025, 1, 1),
            amount: dec!(50000),
        }];
        let history = trust_charge_history(&t, &RateTable::uk(), date(2025, 6, 1)).unwrap();
        // entry tax 40,000 on 525,000; 30% of that rate over 20 quarters
        let entry_rate = dec!(40000) / dec!(525000) * dec!(0.30);
        assert_eq!(history.charges[1].rate, entry_rate * dec!(20) / dec!(40));
    }

    #[test]
    fn charges_applied_in_date_order() {
        let mut t = trust(date(2014, 6, 1), dec!(600000));
        t.distributions = vec![
            Distribution {
                date: date(2025, 1, 1),
                amount: dec!(10000),
            },
            Distribution {
                date: date(2020, 1, 1),
                amount: dec!(10000),
            },
        ];
        let history = trust_charge_history(&t, &RateTable::uk(), date(2025, 6, 1)).unwrap();
        let dates: Vec<_> = history.charges.iter().map(|c| c.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(history.charges.len(), 4);
    }

    #[test]
    fn non_relevant_property_trust_has_no_charges() {
        let mut t = trust(date(2015, 1, 1), dec!(900000));
        t.relevant_property = false;
        let history = trust_charge_history(&t, &RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert!(history.charges.is_empty());
    }

    #[test]
    fn next_anniversary_follows_evaluation_date() {
        let t = trust(date(2015, 7, 1), dec!(100000));
        let rates = RateTable::uk();
        let history = trust_charge_history(&t, &rates, date(2025, 7, 1)).unwrap();
        assert_eq!(history.next_anniversary, Some(date(2035, 7, 1)));
        let history = trust_charge_history(&t, &rates, date(2020, 1, 1)).unwrap();
        assert_eq!(history.next_anniversary, Some(date(2025, 7, 1)));
    }

    #[test]
    fn trust_settled_before_2009_uses_band_of_its_year() {
        let t = trust(date(2005, 1, 1), dec!(400000));
        let history = trust_charge_history(&t, &RateTable::uk(), date(2024, 6, 1)).unwrap();
        assert_eq!(history.charges.len(), 2);
        // entry against the 2004/05 band of 263,000
        assert_eq!(history.charges[0].chargeable_value, dec!(137000));
        assert_eq!(history.charges[0].tax_due, dec!(27400));
        // anniversary 2015-01-01 against 325,000: 15,000 / 400,000 * 30%
        assert_eq!(history.charges[1].rate, dec!(0.01125));
        assert_eq!(history.charges[1].tax_due, dec!(4500));
        assert_eq!(history.next_anniversary, Some(date(2025, 1, 1)));
    }

    #[test]
    fn distribution_larger_than_trust_rejected() {
        let mut t = trust(date(2020, 1, 1), dec!(100000));
        t.distributions = vec![
            Distribution {
                date: date(2021, 1, 1),
                amount: dec!(60000),
            },
            Distribution {
                date: date(2022, 1, 1),
                amount: dec!(60000),
            },
        ];
        assert_eq!(
            trust_charge_history(&t, &RateTable::uk(), date(2025, 1, 1)).unwrap_err(),
            IhtError::DistributionExceedsTrustValue {
                trust_id: "family".to_string(),
                date: date(2022, 1, 1),
                amount: dec!(60000),
                available: dec!(40000),
            }
        );
    }
}
