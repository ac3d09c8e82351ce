//! Liability aggregation: turns an estate record into a complete IHT result.

use super::charity::{qualify_charity_rate, CharityRate};
use super::error::IhtError;
use super::estate::{
    Asset, Estate, EstateInput, ExemptionKind, Gift, GiftClassification, MarriageRecord, Trust,
};
use super::forms::{check_excepted_estate, FormRecommendation};
use super::gifts::{build_ledger, GiftLedger, LedgerEntry};
use super::relief::{apply_relief_cap, calculate_reliefs, AssetRelief};
use super::rnrb::{calculate_rnrb, ResidenceBand};
use super::taper::{calculate_taper_relief, years_since, SEVEN_YEARS};
use super::trust::{trust_charge_history, TrustHistory};
use super::uk::{RateTable, TaxYear, YearRates};
use super::validate;
use super::warnings::{Band, FutureChange, Warning};
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Nil-rate band, own and transferred, and how much the gifts used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NilRateBand {
    pub own: Decimal,
    pub transferred_percent: Decimal,
    pub transferred: Decimal,
    pub total: Decimal,
    /// Consumed by lifetime gifts in the 7 years before the evaluation date
    pub used_by_gifts: Decimal,
    /// Left for the estate
    pub available: Decimal,
}

/// Residence nil-rate band with the transfer percentage it was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResidenceNilRateBand {
    pub transferred_percent: Decimal,
    #[serde(flatten)]
    pub band: ResidenceBand,
}

/// Death-time assessment of a lifetime gift within the 7-year window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GiftAssessment {
    pub gift_id: String,
    pub date: NaiveDate,
    pub classification: GiftClassification,
    pub chargeable: Decimal,
    pub years_before: Decimal,
    pub nrb_used: Decimal,
    /// Part of the gift above the nil-rate band
    pub excess: Decimal,
    pub tax_before_taper: Decimal,
    pub taper_rate: Decimal,
    pub taper_relief: Decimal,
    /// Lifetime tax already paid on a CLT, credited against the death tax
    pub lifetime_tax: Decimal,
    pub tax_due: Decimal,
}

/// Everything computed for an estate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IhtResult {
    pub evaluation_date: NaiveDate,
    pub tax_year: TaxYear,
    /// Declared assets plus included pensions and gifts with reservation
    pub total_estate_value: Decimal,
    pub pensions_included: Decimal,
    pub reserved_gifts: Decimal,
    pub liabilities: Decimal,
    pub net_estate: Decimal,
    pub nil_rate_band: NilRateBand,
    pub residence_nil_rate_band: ResidenceNilRateBand,
    pub bpr: Decimal,
    pub apr: Decimal,
    pub relief_capped: bool,
    pub reliefs: Vec<AssetRelief>,
    pub charitable_legacy: Decimal,
    pub charity: CharityRate,
    pub taxable_estate: Decimal,
    pub estate_tax: Decimal,
    /// Gifts that can affect the result, after exemptions, oldest first
    pub ledger: Vec<LedgerEntry>,
    /// Chargeable PETs made within the 7 years before the evaluation date
    pub pet_total: Decimal,
    /// Chargeable CLTs made within the 7 years before the evaluation date
    pub clt_total: Decimal,
    pub gifts: Vec<GiftAssessment>,
    /// Tax on gifts that became chargeable because of death within 7 years
    pub failed_pet_tax: Decimal,
    pub taper_relief_total: Decimal,
    pub exemptions_used: BTreeMap<ExemptionKind, Decimal>,
    pub trusts: Vec<TrustHistory>,
    pub trust_tax_total: Decimal,
    pub tax_due: Decimal,
    /// Tax due as a fraction of the net estate
    pub effective_rate: Decimal,
    pub form: FormRecommendation,
    pub warnings: Vec<Warning>,
    pub future_changes: Vec<FutureChange>,
}

impl EstateInput {
    pub fn compute(
        &self,
        rates: &RateTable,
        evaluation_date: NaiveDate,
    ) -> Result<IhtResult, IhtError> {
        compute_iht(
            rates,
            &self.estate,
            &self.assets,
            &self.gifts,
            &self.trusts,
            &self.marriages,
            evaluation_date,
        )
    }
}

fn validate_input(
    estate: &Estate,
    assets: &[Asset],
    gifts: &[Gift],
    trusts: &[Trust],
    marriages: &[MarriageRecord],
) -> Result<(), IhtError> {
    validate::validate_estate(estate)?;
    assets.iter().try_for_each(validate::validate_asset)?;
    gifts.iter().try_for_each(validate::validate_gift)?;
    trusts.iter().try_for_each(validate::validate_trust)?;
    marriages.iter().try_for_each(validate::validate_marriage)
}

/// Sum transfer claims and cap at 100%
fn transfer_percent(
    direct: Decimal,
    from_records: impl Iterator<Item = Decimal>,
    band: Band,
    warnings: &mut Vec<Warning>,
) -> Decimal {
    let claimed = direct + from_records.sum::<Decimal>();
    if claimed > Decimal::ONE_HUNDRED {
        warnings.push(Warning::TransferCapped {
            band,
            claimed_percent: claimed,
        });
        Decimal::ONE_HUNDRED
    } else {
        claimed
    }
}

/// CLTs made in the 7 years before `entry`
fn prior_clts(ledger: &GiftLedger, entry: &LedgerEntry) -> Decimal {
    let window_start = entry
        .date
        .checked_sub_months(Months::new(12 * 7))
        .unwrap_or(NaiveDate::MIN);
    ledger
        .chargeable()
        .filter(|e| e.classification == GiftClassification::Clt)
        .filter(|e| e.date > window_start && e.date < entry.date)
        .map(|e| e.chargeable)
        .sum()
}

/// Tax paid when a CLT was made: lifetime rate on the excess over the
/// nil-rate band left after the settlor's CLTs in the previous 7 years.
fn lifetime_tax(
    ledger: &GiftLedger,
    entry: &LedgerEntry,
    rates: &RateTable,
) -> Result<Decimal, IhtError> {
    if entry.classification != GiftClassification::Clt {
        return Ok(Decimal::ZERO);
    }
    let year_rates = rates.rates(entry.tax_year)?;
    let available = (year_rates.nil_rate_band - prior_clts(ledger, entry)).max(Decimal::ZERO);
    Ok(((entry.chargeable - available).max(Decimal::ZERO) * year_rates.lifetime_rate).round_dp(2))
}

/// Cumulate the gifts made in the 7 years before death against the nil-rate
/// band, oldest first, and work out the tax each one bears.
fn assess_gifts(
    ledger: &GiftLedger,
    rates: &RateTable,
    death_rates: &YearRates,
    nil_rate_band: Decimal,
    evaluation_date: NaiveDate,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<GiftAssessment>, IhtError> {
    let mut remaining_nrb = nil_rate_band;
    let mut assessments = Vec::new();

    for entry in ledger.chargeable() {
        let years = years_since(entry.date, evaluation_date);
        if entry.date > evaluation_date || years >= SEVEN_YEARS {
            continue;
        }

        let lifetime_tax = lifetime_tax(ledger, entry, rates)?;
        if lifetime_tax > Decimal::ZERO {
            warnings.push(Warning::CltLifetimeCharge {
                gift_id: entry.gift_id.clone(),
                lifetime_tax,
            });
        }

        let nrb_used = remaining_nrb.min(entry.chargeable);
        remaining_nrb -= nrb_used;
        let excess = entry.chargeable - nrb_used;
        let tax_before_taper = (excess * death_rates.standard_rate).round_dp(2);
        let taper = calculate_taper_relief(entry.date, tax_before_taper, evaluation_date);
        let tax_due = (tax_before_taper - taper.relief - lifetime_tax).max(Decimal::ZERO);

        log::debug!(
            "Gift {} ({:.2} years): nrb_used={}, excess={}, tax={}, taper={}, credit={}, due={}",
            entry.gift_id,
            years,
            nrb_used,
            excess,
            tax_before_taper,
            taper.relief,
            lifetime_tax,
            tax_due
        );

        assessments.push(GiftAssessment {
            gift_id: entry.gift_id.clone(),
            date: entry.date,
            classification: entry.classification,
            chargeable: entry.chargeable,
            years_before: years.round_dp(2),
            nrb_used,
            excess,
            tax_before_taper,
            taper_rate: taper.rate,
            taper_relief: taper.relief,
            lifetime_tax,
            tax_due,
        });
    }

    Ok(assessments)
}

/// Compute the IHT liability of an estate at `evaluation_date`.
///
/// Inputs are validated first; any error aborts the computation and no
/// partial result is produced.
pub fn compute_iht(
    rates: &RateTable,
    estate: &Estate,
    assets: &[Asset],
    gifts: &[Gift],
    trusts: &[Trust],
    marriages: &[MarriageRecord],
    evaluation_date: NaiveDate,
) -> Result<IhtResult, IhtError> {
    validate_input(estate, assets, gifts, trusts, marriages)?;

    let tax_year = TaxYear::from_date(evaluation_date);
    let year_rates = rates.rates(tax_year)?;
    let mut warnings = Vec::new();
    let mut future_changes = Vec::new();

    if !estate.uk_domiciled {
        warnings.push(Warning::NonUkDomicile);
    }

    // Pensions
    let pension_value: Decimal = assets
        .iter()
        .filter(|a| a.is_pension())
        .map(|a| a.value)
        .sum();
    let pensions_included = if pension_value.is_zero() {
        Decimal::ZERO
    } else if rates.pensions_in_estate(evaluation_date) {
        future_changes.push(FutureChange::PensionsIncluded {
            value: pension_value,
        });
        pension_value
    } else {
        future_changes.push(FutureChange::PensionsIncludedFrom {
            effective_from: rates.forward.pensions_in_estate_from,
            value: pension_value,
        });
        Decimal::ZERO
    };

    // Gifts
    let ledger = build_ledger(gifts, rates, evaluation_date)?;
    warnings.extend(ledger.warnings.iter().cloned());
    let reserved_gifts = ledger.reserved_total();

    let total_estate_value = estate.gross_value + pensions_included + reserved_gifts;
    let net_estate = (total_estate_value - estate.liabilities).max(Decimal::ZERO);

    // Nil-rate bands
    let nrb_percent = transfer_percent(
        estate.transferred_nrb_percent,
        marriages.iter().map(|m| m.unused_nrb_percent),
        Band::NilRate,
        &mut warnings,
    );
    let rnrb_percent = transfer_percent(
        estate.transferred_rnrb_percent,
        marriages.iter().map(|m| m.unused_rnrb_percent),
        Band::ResidenceNilRate,
        &mut warnings,
    );

    let own_nrb = year_rates.nil_rate_band;
    let transferred_nrb = (own_nrb * nrb_percent / Decimal::ONE_HUNDRED).round_dp(2);
    let total_nrb = own_nrb + transferred_nrb;

    let gift_assessments = assess_gifts(
        &ledger,
        rates,
        year_rates,
        total_nrb,
        evaluation_date,
        &mut warnings,
    )?;
    let nrb_used_by_gifts: Decimal = gift_assessments.iter().map(|g| g.nrb_used).sum();
    let failed_pet_tax: Decimal = gift_assessments.iter().map(|g| g.tax_due).sum();
    let taper_relief_total: Decimal = gift_assessments.iter().map(|g| g.taper_relief).sum();
    let window_total = |classification: GiftClassification| -> Decimal {
        gift_assessments
            .iter()
            .filter(|g| g.classification == classification)
            .map(|g| g.chargeable)
            .sum()
    };
    let pet_total = window_total(GiftClassification::Pet);
    let clt_total = window_total(GiftClassification::Clt);

    let nil_rate_band = NilRateBand {
        own: own_nrb,
        transferred_percent: nrb_percent,
        transferred: transferred_nrb,
        total: total_nrb,
        used_by_gifts: nrb_used_by_gifts,
        available: total_nrb - nrb_used_by_gifts,
    };

    let has_main_residence = estate.residence_value > Decimal::ZERO
        || assets.iter().any(|a| a.is_main_residence());
    if has_main_residence && !estate.leaves_residence_to_descendants {
        warnings.push(Warning::ResidenceNotToDescendants);
    }
    let residence_band = calculate_rnrb(
        year_rates,
        net_estate,
        estate.residence_value,
        estate.leaves_residence_to_descendants,
        rnrb_percent,
    );

    // Reliefs
    let relief_report = calculate_reliefs(assets);
    warnings.extend(relief_report.warnings.iter().cloned());
    let relief = apply_relief_cap(&relief_report, rates, evaluation_date);
    future_changes.extend(relief.future_change.clone());

    // Rate and taxable estate
    let charity = qualify_charity_rate(
        year_rates,
        net_estate,
        nil_rate_band.available,
        residence_band.total,
        estate.charitable_legacy,
    );

    let taxable_estate = (net_estate
        - nil_rate_band.available
        - residence_band.total
        - estate.charitable_legacy
        - relief.bpr
        - relief.apr)
        .max(Decimal::ZERO);
    let estate_tax = (taxable_estate * charity.rate).round_dp(2);
    let tax_due = (estate_tax + failed_pet_tax).max(Decimal::ZERO);
    let effective_rate = if net_estate > Decimal::ZERO {
        (tax_due / net_estate).round_dp(4)
    } else {
        Decimal::ZERO
    };

    // Trusts
    let trust_histories = trusts
        .iter()
        .map(|t| trust_charge_history(t, rates, evaluation_date))
        .collect::<Result<Vec<_>, _>>()?;
    let trust_tax_total: Decimal = trust_histories.iter().map(|h| h.total_tax()).sum();

    let form = check_excepted_estate(
        rates,
        tax_year,
        total_estate_value,
        tax_due,
        estate.foreign_assets,
        !trusts.is_empty(),
    )?;

    for warning in &warnings {
        log::warn!("{}", warning);
    }
    log::info!(
        "IHT at {}: net estate={}, taxable={}, estate tax={}, gift tax={}, total={}",
        evaluation_date,
        net_estate,
        taxable_estate,
        estate_tax,
        failed_pet_tax,
        tax_due
    );

    Ok(IhtResult {
        evaluation_date,
        tax_year,
        total_estate_value,
        pensions_included,
        reserved_gifts,
        liabilities: estate.liabilities,
        net_estate,
        nil_rate_band,
        residence_nil_rate_band: ResidenceNilRateBand {
            transferred_percent: rnrb_percent,
            band: residence_band,
        },
        bpr: relief.bpr,
        apr: relief.apr,
        relief_capped: relief.capped,
        reliefs: relief_report.lines,
        charitable_legacy: estate.charitable_legacy,
        charity,
        taxable_estate,
        estate_tax,
        exemptions_used: ledger.usage().clone(),
        ledger: ledger.entries,
        pet_total,
        clt_total,
        gifts: gift_assessments,
        failed_pet_tax,
        taper_relief_total,
        trusts: trust_histories,
        trust_tax_total,
        tax_due,
        effective_rate,
        form,
        warnings,
        future_changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::estate::{AssetCategory, BusinessReliefType, ExemptionClaim};
    use crate::core::forms::ReturnForm;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(estate: Estate) -> EstateInput {
        EstateInput {
            estate,
            assets: vec![],
            gifts: vec![],
            trusts: vec![],
            marriages: vec![],
        }
    }

    fn pet(id: &str, on: NaiveDate, amount: Decimal) -> Gift {
        Gift {
            id: id.to_string(),
            date: on,
            amount,
            recipient: "Son".to_string(),
            relationship: "parent".to_string(),
            classification: GiftClassification::Pet,
            to_trust: false,
            exemptions: vec![],
            reservation_of_benefit: false,
        }
    }

    fn marriage(spouse: &str, nrb: Decimal, rnrb: Decimal) -> MarriageRecord {
        MarriageRecord {
            spouse: spouse.to_string(),
            date_of_death: date(2015, 3, 1),
            nil_rate_band_at_death: dec!(325000),
            rnrb_at_death: Decimal::ZERO,
            unused_nrb_percent: nrb,
            unused_rnrb_percent: rnrb,
        }
    }

    #[test]
    fn rnrb_fully_tapered_estate() {
        let mut estate = Estate::new(dec!(2350000));
        estate.residence_value = dec!(500000);
        estate.leaves_residence_to_descendants = true;

        let result = input(estate).compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert_eq!(result.residence_nil_rate_band.band.total, Decimal::ZERO);
        assert_eq!(result.residence_nil_rate_band.band.taper, dec!(175000));
        assert_eq!(result.nil_rate_band.total, dec!(325000));
        assert_eq!(result.taxable_estate, dec!(2025000));
        assert_eq!(result.charity.rate, dec!(0.40));
        assert_eq!(result.tax_due, dec!(810000));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn estate_within_bands_pays_nothing() {
        let mut estate = Estate::new(dec!(500000));
        estate.residence_value = dec!(300000);
        estate.leaves_residence_to_descendants = true;

        let result = input(estate).compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert_eq!(result.taxable_estate, Decimal::ZERO);
        assert_eq!(result.tax_due, Decimal::ZERO);
        assert_eq!(result.effective_rate, Decimal::ZERO);
        assert_eq!(result.form.form, ReturnForm::Iht205);
    }

    #[test]
    fn liabilities_reduce_net_estate() {
        let mut estate = Estate::new(dec!(600000));
        estate.liabilities = dec!(100000);
        let result = input(estate).compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert_eq!(result.net_estate, dec!(500000));
        assert_eq!(result.taxable_estate, dec!(175000));
        assert_eq!(result.tax_due, dec!(70000));
        assert_eq!(result.effective_rate, dec!(0.14));
    }

    #[test]
    fn transferred_bands_capped_across_marriages() {
        let mut estate = Estate::new(dec!(1000000));
        estate.residence_value = dec!(400000);
        estate.leaves_residence_to_descendants = true;
        let mut record = input(estate);
        record.marriages = vec![
            marriage("First", dec!(60), dec!(70)),
            marriage("Second", dec!(60), dec!(10)),
        ];

        let result = record.compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert_eq!(result.nil_rate_band.transferred_percent, dec!(100));
        assert_eq!(result.nil_rate_band.total, dec!(650000));
        assert_eq!(result.residence_nil_rate_band.transferred_percent, dec!(80));
        assert_eq!(result.residence_nil_rate_band.band.total, dec!(315000));
        assert_eq!(
            result.warnings,
            vec![Warning::TransferCapped {
                band: Band::NilRate,
                claimed_percent: dec!(120),
            }]
        );
        // 1,000,000 - 650,000 - 315,000
        assert_eq!(result.taxable_estate, dec!(35000));
    }

    #[test]
    fn failed_pet_uses_nrb_and_gets_taper_on_tax() {
        let mut record = input(Estate::new(dec!(500000)));
        record.gifts = vec![pet("g1", date(2021, 1, 1), dec!(400000))];

        let result = record.compute(&RateTable::uk(), date(2025, 6, 1)).unwrap();
        let gift = &result.gifts[0];
        assert_eq!(gift.nrb_used, dec!(325000));
        assert_eq!(gift.excess, dec!(75000));
        assert_eq!(gift.tax_before_taper, dec!(30000));
        assert_eq!(gift.taper_rate, dec!(0.40));
        assert_eq!(gift.taper_relief, dec!(12000));
        assert_eq!(gift.tax_due, dec!(18000));

        assert_eq!(result.nil_rate_band.available, Decimal::ZERO);
        assert_eq!(result.taxable_estate, dec!(500000));
        assert_eq!(result.estate_tax, dec!(200000));
        assert_eq!(result.failed_pet_tax, dec!(18000));
        assert_eq!(result.tax_due, dec!(218000));
        assert_eq!(result.pet_total, dec!(400000));
    }

    #[test]
    fn gifts_older_than_seven_years_drop_out() {
        let mut record = input(Estate::new(dec!(500000)));
        record.gifts = vec![pet("old", date(2015, 1, 1), dec!(400000))];

        let result = record.compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert!(result.gifts.is_empty());
        assert_eq!(result.ledger.len(), 1);
        assert_eq!(result.pet_total, Decimal::ZERO);
        assert_eq!(result.nil_rate_band.available, dec!(325000));
        assert_eq!(result.tax_due, dec!(70000));
    }

    #[test]
    fn gift_after_evaluation_date_not_counted() {
        let mut record = input(Estate::new(dec!(500000)));
        record.gifts = vec![
            pet("before", date(2023, 1, 1), dec!(100000)),
            pet("after", date(2025, 3, 1), dec!(50000)),
        ];
        let result = record.compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert_eq!(result.pet_total, dec!(100000));
        assert_eq!(result.ledger.len(), 1);
    }

    #[test]
    fn long_gift_history_and_old_trust() {
        let mut record = input(Estate::new(dec!(500000)));
        record.gifts = vec![
            pet("school-fees", date(1984, 9, 1), dec!(15000)),
            pet("deposit", date(2006, 5, 1), dec!(20000)),
        ];
        record.trusts = vec![Trust {
            id: "discretionary".to_string(),
            created: date(2005, 1, 1),
            value: dec!(300000),
            relevant_property: true,
            beneficiaries: vec![],
            settlor_cumulative_clts: Decimal::ZERO,
            valuations: vec![],
            distributions: vec![],
        }];

        let result = record.compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert!(result.ledger.is_empty());
        assert_eq!(result.pet_total, Decimal::ZERO);
        assert_eq!(result.tax_due, dec!(70000));
        // entry charge against the 2004/05 band of 263,000
        let entry = &result.trusts[0].charges[0];
        assert_eq!(entry.chargeable_value, dec!(37000));
        assert_eq!(entry.tax_due, dec!(7400));
    }

    #[test]
    fn exemptions_reduce_cumulated_gift() {
        let mut gift = pet("g1", date(2023, 6, 1), dec!(330000));
        gift.exemptions = vec![ExemptionClaim::full(ExemptionKind::Annual)];
        let mut record = input(Estate::new(Decimal::ZERO));
        record.gifts = vec![gift];

        let result = record.compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert_eq!(result.gifts[0].chargeable, dec!(324000));
        assert_eq!(result.failed_pet_tax, Decimal::ZERO);
        assert_eq!(result.exemptions_used[&ExemptionKind::Annual], dec!(6000));
    }

    #[test]
    fn clt_lifetime_tax_credited_on_death() {
        let mut clt = pet("t1", date(2020, 6, 1), dec!(425000));
        clt.classification = GiftClassification::Clt;
        clt.to_trust = true;
        let mut record = input(Estate::new(Decimal::ZERO));
        record.gifts = vec![clt];

        let result = record.compute(&RateTable::uk(), date(2024, 6, 1)).unwrap();
        let gift = &result.gifts[0];
        assert_eq!(gift.lifetime_tax, dec!(20000));
        assert_eq!(gift.tax_before_taper, dec!(40000));
        assert_eq!(gift.taper_relief, dec!(16000));
        assert_eq!(gift.tax_due, dec!(4000));
        assert_eq!(result.clt_total, dec!(425000));
        assert!(result
            .warnings
            .contains(&Warning::CltLifetimeCharge {
                gift_id: "t1".to_string(),
                lifetime_tax: dec!(20000),
            }));
    }

    #[test]
    fn charity_rate_applied_to_taxable_estate() {
        let mut estate = Estate::new(dec!(1000000));
        estate.charitable_legacy = dec!(67500);
        let result = input(estate).compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert_eq!(result.charity.baseline, dec!(675000));
        assert!(result.charity.qualifies);
        assert_eq!(result.taxable_estate, dec!(607500));
        assert_eq!(result.tax_due, dec!(218700));
    }

    #[test]
    fn business_relief_reduces_taxable_estate() {
        let mut record = input(Estate::new(dec!(900000)));
        record.assets = vec![Asset {
            id: "company".to_string(),
            category: AssetCategory::Business {
                relief: BusinessReliefType::UnquotedShares,
                excepted: false,
            },
            value: dec!(400000),
            ownership_years: dec!(8),
            description: None,
        }];
        let result = record.compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert_eq!(result.bpr, dec!(400000));
        assert_eq!(result.taxable_estate, dec!(175000));
    }

    #[test]
    fn relief_capped_after_cap_date() {
        let mut record = input(Estate::new(dec!(3000000)));
        record.assets = vec![Asset {
            id: "company".to_string(),
            category: AssetCategory::Business {
                relief: BusinessReliefType::UnquotedShares,
                excepted: false,
            },
            value: dec!(2500000),
            ownership_years: dec!(8),
            description: None,
        }];
        let before = record.compute(&RateTable::uk(), date(2026, 1, 1)).unwrap();
        assert_eq!(before.bpr, dec!(2500000));
        assert!(!before.relief_capped);
        assert!(matches!(
            before.future_changes[0],
            FutureChange::ReliefCapUpcoming { .. }
        ));

        let after = record.compute(&RateTable::uk(), date(2026, 6, 1)).unwrap();
        assert_eq!(after.bpr, dec!(1000000));
        assert!(after.relief_capped);
    }

    #[test]
    fn pensions_join_the_estate_from_april_2027() {
        let mut record = input(Estate::new(dec!(325000)));
        record.assets = vec![Asset {
            id: "sipp".to_string(),
            category: AssetCategory::Pension,
            value: dec!(100000),
            ownership_years: dec!(20),
            description: None,
        }];

        let before = record.compute(&RateTable::uk(), date(2027, 4, 5)).unwrap();
        assert_eq!(before.pensions_included, Decimal::ZERO);
        assert_eq!(before.tax_due, Decimal::ZERO);

        let after = record.compute(&RateTable::uk(), date(2027, 4, 6)).unwrap();
        assert_eq!(after.pensions_included, dec!(100000));
        assert_eq!(after.tax_due, dec!(40000));
    }

    #[test]
    fn gift_with_reservation_stays_in_estate() {
        let mut house = pet("house", date(2019, 1, 1), dec!(300000));
        house.reservation_of_benefit = true;
        let mut record = input(Estate::new(dec!(200000)));
        record.gifts = vec![house];

        let result = record.compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert_eq!(result.reserved_gifts, dec!(300000));
        assert_eq!(result.net_estate, dec!(500000));
        assert!(result.gifts.is_empty());
        assert_eq!(result.tax_due, dec!(70000));
    }

    #[test]
    fn compute_is_idempotent() {
        let mut record = input(Estate::new(dec!(800000)));
        record.gifts = vec![pet("g1", date(2020, 3, 1), dec!(450000))];
        let rates = RateTable::uk();
        let first = record.compute(&rates, date(2025, 1, 1)).unwrap();
        let second = record.compute(&rates, date(2025, 1, 1)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn later_evaluation_date_increases_taper() {
        let mut record = input(Estate::new(dec!(800000)));
        record.gifts = vec![pet("g1", date(2021, 3, 1), dec!(450000))];
        let rates = RateTable::uk();
        let early = record.compute(&rates, date(2023, 3, 1)).unwrap();
        let late = record.compute(&rates, date(2026, 3, 1)).unwrap();
        assert_eq!(early.taper_relief_total, Decimal::ZERO);
        assert!(late.taper_relief_total > Decimal::ZERO);
        assert!(late.failed_pet_tax < early.failed_pet_tax);
    }

    #[test]
    fn unknown_tax_year_aborts() {
        let record = input(Estate::new(dec!(500000)));
        assert_eq!(
            record.compute(&RateTable::uk(), date(2040, 1, 1)).unwrap_err(),
            IhtError::UnknownTaxYear(TaxYear(2040))
        );
    }

    #[test]
    fn invalid_gift_aborts_whole_computation() {
        let mut bad = pet("bad", date(2022, 1, 1), dec!(1000));
        bad.classification = GiftClassification::Clt;
        let mut record = input(Estate::new(dec!(500000)));
        record.gifts = vec![pet("ok", date(2021, 1, 1), dec!(1000)), bad];
        assert_eq!(
            record.compute(&RateTable::uk(), date(2025, 1, 1)).unwrap_err(),
            IhtError::InvalidGiftClassification {
                gift_id: "bad".to_string()
            }
        );
    }

    #[test]
    fn trust_charges_attached() {
        let mut record = input(Estate::new(dec!(100000)));
        record.trusts = vec![Trust {
            id: "discretionary".to_string(),
            created: date(2014, 2, 1),
            value: dec!(425000),
            relevant_property: true,
            beneficiaries: vec![],
            settlor_cumulative_clts: Decimal::ZERO,
            valuations: vec![],
            distributions: vec![],
        }];
        let result = record.compute(&RateTable::uk(), date(2025, 1, 1)).unwrap();
        assert_eq!(result.trusts[0].charges.len(), 2);
        assert!(result.trust_tax_total > Decimal::ZERO);
        assert_eq!(result.form.form, ReturnForm::Iht400);
    }
}
