//! Business Property Relief and Agricultural Property Relief

use super::estate::{AgriculturalOccupation, Asset, AssetCategory, BusinessReliefType};
use super::uk::RateTable;
use super::warnings::{FutureChange, Warning};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

const BUSINESS_MIN_YEARS: u32 = 2;
const AGRICULTURAL_OCCUPIED_MIN_YEARS: u32 = 2;
const AGRICULTURAL_LET_MIN_YEARS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReliefKind {
    Business,
    Agricultural,
}

/// Relief given on a single asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRelief {
    pub asset_id: String,
    pub kind: ReliefKind,
    pub value: Decimal,
    /// Relief rate as a fraction (0, 0.5 or 1)
    pub rate: Decimal,
    pub relief: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReliefReport {
    pub bpr: Decimal,
    pub apr: Decimal,
    pub lines: Vec<AssetRelief>,
    pub warnings: Vec<Warning>,
}

impl ReliefReport {
    pub fn combined(&self) -> Decimal {
        self.bpr + self.apr
    }
}

/// Relief after the forward-dated cap has been considered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CappedRelief {
    pub bpr: Decimal,
    pub apr: Decimal,
    pub capped: bool,
    pub future_change: Option<FutureChange>,
}

fn business_rate(
    asset: &Asset,
    relief: BusinessReliefType,
    excepted: bool,
) -> (Decimal, Option<Warning>) {
    if asset.ownership_years < Decimal::from(BUSINESS_MIN_YEARS) {
        return (
            Decimal::ZERO,
            Some(Warning::InsufficientOwnershipPeriod {
                asset_id: asset.id.clone(),
                years: asset.ownership_years,
                required_years: BUSINESS_MIN_YEARS,
            }),
        );
    }
    if excepted {
        return (
            Decimal::ZERO,
            Some(Warning::ExceptedAsset {
                asset_id: asset.id.clone(),
            }),
        );
    }
    match relief {
        BusinessReliefType::UnquotedShares | BusinessReliefType::Aim => (Decimal::ONE, None),
        BusinessReliefType::QuotedControlling | BusinessReliefType::BusinessAssets => {
            (dec!(0.5), None)
        }
        BusinessReliefType::None => (
            Decimal::ZERO,
            Some(Warning::NoQualifyingRelief {
                asset_id: asset.id.clone(),
            }),
        ),
    }
}

fn agricultural_rate(
    asset: &Asset,
    occupation: AgriculturalOccupation,
) -> (Decimal, Option<Warning>) {
    let required_years = match occupation {
        AgriculturalOccupation::OwnerOccupied => AGRICULTURAL_OCCUPIED_MIN_YEARS,
        AgriculturalOccupation::Let => AGRICULTURAL_LET_MIN_YEARS,
    };
    if asset.ownership_years < Decimal::from(required_years) {
        (
            Decimal::ZERO,
            Some(Warning::InsufficientOwnershipPeriod {
                asset_id: asset.id.clone(),
                years: asset.ownership_years,
                required_years,
            }),
        )
    } else {
        (Decimal::ONE, None)
    }
}

/// Relief on each business and agricultural asset.
///
/// The rate is derived only from the asset's category, relief tag and
/// ownership period. Other categories are skipped.
pub fn calculate_reliefs(assets: &[Asset]) -> ReliefReport {
    let mut report = ReliefReport::default();

    for asset in assets {
        let (kind, (rate, warning)) = match asset.category {
            AssetCategory::Business { relief, excepted } => {
                (ReliefKind::Business, business_rate(asset, relief, excepted))
            }
            AssetCategory::Agricultural { occupation } => {
                (ReliefKind::Agricultural, agricultural_rate(asset, occupation))
            }
            AssetCategory::Property { .. }
            | AssetCategory::Investment
            | AssetCategory::Personal
            | AssetCategory::Pension => continue,
        };

        let relief = (asset.value * rate).round_dp(2);
        log::debug!(
            "Relief {:?} on {}: value={}, rate={}, relief={}",
            kind,
            asset.id,
            asset.value,
            rate,
            relief
        );
        match kind {
            ReliefKind::Business => report.bpr += relief,
            ReliefKind::Agricultural => report.apr += relief,
        }
        if let Some(w) = warning {
            report.warnings.push(w);
        }
        report.lines.push(AssetRelief {
            asset_id: asset.id.clone(),
            kind,
            value: asset.value,
            rate,
            relief,
        });
    }

    report
}

/// Clamp combined BPR and APR to the cap once it is in force.
///
/// The reduction is shared between BPR and APR pro rata. Before the cap date
/// an estate whose relief would exceed the cap gets a forward-looking notice.
pub fn apply_relief_cap(report: &ReliefReport, rates: &RateTable, date: NaiveDate) -> CappedRelief {
    let cap = rates.forward.relief_cap;
    let combined = report.combined();

    if combined <= cap {
        return CappedRelief {
            bpr: report.bpr,
            apr: report.apr,
            capped: false,
            future_change: None,
        };
    }

    if !rates.relief_cap_applies(date) {
        return CappedRelief {
            bpr: report.bpr,
            apr: report.apr,
            capped: false,
            future_change: Some(FutureChange::ReliefCapUpcoming {
                effective_from: rates.forward.relief_cap_from,
                cap,
                combined_relief: combined,
            }),
        };
    }

    let bpr = (report.bpr * cap / combined).round_dp(2);
    let apr = cap - bpr;
    log::debug!("Relief cap applied: {} -> {} (bpr={}, apr={})", combined, cap, bpr, apr);
    CappedRelief {
        bpr,
        apr,
        capped: true,
        future_change: Some(FutureChange::ReliefCapApplied {
            cap,
            uncapped: combined,
        }),
    }
}
