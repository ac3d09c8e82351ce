//! Boundary checks run before any figure is computed.

use super::error::IhtError;
use super::estate::{Asset, Estate, Gift, GiftClassification, MarriageRecord, Trust};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;

fn non_negative(record: &str, field: &'static str, value: Decimal) -> Result<(), IhtError> {
    if value < Decimal::ZERO {
        return Err(IhtError::NegativeAmount {
            record: record.to_string(),
            field,
        });
    }
    Ok(())
}

fn percent(record: &str, field: &'static str, value: Decimal) -> Result<(), IhtError> {
    if value < Decimal::ZERO || value > dec!(100) {
        return Err(IhtError::PercentOutOfRange {
            record: record.to_string(),
            field,
            value,
        });
    }
    Ok(())
}

pub fn validate_estate(estate: &Estate) -> Result<(), IhtError> {
    let record = "estate";
    non_negative(record, "gross_value", estate.gross_value)?;
    non_negative(record, "liabilities", estate.liabilities)?;
    non_negative(record, "residence_value", estate.residence_value)?;
    non_negative(record, "charitable_legacy", estate.charitable_legacy)?;
    non_negative(record, "foreign_assets", estate.foreign_assets)?;
    percent(record, "transferred_nrb_percent", estate.transferred_nrb_percent)?;
    percent(record, "transferred_rnrb_percent", estate.transferred_rnrb_percent)?;
    Ok(())
}

pub fn validate_asset(asset: &Asset) -> Result<(), IhtError> {
    non_negative(&asset.id, "value", asset.value)?;
    non_negative(&asset.id, "ownership_years", asset.ownership_years)
}

/// Classification must agree with the trust flag, each exemption may be
/// claimed once, and explicit exemption amounts must fit inside the gift.
pub fn validate_gift(gift: &Gift) -> Result<(), IhtError> {
    non_negative(&gift.id, "amount", gift.amount)?;

    let is_clt = gift.classification == GiftClassification::Clt;
    if is_clt != gift.to_trust {
        return Err(IhtError::InvalidGiftClassification {
            gift_id: gift.id.clone(),
        });
    }

    let mut kinds = BTreeSet::new();
    let mut claimed = Decimal::ZERO;
    for claim in &gift.exemptions {
        if !kinds.insert(claim.kind) {
            return Err(IhtError::DuplicateExemptionClaim {
                gift_id: gift.id.clone(),
                kind: claim.kind,
            });
        }
        if let Some(amount) = claim.amount {
            non_negative(&gift.id, "exemption amount", amount)?;
            claimed += amount;
        }
    }
    if claimed > gift.amount {
        return Err(IhtError::ExemptionOverclaim {
            gift_id: gift.id.clone(),
            claimed,
            amount: gift.amount,
        });
    }
    Ok(())
}

pub fn validate_trust(trust: &Trust) -> Result<(), IhtError> {
    non_negative(&trust.id, "value", trust.value)?;
    non_negative(&trust.id, "settlor_cumulative_clts", trust.settlor_cumulative_clts)?;
    for distribution in &trust.distributions {
        non_negative(&trust.id, "distribution amount", distribution.amount)?;
    }
    for valuation in &trust.valuations {
        non_negative(&trust.id, "valuation", valuation.value)?;
    }
    Ok(())
}

pub fn validate_marriage(record: &MarriageRecord) -> Result<(), IhtError> {
    let id = &record.spouse;
    non_negative(id, "nil_rate_band_at_death", record.nil_rate_band_at_death)?;
    non_negative(id, "rnrb_at_death", record.rnrb_at_death)?;
    percent(id, "unused_nrb_percent", record.unused_nrb_percent)?;
    percent(id, "unused_rnrb_percent", record.unused_rnrb_percent)
}
