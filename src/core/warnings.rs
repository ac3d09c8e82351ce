use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which nil-rate band a transfer claim applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Band {
    NilRate,
    ResidenceNilRate,
}

/// Non-fatal legal observations emitted during calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Asset held for less than the minimum period for relief.
    InsufficientOwnershipPeriod {
        asset_id: String,
        #[schemars(with = "f64")]
        years: Decimal,
        required_years: u32,
    },
    /// Excepted assets (not used for the business) get no BPR.
    ExceptedAsset { asset_id: String },
    /// Business asset without a qualifying relief type.
    NoQualifyingRelief { asset_id: String },
    /// CLT above the nil-rate band at the time it was made.
    CltLifetimeCharge {
        gift_id: String,
        #[schemars(with = "f64")]
        lifetime_tax: Decimal,
    },
    /// Donor kept a benefit, so the gift is treated as still in the estate.
    GiftWithReservation {
        gift_id: String,
        #[schemars(with = "f64")]
        amount: Decimal,
    },
    /// Gifts to one recipient in a tax year exceeded the small gift limit.
    SmallGiftLimitExceeded {
        gift_id: String,
        recipient: String,
        #[schemars(with = "f64")]
        total: Decimal,
    },
    /// Transferred band claims added up to more than 100%.
    TransferCapped {
        band: Band,
        #[schemars(with = "f64")]
        claimed_percent: Decimal,
    },
    /// A main residence exists but does not pass to direct descendants.
    ResidenceNotToDescendants,
    /// Non-UK domiciled: only UK situs assets should be included.
    NonUkDomicile,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InsufficientOwnershipPeriod {
                asset_id,
                years,
                required_years,
            } => write!(
                f,
                "{asset_id}: insufficient ownership period ({:.2} years, {required_years} required), no relief given",
                years
            ),
            Warning::ExceptedAsset { asset_id } => {
                write!(f, "{asset_id}: excepted asset, not eligible for business relief")
            }
            Warning::NoQualifyingRelief { asset_id } => {
                write!(f, "{asset_id}: business asset has no qualifying relief type")
            }
            Warning::CltLifetimeCharge {
                gift_id,
                lifetime_tax,
            } => write!(
                f,
                "{gift_id}: chargeable lifetime transfer exceeded the nil-rate band, lifetime tax of £{:.2} was due",
                lifetime_tax
            ),
            Warning::GiftWithReservation { gift_id, amount } => write!(
                f,
                "{gift_id}: gift with reservation of benefit, £{:.2} treated as part of the estate",
                amount
            ),
            Warning::SmallGiftLimitExceeded {
                gift_id,
                recipient,
                total,
            } => write!(
                f,
                "{gift_id}: gifts to {recipient} totalled £{:.2} in the tax year, small gift exemption void",
                total
            ),
            Warning::TransferCapped {
                band,
                claimed_percent,
            } => {
                let name = match band {
                    Band::NilRate => "nil-rate band",
                    Band::ResidenceNilRate => "residence nil-rate band",
                };
                write!(
                    f,
                    "transferred {name} claims total {claimed_percent}%, capped at 100%"
                )
            }
            Warning::ResidenceNotToDescendants => write!(
                f,
                "main residence does not pass to direct descendants, residence nil-rate band unavailable"
            ),
            Warning::NonUkDomicile => write!(
                f,
                "non-UK domiciled: only UK assets should be included in the estate"
            ),
        }
    }
}

/// Forward-dated law changes that affect, or will affect, the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum FutureChange {
    /// Combined business and agricultural relief was clamped to the cap.
    ReliefCapApplied {
        #[schemars(with = "f64")]
        cap: Decimal,
        #[schemars(with = "f64")]
        uncapped: Decimal,
    },
    /// Combined relief exceeds the cap that takes effect later.
    ReliefCapUpcoming {
        effective_from: NaiveDate,
        #[schemars(with = "f64")]
        cap: Decimal,
        #[schemars(with = "f64")]
        combined_relief: Decimal,
    },
    /// Pension funds were included in the estate.
    PensionsIncluded {
        #[schemars(with = "f64")]
        value: Decimal,
    },
    /// Pension funds will be included in the estate from a later date.
    PensionsIncludedFrom {
        effective_from: NaiveDate,
        #[schemars(with = "f64")]
        value: Decimal,
    },
}

impl fmt::Display for FutureChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FutureChange::ReliefCapApplied { cap, uncapped } => write!(
                f,
                "business and agricultural relief of £{:.2} capped at £{:.2}",
                uncapped, cap
            ),
            FutureChange::ReliefCapUpcoming {
                effective_from,
                cap,
                combined_relief,
            } => write!(
                f,
                "from {effective_from} business and agricultural relief of £{:.2} will be capped at £{:.2}",
                combined_relief, cap
            ),
            FutureChange::PensionsIncluded { value } => {
                write!(f, "unused pension funds of £{:.2} included in the estate", value)
            }
            FutureChange::PensionsIncludedFrom {
                effective_from,
                value,
            } => write!(
                f,
                "from {effective_from} unused pension funds of £{:.2} will be included in the estate",
                value
            ),
        }
    }
}
