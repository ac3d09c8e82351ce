pub mod charity;
pub mod error;
pub mod estate;
pub mod forms;
pub mod gifts;
pub mod liability;
pub mod relief;
pub mod rnrb;
pub mod taper;
pub mod trust;
pub mod uk;
pub mod validate;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use charity::{qualify_charity_rate, CharityRate};
pub use error::IhtError;
pub use estate::{
    read_estate_json, AgriculturalOccupation, Asset, AssetCategory, BusinessReliefType,
    Distribution, Estate, EstateInput, ExemptionClaim, ExemptionKind, Gift, GiftClassification,
    MaritalStatus, MarriageRecord, Trust, Valuation,
};
pub use forms::{check_excepted_estate, FormRecommendation, ReturnForm};
pub use gifts::{
    build_ledger, validate_gift_exemption, ExemptionOption, ExemptionTracker, GiftLedger,
    LedgerEntry,
};
pub use liability::{compute_iht, GiftAssessment, IhtResult, NilRateBand};
pub use relief::{apply_relief_cap, calculate_reliefs, AssetRelief, ReliefKind, ReliefReport};
pub use rnrb::{calculate_rnrb, ResidenceBand};
pub use taper::{calculate_taper_relief, taper_rate, TaperRelief};
pub use trust::{
    calculate_entry_charge, calculate_exit_charge, calculate_ten_year_charge,
    trust_charge_history, TrustCharge, TrustChargeKind, TrustHistory,
};
pub use uk::{RateTable, TaxYear, YearRates};
pub use warnings::{FutureChange, Warning};
