use super::estate::ExemptionKind;
use super::uk::TaxYear;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Fatal errors. Any of these aborts the whole computation; no partial
/// result is ever returned.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum IhtError {
    #[error("no rates available for tax year {0}")]
    UnknownTaxYear(TaxYear),
    #[error("gift {gift_id}: classification does not match trust flag (CLT if and only if made to a trust)")]
    InvalidGiftClassification { gift_id: String },
    #[error("gift {gift_id}: claimed exemptions of {claimed} exceed the gift amount of {amount}")]
    ExemptionOverclaim {
        gift_id: String,
        claimed: Decimal,
        amount: Decimal,
    },
    #[error("gift {gift_id}: {kind} exemption claimed more than once")]
    DuplicateExemptionClaim { gift_id: String, kind: ExemptionKind },
    #[error("trust {trust_id}: distribution of {amount} on {date} exceeds the {available} left")]
    DistributionExceedsTrustValue {
        trust_id: String,
        date: NaiveDate,
        amount: Decimal,
        available: Decimal,
    },
    #[error("{record}: {field} must not be negative")]
    NegativeAmount { record: String, field: &'static str },
    #[error("{record}: {field} must be between 0 and 100, got {value}")]
    PercentOutOfRange {
        record: String,
        field: &'static str,
        value: Decimal,
    },
}
