//! Gift exemption ledger
//!
//! Allocates the annual, small gift, wedding and normal expenditure
//! exemptions against lifetime gifts in date order and classifies whatever
//! remains as a PET or CLT.

use super::error::IhtError;
use super::estate::{ExemptionKind, Gift, GiftClassification};
use super::uk::{RateTable, TaxYear, WeddingCaps, YearRates};
use super::validate::validate_gift;
use super::warnings::Warning;
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Wedding exemption tier, from the donor's relationship to the couple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WeddingTier {
    Parent,
    Grandparent,
    Other,
}

impl WeddingTier {
    /// Match by substring. "grandparent" contains "parent", so it must be
    /// checked first.
    pub fn from_relationship(relationship: &str) -> Self {
        let relationship = relationship.to_lowercase();
        if relationship.contains("grandparent") {
            WeddingTier::Grandparent
        } else if relationship.contains("parent") {
            WeddingTier::Parent
        } else {
            WeddingTier::Other
        }
    }

    pub fn cap(&self, caps: &WeddingCaps) -> Decimal {
        match self {
            WeddingTier::Parent => caps.parent,
            WeddingTier::Grandparent => caps.grandparent,
            WeddingTier::Other => caps.other,
        }
    }
}

/// Annual exemption taken by one gift
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnnualAllocation {
    pub current_year: Decimal,
    pub brought_forward: Decimal,
}

impl AnnualAllocation {
    pub fn total(&self) -> Decimal {
        self.current_year + self.brought_forward
    }
}

fn recipient_key(recipient: &str) -> String {
    recipient.trim().to_lowercase()
}

/// Running record of exemptions consumed by an estate's gifts
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExemptionTracker {
    /// How much of each tax year's own annual allowance has been used, either
    /// in that year or carried forward into the next
    annual_used: BTreeMap<TaxYear, Decimal>,
    /// Total given to each recipient per tax year
    #[serde(skip)]
    given_to_recipient: HashMap<(TaxYear, String), Decimal>,
    /// Wedding exemption already given per recipient
    #[serde(skip)]
    wedding_given: HashMap<String, Decimal>,
    usage: BTreeMap<ExemptionKind, Decimal>,
}

impl ExemptionTracker {
    pub fn new() -> Self {
        ExemptionTracker::default()
    }

    fn used(&self, year: TaxYear) -> Decimal {
        self.annual_used
            .get(&year)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Unused allowance of `year` itself and of the year before it
    pub fn annual_remaining(&self, year: TaxYear, allowance: Decimal) -> (Decimal, Decimal) {
        let current = (allowance - self.used(year)).max(Decimal::ZERO);
        let previous = (allowance - self.used(year.previous())).max(Decimal::ZERO);
        (current, previous)
    }

    /// Take up to `amount` of annual exemption for a gift made in `year`.
    ///
    /// The current year's allowance is always used before the single year
    /// brought forward; older years are never available.
    pub fn allocate_annual(
        &mut self,
        year: TaxYear,
        allowance: Decimal,
        amount: Decimal,
    ) -> AnnualAllocation {
        let (current, previous) = self.annual_remaining(year, allowance);
        let current_year = amount.min(current);
        let brought_forward = (amount - current_year).min(previous);

        *self.annual_used.entry(year).or_insert(Decimal::ZERO) += current_year;
        *self
            .annual_used
            .entry(year.previous())
            .or_insert(Decimal::ZERO) += brought_forward;

        let allocation = AnnualAllocation {
            current_year,
            brought_forward,
        };
        self.record(ExemptionKind::Annual, allocation.total());
        allocation
    }

    pub fn given_to(&self, year: TaxYear, recipient: &str) -> Decimal {
        self.given_to_recipient
            .get(&(year, recipient_key(recipient)))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    fn record(&mut self, kind: ExemptionKind, amount: Decimal) {
        if amount > Decimal::ZERO {
            *self.usage.entry(kind).or_insert(Decimal::ZERO) += amount;
        }
    }

    /// Total exemption used per kind
    pub fn usage(&self) -> &BTreeMap<ExemptionKind, Decimal> {
        &self.usage
    }
}

/// Exemption applied to a single gift
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedExemption {
    pub kind: ExemptionKind,
    pub amount: Decimal,
}

/// A gift after exemptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub gift_id: String,
    pub date: NaiveDate,
    pub tax_year: TaxYear,
    pub recipient: String,
    pub amount: Decimal,
    pub classification: GiftClassification,
    pub exemptions: Vec<AppliedExemption>,
    /// Annual exemption split between this year and the year brought forward
    pub annual: AnnualAllocation,
    /// Amount left after exemptions
    pub chargeable: Decimal,
    /// Gifts with reservation are treated as still part of the estate
    pub reservation_of_benefit: bool,
}

impl LedgerEntry {
    pub fn exempted(&self) -> Decimal {
        self.exemptions.iter().map(|e| e.amount).sum()
    }

    /// Whether this entry still counts towards liability
    pub fn is_chargeable(&self) -> bool {
        !self.reservation_of_benefit && self.chargeable > Decimal::ZERO
    }
}

/// All gifts of an estate, in date order, with the tracker that produced them
#[derive(Debug, Clone, Default, Serialize)]
pub struct GiftLedger {
    pub entries: Vec<LedgerEntry>,
    pub tracker: ExemptionTracker,
    pub warnings: Vec<Warning>,
}

impl GiftLedger {
    pub fn usage(&self) -> &BTreeMap<ExemptionKind, Decimal> {
        self.tracker.usage()
    }

    pub fn chargeable(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(|e| e.is_chargeable())
    }

    /// Value of gifts with reservation of benefit
    pub fn reserved_total(&self) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.reservation_of_benefit)
            .map(|e| e.amount)
            .sum()
    }
}

/// Years before the evaluation date a gift can still affect the result: the
/// 7-year window, the 7-year CLT cumulation behind it and one year of annual
/// exemption brought forward.
const LOOKBACK_YEARS: u32 = 15;

/// Run every relevant gift through the exemptions, oldest first.
///
/// Gifts are sorted by date (stable, so same-day gifts keep their input
/// order). Entries whose residue is zero stay in the ledger. Gifts made after
/// `evaluation_date`, or too long before it to affect any figure, are left
/// out without a rate lookup. Gifts with reservation are kept whatever their
/// age since they remain part of the estate.
pub fn build_ledger(
    gifts: &[Gift],
    rates: &RateTable,
    evaluation_date: NaiveDate,
) -> Result<GiftLedger, IhtError> {
    let cutoff = evaluation_date
        .checked_sub_months(Months::new(12 * LOOKBACK_YEARS))
        .unwrap_or(NaiveDate::MIN);

    let mut sorted: Vec<&Gift> = gifts.iter().collect();
    sorted.sort_by_key(|g| g.date);

    let mut ledger = GiftLedger::default();

    // Small gift limit applies to everything given to a recipient in the year
    for gift in sorted.iter().filter(|g| !g.reservation_of_benefit) {
        let key = (TaxYear::from_date(gift.date), recipient_key(&gift.recipient));
        *ledger
            .tracker
            .given_to_recipient
            .entry(key)
            .or_insert(Decimal::ZERO) += gift.amount;
    }

    for gift in sorted {
        validate_gift(gift)?;
        if gift.date > evaluation_date {
            log::debug!("Gift {} on {} is after the evaluation date", gift.id, gift.date);
            continue;
        }
        let entry = if gift.reservation_of_benefit {
            reserved_entry(gift, &mut ledger.warnings)
        } else if gift.date < cutoff {
            log::debug!("Gift {} on {} is too old to count", gift.id, gift.date);
            continue;
        } else {
            let year_rates = rates.rates_on(gift.date)?;
            assess_gift(gift, year_rates, &mut ledger.tracker, &mut ledger.warnings)
        };
        log::debug!(
            "Gift {} on {}: amount={}, exempt={}, chargeable={} ({:?})",
            entry.gift_id,
            entry.date,
            entry.amount,
            entry.exempted(),
            entry.chargeable,
            entry.classification
        );
        ledger.entries.push(entry);
    }

    Ok(ledger)
}

fn new_entry(gift: &Gift, tax_year: TaxYear) -> LedgerEntry {
    LedgerEntry {
        gift_id: gift.id.clone(),
        date: gift.date,
        tax_year,
        recipient: gift.recipient.clone(),
        amount: gift.amount,
        classification: gift.classification,
        exemptions: Vec::new(),
        annual: AnnualAllocation::default(),
        chargeable: Decimal::ZERO,
        reservation_of_benefit: gift.reservation_of_benefit,
    }
}

fn reserved_entry(gift: &Gift, warnings: &mut Vec<Warning>) -> LedgerEntry {
    warnings.push(Warning::GiftWithReservation {
        gift_id: gift.id.clone(),
        amount: gift.amount,
    });
    new_entry(gift, TaxYear::from_date(gift.date))
}

fn assess_gift(
    gift: &Gift,
    rates: &YearRates,
    tracker: &mut ExemptionTracker,
    warnings: &mut Vec<Warning>,
) -> LedgerEntry {
    let tax_year = rates.tax_year;
    let mut entry = new_entry(gift, tax_year);

    if gift.classification == GiftClassification::Exempt {
        tracker.record(ExemptionKind::SpouseOrCharity, gift.amount);
        entry.exemptions.push(AppliedExemption {
            kind: ExemptionKind::SpouseOrCharity,
            amount: gift.amount,
        });
        return entry;
    }

    let mut remaining = gift.amount;

    // (a) annual
    if let Some(claim) = gift.claims(ExemptionKind::Annual) {
        let wanted = claim.amount.unwrap_or(remaining).min(remaining);
        let allocation = tracker.allocate_annual(tax_year, rates.annual_exemption, wanted);
        entry.annual = allocation;
        apply(&mut entry, &mut remaining, ExemptionKind::Annual, allocation.total());
    }

    // (b) small gift, all or nothing
    if gift.claims(ExemptionKind::SmallGift).is_some() {
        let given = tracker.given_to(tax_year, &gift.recipient);
        if gift.amount <= rates.small_gift_limit && given <= rates.small_gift_limit {
            let amount = remaining;
            tracker.record(ExemptionKind::SmallGift, amount);
            apply(&mut entry, &mut remaining, ExemptionKind::SmallGift, amount);
        } else {
            warnings.push(Warning::SmallGiftLimitExceeded {
                gift_id: gift.id.clone(),
                recipient: gift.recipient.clone(),
                total: given.max(gift.amount),
            });
        }
    }

    // (c) wedding, capped by tier per recipient
    if let Some(claim) = gift.claims(ExemptionKind::Wedding) {
        let tier = WeddingTier::from_relationship(&gift.relationship);
        let key = recipient_key(&gift.recipient);
        let already = tracker
            .wedding_given
            .get(&key)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let available = (tier.cap(&rates.wedding_caps) - already).max(Decimal::ZERO);
        let amount = claim.amount.unwrap_or(remaining).min(remaining).min(available);
        if amount > Decimal::ZERO {
            *tracker.wedding_given.entry(key).or_insert(Decimal::ZERO) += amount;
            tracker.record(ExemptionKind::Wedding, amount);
        }
        apply(&mut entry, &mut remaining, ExemptionKind::Wedding, amount);
    }

    // normal expenditure out of income
    if let Some(claim) = gift.claims(ExemptionKind::NormalExpenditure) {
        let amount = claim.amount.unwrap_or(remaining).min(remaining);
        tracker.record(ExemptionKind::NormalExpenditure, amount);
        apply(&mut entry, &mut remaining, ExemptionKind::NormalExpenditure, amount);
    }

    // (d) residue
    entry.chargeable = remaining.max(Decimal::ZERO);
    entry
}

fn apply(entry: &mut LedgerEntry, remaining: &mut Decimal, kind: ExemptionKind, amount: Decimal) {
    if amount > Decimal::ZERO {
        *remaining -= amount;
        entry.exemptions.push(AppliedExemption { kind, amount });
    }
}

/// An exemption a gift could use, and how much of the gift it could cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExemptionOption {
    pub kind: ExemptionKind,
    pub max_amount: Decimal,
}

/// Exemptions available to a gift given the donor's remaining annual allowance.
pub fn validate_gift_exemption(
    gift: &Gift,
    remaining_annual_exemption: Decimal,
    rates: &YearRates,
) -> Vec<ExemptionOption> {
    if gift.classification == GiftClassification::Exempt {
        return vec![ExemptionOption {
            kind: ExemptionKind::SpouseOrCharity,
            max_amount: gift.amount,
        }];
    }

    let mut options = Vec::new();
    if remaining_annual_exemption > Decimal::ZERO {
        options.push(ExemptionOption {
            kind: ExemptionKind::Annual,
            max_amount: gift.amount.min(remaining_annual_exemption),
        });
    }
    if gift.amount <= rates.small_gift_limit {
        options.push(ExemptionOption {
            kind: ExemptionKind::SmallGift,
            max_amount: gift.amount,
        });
    }
    let tier = WeddingTier::from_relationship(&gift.relationship);
    options.push(ExemptionOption {
        kind: ExemptionKind::Wedding,
        max_amount: gift.amount.min(tier.cap(&rates.wedding_caps)),
    });
    options.push(ExemptionOption {
        kind: ExemptionKind::NormalExpenditure,
        max_amount: gift.amount,
    });
    options
}
