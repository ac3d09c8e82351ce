use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
    CivilPartnership,
    Divorced,
    Widowed,
}

/// The computation unit
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Estate {
    /// Declared value of all assets other than pension funds
    #[schemars(with = "f64")]
    pub gross_value: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub liabilities: Decimal,
    #[serde(default)]
    pub marital_status: MaritalStatus,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub residence_value: Decimal,
    #[serde(default)]
    pub leaves_residence_to_descendants: bool,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub charitable_legacy: Decimal,
    /// Percentage of a spouse's unused nil-rate band claimed directly (0-100)
    #[serde(default)]
    #[schemars(with = "f64")]
    pub transferred_nrb_percent: Decimal,
    /// Percentage of a spouse's unused residence nil-rate band claimed directly (0-100)
    #[serde(default)]
    #[schemars(with = "f64")]
    pub transferred_rnrb_percent: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub foreign_assets: Decimal,
    #[serde(default = "default_true")]
    pub uk_domiciled: bool,
}

fn default_true() -> bool {
    true
}

impl Estate {
    pub fn new(gross_value: Decimal) -> Self {
        Estate {
            gross_value,
            uk_domiciled: true,
            ..Default::default()
        }
    }
}

/// Relief tag for business property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum BusinessReliefType {
    #[default]
    None,
    UnquotedShares,
    Aim,
    QuotedControlling,
    BusinessAssets,
}

/// How agricultural property has been held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum AgriculturalOccupation {
    #[default]
    OwnerOccupied,
    Let,
}

/// Asset category with the fields that matter for relief
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "category")]
pub enum AssetCategory {
    Property {
        #[serde(default)]
        main_residence: bool,
    },
    Business {
        #[serde(default)]
        relief: BusinessReliefType,
        #[serde(default)]
        excepted: bool,
    },
    Agricultural {
        #[serde(default)]
        occupation: AgriculturalOccupation,
    },
    Investment,
    Personal,
    Pension,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Asset {
    pub id: String,
    #[serde(flatten)]
    pub category: AssetCategory,
    #[schemars(with = "f64")]
    pub value: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub ownership_years: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

impl Asset {
    pub fn is_pension(&self) -> bool {
        matches!(self.category, AssetCategory::Pension)
    }

    pub fn is_main_residence(&self) -> bool {
        matches!(
            self.category,
            AssetCategory::Property {
                main_residence: true
            }
        )
    }
}

/// Classification of a lifetime gift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum GiftClassification {
    /// Potentially exempt transfer
    #[default]
    Pet,
    /// Chargeable lifetime transfer (gifts into trust)
    Clt,
    /// Spouse or charity gift, wholly exempt
    Exempt,
}

/// Exemptions that can be claimed against a lifetime gift
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum ExemptionKind {
    Annual,
    SmallGift,
    Wedding,
    NormalExpenditure,
    SpouseOrCharity,
}

impl ExemptionKind {
    pub fn display(&self) -> &'static str {
        match self {
            ExemptionKind::Annual => "Annual",
            ExemptionKind::SmallGift => "Small Gift",
            ExemptionKind::Wedding => "Wedding",
            ExemptionKind::NormalExpenditure => "Normal Expenditure",
            ExemptionKind::SpouseOrCharity => "Spouse/Charity",
        }
    }
}

impl std::fmt::Display for ExemptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExemptionClaim {
    pub kind: ExemptionKind,
    /// Explicit amount claimed. When absent the exemption covers as much as it can.
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub amount: Option<Decimal>,
}

impl ExemptionClaim {
    pub fn full(kind: ExemptionKind) -> Self {
        ExemptionClaim { kind, amount: None }
    }
}

/// A historical lifetime gift
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Gift {
    pub id: String,
    pub date: NaiveDate,
    #[schemars(with = "f64")]
    pub amount: Decimal,
    pub recipient: String,
    /// Donor's relationship to the recipient (e.g. "parent", "grandparent")
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub classification: GiftClassification,
    #[serde(default)]
    pub to_trust: bool,
    #[serde(default)]
    pub exemptions: Vec<ExemptionClaim>,
    #[serde(default)]
    pub reservation_of_benefit: bool,
}

impl Gift {
    pub fn claims(&self, kind: ExemptionKind) -> Option<&ExemptionClaim> {
        self.exemptions.iter().find(|c| c.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Distribution {
    pub date: NaiveDate,
    #[schemars(with = "f64")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Valuation {
    pub date: NaiveDate,
    #[schemars(with = "f64")]
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Trust {
    pub id: String,
    pub created: NaiveDate,
    /// Value settled at creation
    #[schemars(with = "f64")]
    pub value: Decimal,
    #[serde(default = "default_true")]
    pub relevant_property: bool,
    #[serde(default)]
    pub beneficiaries: Vec<String>,
    /// Settlor's chargeable transfers in the 7 years before creation
    #[serde(default)]
    #[schemars(with = "f64")]
    pub settlor_cumulative_clts: Decimal,
    /// Values at ten-year anniversaries, where known
    #[serde(default)]
    pub valuations: Vec<Valuation>,
    #[serde(default)]
    pub distributions: Vec<Distribution>,
}

/// A predeceased spouse or civil partner
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MarriageRecord {
    pub spouse: String,
    pub date_of_death: NaiveDate,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub nil_rate_band_at_death: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub rnrb_at_death: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub unused_nrb_percent: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub unused_rnrb_percent: Decimal,
}

/// Input root: an estate with everything it owns
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EstateInput {
    pub estate: Estate,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub gifts: Vec<Gift>,
    #[serde(default)]
    pub trusts: Vec<Trust>,
    #[serde(default)]
    pub marriages: Vec<MarriageRecord>,
}

/// Read an estate record from JSON
pub fn read_estate_json<R: std::io::Read>(reader: R) -> anyhow::Result<EstateInput> {
    let input: EstateInput = serde_json::from_reader(reader)?;
    Ok(input)
}
