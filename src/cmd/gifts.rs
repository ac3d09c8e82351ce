//! Gifts command - lifetime gift ledger with exemptions and death-time tax

use super::{format_gbp, format_percent, EstateArgs};
use clap::Args;
use ihtc::core::{ExemptionKind, GiftAssessment, LedgerEntry};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct GiftsCommand {
    #[command(flatten)]
    estate: EstateArgs,

    /// Output as CSV instead of formatted table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

/// Row for the gifts table output
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct GiftRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Gift")]
    gift_id: String,
    #[tabled(rename = "Recipient")]
    recipient: String,
    #[tabled(rename = "Type")]
    classification: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Exempt")]
    exempt: String,
    #[tabled(rename = "Chargeable")]
    chargeable: String,
    #[tabled(rename = "Years")]
    years_before: String,
    #[tabled(rename = "Taper")]
    taper_rate: String,
    #[tabled(rename = "Tax Due")]
    tax_due: String,
}

#[derive(Debug, Serialize)]
struct GiftsOutput<'a> {
    entries: &'a [LedgerEntry],
    assessments: &'a [GiftAssessment],
    exemptions_used: &'a BTreeMap<ExemptionKind, Decimal>,
    failed_pet_tax: Decimal,
    taper_relief_total: Decimal,
}

impl GiftsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let input = self.estate.read_input()?;
        let rates = self.estate.rate_table()?;
        let result = input.compute(&rates, self.estate.evaluation_date())?;

        if self.json {
            let output = GiftsOutput {
                entries: &result.ledger,
                assessments: &result.gifts,
                exemptions_used: &result.exemptions_used,
                failed_pet_tax: result.failed_pet_tax,
                taper_relief_total: result.taper_relief_total,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let rows = build_rows(&result.ledger, &result.gifts);
        if self.csv {
            self.write_csv(&rows)
        } else {
            self.print_table(&rows, &result.exemptions_used, result.failed_pet_tax);
            Ok(())
        }
    }

    fn print_table(
        &self,
        rows: &[GiftRow],
        exemptions_used: &BTreeMap<ExemptionKind, Decimal>,
        failed_pet_tax: Decimal,
    ) {
        if rows.is_empty() {
            println!("No lifetime gifts recorded");
            return;
        }

        println!();
        println!("LIFETIME GIFTS");
        println!();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);

        if !exemptions_used.is_empty() {
            println!();
            println!("Exemptions used");
            for (kind, amount) in exemptions_used {
                println!("  {:<20} {:>14}", kind.display(), format_gbp(*amount));
            }
        }
        println!();
        println!("Tax on gifts within 7 years: {}", format_gbp(failed_pet_tax));
    }

    fn write_csv(&self, rows: &[GiftRow]) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// One row per gift, with the death-time columns filled for gifts in the window
fn build_rows(ledger: &[LedgerEntry], assessments: &[GiftAssessment]) -> Vec<GiftRow> {
    let by_id: HashMap<&str, &GiftAssessment> = assessments
        .iter()
        .map(|a| (a.gift_id.as_str(), a))
        .collect();

    ledger
        .iter()
        .map(|entry| {
            let assessment = by_id.get(entry.gift_id.as_str());
            let classification = if entry.reservation_of_benefit {
                "GWR".to_string()
            } else {
                format!("{:?}", entry.classification).to_uppercase()
            };
            GiftRow {
                date: entry.date.format("%Y-%m-%d").to_string(),
                gift_id: entry.gift_id.clone(),
                recipient: entry.recipient.clone(),
                classification,
                amount: format_gbp(entry.amount),
                exempt: format_gbp(entry.exempted()),
                chargeable: format_gbp(entry.chargeable),
                years_before: assessment
                    .map_or(String::new(), |a| format!("{:.2}", a.years_before)),
                taper_rate: assessment.map_or(String::new(), |a| format_percent(a.taper_rate)),
                tax_due: assessment.map_or(String::new(), |a| format_gbp(a.tax_due)),
            }
        })
        .collect()
}
