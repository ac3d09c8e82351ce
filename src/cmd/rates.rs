//! Rates command - show the rate table in use

use super::{format_gbp, format_percent, read_rates};
use clap::Args;
use ihtc::core::{RateTable, TaxYear};
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct RatesCommand {
    /// JSON rate table to show instead of the built-in UK rates
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Tax year to show (e.g., 2025 for 2024/25)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output the table as JSON, usable as a --rates file
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Tabled)]
struct RateRow {
    #[tabled(rename = "Tax Year")]
    tax_year: String,
    #[tabled(rename = "NRB")]
    nil_rate_band: String,
    #[tabled(rename = "RNRB")]
    residence_nil_rate_band: String,
    #[tabled(rename = "Taper From")]
    taper_threshold: String,
    #[tabled(rename = "Rate")]
    standard_rate: String,
    #[tabled(rename = "Charity")]
    charity_rate: String,
    #[tabled(rename = "Lifetime")]
    lifetime_rate: String,
    #[tabled(rename = "Annual")]
    annual_exemption: String,
}

impl RatesCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let table = read_rates(self.rates.as_deref())?;
        let year = self.year.map(TaxYear);
        if let Some(year) = year {
            // fail early on a year the table does not cover
            table.rates(year)?;
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&table)?);
        } else {
            print_table(&table, year);
        }
        Ok(())
    }
}

fn print_table(table: &RateTable, year: Option<TaxYear>) {
    let rows: Vec<RateRow> = table
        .years
        .iter()
        .filter(|r| year.is_none_or(|y| r.tax_year == y))
        .map(|r| RateRow {
            tax_year: r.tax_year.display(),
            nil_rate_band: format_gbp(r.nil_rate_band),
            residence_nil_rate_band: format_gbp(r.residence_nil_rate_band),
            taper_threshold: format_gbp(r.rnrb_taper_threshold),
            standard_rate: format_percent(r.standard_rate),
            charity_rate: format_percent(r.charity_rate),
            lifetime_rate: format_percent(r.lifetime_rate),
            annual_exemption: format_gbp(r.annual_exemption),
        })
        .collect();

    println!();
    println!("IHT RATES");
    println!();
    let rendered = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", rendered);
    println!();
    println!(
        "Relief cap {} from {}",
        format_gbp(table.forward.relief_cap),
        table.forward.relief_cap_from
    );
    println!(
        "Pensions in estate from {}",
        table.forward.pensions_in_estate_from
    );
    println!(
        "Excepted estate: gross limit {}, foreign assets limit {}",
        format_gbp(table.excepted_estate.exempt_estate_gross_limit),
        format_gbp(table.excepted_estate.foreign_assets_limit)
    );
    println!();
}
