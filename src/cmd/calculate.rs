//! Calculate command - full liability for an estate

use super::{format_gbp, format_percent, EstateArgs};
use clap::Args;
use ihtc::core::IhtResult;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct CalculateCommand {
    #[command(flatten)]
    estate: EstateArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl CalculateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let input = self.estate.read_input()?;
        let rates = self.estate.rate_table()?;
        let result = input.compute(&rates, self.estate.evaluation_date())?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_summary(&result);
        }
        Ok(())
    }
}

fn line(label: &str, value: String) {
    println!("  {:<32} {:>18}", label, value);
}

fn print_summary(result: &IhtResult) {
    println!();
    println!(
        "INHERITANCE TAX ({}, tax year {})",
        result.evaluation_date.format("%Y-%m-%d"),
        result.tax_year
    );
    println!();

    println!("Estate");
    line("Total estate", format_gbp(result.total_estate_value));
    if !result.pensions_included.is_zero() {
        line("  of which pensions", format_gbp(result.pensions_included));
    }
    if !result.reserved_gifts.is_zero() {
        line("  of which reserved gifts", format_gbp(result.reserved_gifts));
    }
    line("Liabilities", format_gbp(result.liabilities));
    line("Net estate", format_gbp(result.net_estate));
    println!();

    let nrb = &result.nil_rate_band;
    let rnrb = &result.residence_nil_rate_band;
    println!("Allowances");
    line("Nil-rate band", format_gbp(nrb.own));
    if !nrb.transferred.is_zero() {
        line(
            &format!("Transferred NRB ({}%)", nrb.transferred_percent),
            format_gbp(nrb.transferred),
        );
    }
    if !nrb.used_by_gifts.is_zero() {
        line("Used by lifetime gifts", format_gbp(-nrb.used_by_gifts));
    }
    line("Nil-rate band available", format_gbp(nrb.available));
    line("Residence nil-rate band", format_gbp(rnrb.band.total));
    if !rnrb.band.taper.is_zero() {
        line("  after taper of", format_gbp(rnrb.band.taper));
    }
    if !result.bpr.is_zero() {
        line("Business relief", format_gbp(result.bpr));
    }
    if !result.apr.is_zero() {
        line("Agricultural relief", format_gbp(result.apr));
    }
    if !result.charitable_legacy.is_zero() {
        line("Charitable legacy", format_gbp(result.charitable_legacy));
    }
    println!();

    println!("Tax");
    line("Taxable estate", format_gbp(result.taxable_estate));
    let rate_label = if result.charity.qualifies {
        "Rate (charity)"
    } else {
        "Rate"
    };
    line(rate_label, format_percent(result.charity.rate));
    line("Estate tax", format_gbp(result.estate_tax));
    if !result.gifts.is_empty() {
        line(
            &format!("Gift tax ({} gifts)", result.gifts.len()),
            format_gbp(result.failed_pet_tax),
        );
        if result.taper_relief_total > Decimal::ZERO {
            line("  after taper relief of", format_gbp(result.taper_relief_total));
        }
    }
    line("TOTAL IHT DUE", format_gbp(result.tax_due));
    line("Effective rate", format_percent(result.effective_rate));
    if !result.trusts.is_empty() {
        line("Trust charges to date", format_gbp(result.trust_tax_total));
    }
    println!();

    println!("Return: {}", result.form.form.display());
    for reason in &result.form.reasons {
        println!("  - {}", reason);
    }

    if !result.warnings.is_empty() {
        println!();
        println!("Warnings");
        for warning in &result.warnings {
            println!("  ! {}", warning);
        }
    }

    if !result.future_changes.is_empty() {
        println!();
        println!("Rule changes");
        for change in &result.future_changes {
            println!("  * {}", change);
        }
    }
    println!();
}
