//! Trusts command - entry, ten-year and exit charges per trust

use super::{format_gbp, format_percent, EstateArgs};
use clap::Args;
use ihtc::core::{trust_charge_history, TrustHistory};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct TrustsCommand {
    #[command(flatten)]
    estate: EstateArgs,

    /// Only show this trust
    #[arg(short, long)]
    trust: Option<String>,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Tabled)]
struct ChargeRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Charge")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Tax")]
    tax: String,
    #[tabled(rename = "Cumulative")]
    cumulative: String,
}

impl TrustsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let input = self.estate.read_input()?;
        let rates = self.estate.rate_table()?;
        let evaluation_date = self.estate.evaluation_date();

        for trust in &input.trusts {
            ihtc::core::validate::validate_trust(trust)?;
        }
        let histories = input
            .trusts
            .iter()
            .filter(|t| self.trust.as_deref().is_none_or(|id| t.id == id))
            .map(|t| trust_charge_history(t, &rates, evaluation_date))
            .collect::<Result<Vec<_>, _>>()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&histories)?);
        } else {
            print_histories(&histories);
        }
        Ok(())
    }
}

fn print_histories(histories: &[TrustHistory]) {
    if histories.is_empty() {
        println!("No trusts found");
        return;
    }

    for history in histories {
        println!();
        println!("TRUST {}", history.trust_id);
        println!();

        if history.charges.is_empty() {
            println!("  (not a relevant property trust, no charges)");
            continue;
        }

        let rows: Vec<ChargeRow> = history
            .charges
            .iter()
            .map(|c| ChargeRow {
                date: c.date.format("%Y-%m-%d").to_string(),
                kind: c.kind.display().to_string(),
                value: format_gbp(c.chargeable_value),
                rate: format_percent(c.rate),
                tax: format_gbp(c.tax_due),
                cumulative: format_gbp(c.cumulative_tax),
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!(
            "  Current value {}, exit rate basis {}",
            format_gbp(history.current_value),
            format_percent(history.last_rate)
        );
        if let Some(next) = history.next_anniversary {
            println!("  Next ten-year anniversary {}", next.format("%Y-%m-%d"));
        }
    }
    println!();
}
