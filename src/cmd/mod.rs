pub mod calculate;
pub mod gifts;
pub mod rates;
pub mod schema;
pub mod trusts;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Args;
use ihtc::core::{read_estate_json, EstateInput, RateTable};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Arguments shared by every command that evaluates an estate
#[derive(Args, Debug)]
pub struct EstateArgs {
    /// Estate JSON file. Reads from stdin if not specified.
    #[arg(default_value = "-")]
    pub file: PathBuf,

    /// Evaluation date, normally the date of death (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// JSON rate table to use instead of the built-in UK rates
    #[arg(long)]
    pub rates: Option<PathBuf>,
}

impl EstateArgs {
    pub fn evaluation_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn rate_table(&self) -> anyhow::Result<RateTable> {
        read_rates(self.rates.as_deref())
    }

    pub fn read_input(&self) -> anyhow::Result<EstateInput> {
        read_input(&self.file)
    }
}

/// Read an estate record (JSON) from a file, or stdin with "-"
pub fn read_input(path: &Path) -> anyhow::Result<EstateInput> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        read_estate_json(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))
    }
}

fn read_from_stdin() -> anyhow::Result<EstateInput> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    read_estate_json(io::Cursor::new(buffer))
}

/// Built-in UK rates, or a table loaded from JSON
pub fn read_rates(path: Option<&Path>) -> anyhow::Result<RateTable> {
    match path {
        None => Ok(RateTable::uk()),
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            let table: RateTable = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("parsing rate table {}", path.display()))?;
            log::info!("Loaded {} tax years from {}", table.years.len(), path.display());
            Ok(table)
        }
    }
}

pub fn format_gbp(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-£{:.2}", amount.abs())
    } else {
        format!("£{:.2}", amount)
    }
}

/// Fraction as a percentage, e.g. 0.36 -> "36.00%"
pub fn format_percent(fraction: Decimal) -> String {
    format!("{:.2}%", fraction * Decimal::ONE_HUNDRED)
}
