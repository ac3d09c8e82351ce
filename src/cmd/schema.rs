//! Schema command - print expected input formats

use clap::Args;
use ihtc::core::{EstateInput, RateTable};
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Which document to describe
    #[arg(value_enum, default_value = "estate")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the estate input
    Estate,
    /// JSON Schema for a rate table passed with --rates
    Rates,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let schema = match self.format {
            SchemaFormat::Estate => schema_for!(EstateInput),
            SchemaFormat::Rates => schema_for!(RateTable),
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
