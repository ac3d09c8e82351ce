use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser, Debug)]
#[command(name = "ihtc", version, about = "UK Inheritance Tax calculator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the inheritance tax due on an estate
    Calculate(cmd::calculate::CalculateCommand),
    /// Lifetime gifts with exemptions, taper relief and tax
    Gifts(cmd::gifts::GiftsCommand),
    /// Entry, ten-year and exit charges on trusts
    Trusts(cmd::trusts::TrustsCommand),
    /// Print the JSON schema of the input
    Schema(cmd::schema::SchemaCommand),
    /// Show the rate table
    Rates(cmd::rates::RatesCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Calculate(c) => c.exec(),
        Command::Gifts(c) => c.exec(),
        Command::Trusts(c) => c.exec(),
        Command::Schema(c) => c.exec(),
        Command::Rates(c) => c.exec(),
    }
}
