mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::scenarios::ScenarioArgs;
use commands::underwriting::{AmortizationArgs, CashFlowArgs, UnderwriteArgs};

/// Real-estate acquisition underwriting
#[derive(Parser)]
#[command(
    name = "uw",
    version,
    about = "Real-estate acquisition underwriting",
    long_about = "Underwrite a property acquisition from a JSON deal file or piped stdin: \
                  annual cash-flow projection, levered and unlevered returns, a go/no-go \
                  recommendation, price/exit-cap sensitivity grids and driver tornados. \
                  All arithmetic uses decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Underwrite a deal: metrics, recommendation and warnings
    Underwrite(UnderwriteArgs),
    /// Export the annual cash-flow table with exit trailer rows
    CashFlows(CashFlowArgs),
    /// 5x5 grid of a metric over purchase price and exit cap rate
    Sensitivity(ScenarioArgs),
    /// Rank assumption drivers by their swing on a metric
    Tornado(ScenarioArgs),
    /// Annual loan amortization schedule
    Amortization(AmortizationArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Underwrite(args) => commands::underwriting::run_underwrite(args),
        Commands::CashFlows(args) => commands::underwriting::run_cash_flows(args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args),
        Commands::Tornado(args) => commands::scenarios::run_tornado_chart(args),
        Commands::Amortization(args) => commands::underwriting::run_amortization(args),
        Commands::Version => {
            println!("uw {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
