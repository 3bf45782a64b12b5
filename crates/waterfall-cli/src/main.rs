mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::waterfall::{AccrualArgs, CalculateArgs, NormalizeArgs};

/// Private-equity distribution waterfall calculations
#[derive(Parser)]
#[command(
    name = "waterfall",
    version,
    about = "Private-equity distribution waterfall calculations",
    long_about = "A CLI for allocating a commitment's distributions between limited and \
                  general partners across the four-tier European waterfall (return of \
                  capital, preferred return, GP catch-up, carried-interest split) with \
                  decimal precision."
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
    /// Run the four-tier waterfall for one commitment
    Calculate(CalculateArgs),
    /// Parse and validate raw transactions into dated cash-flow events
    Normalize(NormalizeArgs),
    /// Show the compounding preferred-return accrual schedule
    Accrual(AccrualArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Compact,
    Table,
    Csv,
    Minimal,
}

/// Diagnostics go to stderr so piped JSON output stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("WATERFALL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::waterfall::run_calculate(args),
        Commands::Normalize(args) => commands::waterfall::run_normalize(args),
        Commands::Accrual(args) => commands::waterfall::run_accrual(args),
        Commands::Version => {
            println!("waterfall {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            let failed = value.get("status").and_then(|s| s.as_str()) == Some("error");
            process::exit(if failed { 1 } else { 0 });
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
