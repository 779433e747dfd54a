use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tickerlens::cli::setup::setup;
use tickerlens::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for tickerlens::AppCommand {
    fn from(cmd: Commands) -> tickerlens::AppCommand {
        match cmd {
            Commands::Compare { symbols, refresh } => {
                tickerlens::AppCommand::Compare { symbols, refresh }
            }
            Commands::Correlate { symbols, refresh } => {
                tickerlens::AppCommand::Correlate { symbols, refresh }
            }
            Commands::Search { query } => tickerlens::AppCommand::Search {
                query: query.join(" "),
            },
            Commands::Quota => tickerlens::AppCommand::Quota,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Compare performance, risk and technical indicators
    Compare {
        /// Ticker symbols; defaults to the configured watchlists
        symbols: Vec<String>,
        /// Ignore cached market data
        #[arg(short, long)]
        refresh: bool,
    },
    /// Display the correlation matrix of daily returns
    Correlate {
        /// Ticker symbols; defaults to the configured watchlists
        symbols: Vec<String>,
        /// Ignore cached market data
        #[arg(short, long)]
        refresh: bool,
    },
    /// Look up ticker symbols by name
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Show today's remaining data calls
    Quota,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => tickerlens::cli::setup::setup_at_path(path),
            None => setup(),
        },
        Some(cmd) => tickerlens::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
