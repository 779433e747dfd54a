pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::analyzer::{Analyzer, Subject};
use crate::core::config::AppConfig;
use crate::core::search::{DEFAULT_SEARCH_DEBOUNCE, SearchSession};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Metrics table and comparison scores for the symbols (watchlists when empty)
    Compare { symbols: Vec<String>, refresh: bool },
    /// Correlation matrix of daily returns for the symbols (watchlists when empty)
    Correlate { symbols: Vec<String>, refresh: bool },
    Search { query: String },
    Quota,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("tickerlens starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = providers::market_data_provider(&config)?;
    let quota_store = store::open_quota_store(&config);
    let analyzer = Arc::new(Analyzer::new(provider, quota_store, &config)?);
    let subject = Subject::new(&config.subject.id, &config.subject.tier);

    let symbols_or_watchlists = |symbols: Vec<String>| {
        if symbols.is_empty() {
            config.watchlist_symbols()
        } else {
            symbols
        }
    };

    let result = match command {
        AppCommand::Compare { symbols, refresh } => {
            let symbols = symbols_or_watchlists(symbols);
            cli::compare::run(&analyzer, &subject, &symbols, refresh).await
        }
        AppCommand::Correlate { symbols, refresh } => {
            let symbols = symbols_or_watchlists(symbols);
            cli::correlate::run(&analyzer, &subject, &symbols, refresh).await
        }
        AppCommand::Search { query } => {
            let session =
                SearchSession::new(Arc::clone(&analyzer), subject.clone(), DEFAULT_SEARCH_DEBOUNCE);
            cli::search::run(&session, &query).await
        }
        AppCommand::Quota => cli::quota::run(&analyzer, &subject).await,
    };

    analyzer.shutdown();
    result
}
