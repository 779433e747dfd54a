pub mod yahoo_finance;

use crate::core::config::AppConfig;
use crate::core::price::MarketDataProvider;
use anyhow::Result;
use std::sync::Arc;
use yahoo_finance::YahooFinanceProvider;

/// Builds the configured upstream market data provider.
pub fn market_data_provider(config: &AppConfig) -> Result<Arc<dyn MarketDataProvider>> {
    let provider = YahooFinanceProvider::new(config.providers.yahoo_base_url())?;
    Ok(Arc::new(provider))
}
