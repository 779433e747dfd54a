//! Market data abstractions and the upstream payload types the analytics consume

use super::series::RawPricePoint;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub quote_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub previous_close: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

/// Trailing-twelve-month fundamentals. Returns and margins are percentages, everything
/// else is a plain ratio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub ev_to_ebitda: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub profit_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub gross_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
}

/// Analyst price target summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTarget {
    pub mean: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub analyst_count: Option<u32>,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub quote_type: Option<String>,
}

/// Everything fetched for one symbol in a single refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetData {
    pub profile: CompanyProfile,
    pub quote: Quote,
    pub key_metrics: KeyMetrics,
    pub price_target: PriceTarget,
    pub history: Vec<RawPricePoint>,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile>;
    async fn fetch_key_metrics(&self, symbol: &str) -> Result<KeyMetrics>;
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;
    async fn fetch_history(&self, symbol: &str) -> Result<Vec<RawPricePoint>>;
    async fn fetch_price_target(&self, symbol: &str) -> Result<PriceTarget>;
    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>>;
}
