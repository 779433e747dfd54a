//! Analytics pipeline and the services that guard the upstream data source

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod correlation;
pub mod error;
pub mod log;
pub mod metrics;
pub mod price;
pub mod quota;
pub mod radar;
pub mod ratelimit;
pub mod returns;
pub mod risk;
pub mod search;
pub mod series;
pub mod task;
pub mod technical;

// Re-export main types for cleaner imports
pub use analyzer::{Analyzer, ComparisonReport, Subject};
pub use error::LimitError;
pub use metrics::{AssetReport, DerivedMetrics};
pub use price::{AssetData, CompanyProfile, MarketDataProvider, Quote, SymbolMatch};
pub use series::{PricePoint, RawDate, RawPricePoint, TimeSeries};
