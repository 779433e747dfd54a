//! Per-asset analytics record assembled from the individual calculators.
use super::price::{CompanyProfile, KeyMetrics, PriceTarget, Quote};
use super::returns::{self, PeriodChanges, ReturnSeries};
use super::risk;
use super::series::TimeSeries;
use super::technical;
use anyhow::{Result, anyhow};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Derived statistics for one asset. Every field is independently optional: `None` means
/// the value could not be produced from the available data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub changes: PeriodChanges,
    pub std_dev_30: Option<f64>,
    pub sharpe: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub rsi_14: Option<f64>,
    pub dist_52w_high: Option<f64>,
    pub dist_52w_low: Option<f64>,
    pub sma_signal: Option<bool>,
    pub annualized_return: Option<f64>,
}

impl DerivedMetrics {
    pub fn compute(series: &TimeSeries, returns: &ReturnSeries) -> Self {
        let closes = series.closes();
        let sma_50 = technical::sma(&closes, technical::SMA_SHORT_WINDOW);
        let sma_200 = technical::sma(&closes, technical::SMA_LONG_WINDOW);
        let range = technical::range_position(&closes);

        let annualized_return = match returns::annualized_return(series) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(symbol = series.symbol(), error = %e, "Annualized return unavailable");
                None
            }
        };

        Self {
            changes: PeriodChanges::compute(series),
            std_dev_30: risk::std_dev_30(returns),
            sharpe: risk::sharpe_annualized(returns),
            sma_50,
            sma_200,
            rsi_14: technical::rsi(&closes, technical::RSI_PERIOD),
            dist_52w_high: range.dist_to_high,
            dist_52w_low: range.dist_to_low,
            sma_signal: technical::sma_signal(sma_50, sma_200),
            annualized_return,
        }
    }
}

/// Numeric metrics addressable by name, used by radar scoring and indicator maps.
pub trait MetricLookup {
    /// Looks up a metric by name. Errors only for names the source does not know.
    fn value_of(&self, name: &str) -> Result<Option<f64>>;
}

impl MetricLookup for DerivedMetrics {
    fn value_of(&self, name: &str) -> Result<Option<f64>> {
        Ok(match name {
            "day_change" => self.changes.day,
            "week_change" => self.changes.week,
            "month_change" => self.changes.month,
            "quarter_change" => self.changes.quarter,
            "year_change" => self.changes.year,
            "ytd_change" => self.changes.ytd,
            "std_dev_30" => self.std_dev_30,
            "sharpe" => self.sharpe,
            "sma_50" => self.sma_50,
            "sma_200" => self.sma_200,
            "rsi_14" => self.rsi_14,
            "dist_52w_high" => self.dist_52w_high,
            "dist_52w_low" => self.dist_52w_low,
            "annualized_return" => self.annualized_return,
            _ => return Err(anyhow!("Unknown metric: {}", name)),
        })
    }
}

/// Percentage distance from `price` to the analyst mean target.
pub fn target_upside(target: Option<f64>, price: Option<f64>) -> Option<f64> {
    let target = target.filter(|t| t.is_finite() && *t > 0.0)?;
    let price = price.filter(|p| p.is_finite() && *p > 0.0)?;
    Some((target / price - 1.0) * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCategory {
    Valuation,
    Profitability,
    Leverage,
    Returns,
    Risk,
    Technical,
}

impl IndicatorCategory {
    pub const ALL: [IndicatorCategory; 6] = [
        IndicatorCategory::Valuation,
        IndicatorCategory::Profitability,
        IndicatorCategory::Leverage,
        IndicatorCategory::Returns,
        IndicatorCategory::Risk,
        IndicatorCategory::Technical,
    ];

    /// Indicator names grouped under this category.
    pub fn indicators(&self) -> &'static [&'static str] {
        match self {
            IndicatorCategory::Valuation => &[
                "pe_ratio",
                "forward_pe",
                "price_to_book",
                "price_to_sales",
                "peg_ratio",
                "ev_to_ebitda",
                "target_upside",
            ],
            IndicatorCategory::Profitability => &[
                "return_on_equity",
                "return_on_assets",
                "profit_margin",
                "operating_margin",
                "gross_margin",
            ],
            IndicatorCategory::Leverage => &["debt_to_equity", "current_ratio", "quick_ratio"],
            IndicatorCategory::Returns => &[
                "day_change",
                "week_change",
                "month_change",
                "quarter_change",
                "year_change",
                "ytd_change",
                "annualized_return",
            ],
            IndicatorCategory::Risk => &["std_dev_30", "sharpe"],
            IndicatorCategory::Technical => &[
                "sma_50",
                "sma_200",
                "rsi_14",
                "dist_52w_high",
                "dist_52w_low",
            ],
        }
    }
}

pub type IndicatorMap = BTreeMap<IndicatorCategory, BTreeMap<String, Option<f64>>>;

/// Groups named metrics by category for renderers and exporters. A name the source does
/// not know is logged and left absent.
pub fn named_indicators(source: &impl MetricLookup) -> IndicatorMap {
    IndicatorCategory::ALL
        .iter()
        .map(|category| {
            let values = category
                .indicators()
                .iter()
                .map(|name| {
                    let value = source.value_of(name).unwrap_or_else(|e| {
                        warn!(error = %e, "Indicator lookup failed");
                        None
                    });
                    (name.to_string(), value)
                })
                .collect();
            (*category, values)
        })
        .collect()
}

/// The record handed to renderers and exporters for one asset.
#[derive(Debug, Clone, Serialize)]
pub struct AssetReport {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub currency: Option<String>,
    pub price: Option<f64>,
    pub metrics: DerivedMetrics,
    pub key_metrics: KeyMetrics,
    pub price_target: PriceTarget,
    pub target_upside: Option<f64>,
    pub indicators: IndicatorMap,
    pub returns: ReturnSeries,
}

impl AssetReport {
    pub fn build(
        profile: &CompanyProfile,
        quote: &Quote,
        key_metrics: &KeyMetrics,
        price_target: &PriceTarget,
        series: &TimeSeries,
    ) -> Self {
        let returns = ReturnSeries::from_series(series);
        let metrics = DerivedMetrics::compute(series, &returns);
        let price = quote.price.or_else(|| series.latest().map(|p| p.close));

        let mut report = Self {
            symbol: series.symbol().to_string(),
            name: profile.name.clone(),
            exchange: profile.exchange.clone(),
            sector: profile.sector.clone(),
            industry: profile.industry.clone(),
            currency: quote.currency.clone(),
            price,
            metrics,
            key_metrics: key_metrics.clone(),
            price_target: price_target.clone(),
            target_upside: target_upside(price_target.mean, price),
            indicators: IndicatorMap::new(),
            returns,
        };
        report.indicators = named_indicators(&report);
        report
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.symbol)
    }
}

impl MetricLookup for AssetReport {
    fn value_of(&self, name: &str) -> Result<Option<f64>> {
        let km = &self.key_metrics;
        Ok(match name {
            "pe_ratio" => km.trailing_pe,
            "forward_pe" => km.forward_pe,
            "price_to_book" => km.price_to_book,
            "price_to_sales" => km.price_to_sales,
            "peg_ratio" => km.peg_ratio,
            "ev_to_ebitda" => km.ev_to_ebitda,
            "target_upside" => self.target_upside,
            "return_on_equity" => km.return_on_equity,
            "return_on_assets" => km.return_on_assets,
            "profit_margin" => km.profit_margin,
            "operating_margin" => km.operating_margin,
            "gross_margin" => km.gross_margin,
            "debt_to_equity" => km.debt_to_equity,
            "current_ratio" => km.current_ratio,
            "quick_ratio" => km.quick_ratio,
            _ => return self.metrics.value_of(name),
        })
    }
}
