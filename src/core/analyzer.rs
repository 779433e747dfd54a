//! Orchestrates quota, cache, rate limiting and the analytics pipeline per symbol.

use super::cache::{TtlCache, cache_key};
use super::config::{AppConfig, LimitsConfig};
use super::correlation::{Alignment, CorrelationMatrix};
use super::metrics::AssetReport;
use super::price::{AssetData, MarketDataProvider, SymbolMatch};
use super::quota::{QuotaGate, QuotaRecord, QuotaStore};
use super::radar::{RadarConfig, RadarScores};
use super::ratelimit::{MARKET_DATA, RateLimiter, RetryPolicy, scope_key};
use super::series::TimeSeries;
use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const SEARCH: &str = "search";

/// Who a request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: String,
    pub tier: String,
}

impl Subject {
    pub fn new(id: &str, tier: &str) -> Self {
        Self {
            id: id.to_string(),
            tier: tier.to_string(),
        }
    }
}

/// Upper-cased, trimmed ticker symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Result of comparing several symbols. Failed symbols keep their error and are left out
/// of the correlation matrix and radar scores.
pub struct ComparisonReport {
    pub assets: Vec<(String, Result<AssetReport>)>,
    pub correlation: CorrelationMatrix,
    pub radar: RadarScores,
}

impl ComparisonReport {
    pub fn reports(&self) -> impl Iterator<Item = &AssetReport> {
        self.assets.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &anyhow::Error)> {
        self.assets
            .iter()
            .filter_map(|(symbol, r)| r.as_ref().err().map(|e| (symbol.as_str(), e)))
    }
}

pub struct Analyzer {
    provider: Arc<dyn MarketDataProvider>,
    quota: QuotaGate,
    limiter: RateLimiter,
    asset_cache: TtlCache<AssetData>,
    search_cache: TtlCache<Vec<SymbolMatch>>,
    limits: LimitsConfig,
    retry: RetryPolicy,
    radar: RadarConfig,
    alignment: Alignment,
}

impl Analyzer {
    /// Builds the service instances from configuration. Must be called inside a tokio
    /// runtime since the caches start their sweepers here.
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        quota_store: Arc<dyn QuotaStore>,
        config: &AppConfig,
    ) -> Result<Self> {
        let offset = config.limits.quota_offset()?;
        let ttl = config.limits.cache_ttl();
        Ok(Self {
            provider,
            quota: QuotaGate::new(quota_store, offset),
            limiter: RateLimiter::new(),
            asset_cache: TtlCache::start(ttl),
            search_cache: TtlCache::start(ttl),
            limits: config.limits.clone(),
            retry: config.limits.retry.policy(),
            radar: config.radar.clone(),
            alignment: config.correlation_alignment,
        })
    }

    /// Consumes one quota call, then returns the cached asset data or fetches profile, key
    /// metrics, quote, history and price target together. A failure in any of them fails
    /// the asset.
    #[instrument(name = "FetchAsset", skip(self, subject), fields(subject = %subject.id))]
    pub async fn fetch_asset(
        &self,
        subject: &Subject,
        symbol: &str,
        force_refresh: bool,
    ) -> Result<AssetData> {
        let limits = self.limits.resolve_tier(&subject.tier)?;
        self.quota.try_consume(&subject.id, limits.daily_calls).await?;

        let key = cache_key("asset", &symbol)?;
        self.asset_cache
            .get_or_fetch(&key, force_refresh, || async move {
                self.limiter
                    .acquire(
                        &scope_key(Some(&subject.id), MARKET_DATA),
                        limits.rate_limit(),
                        &self.retry,
                        self.limits.is_bypass(&subject.tier),
                    )
                    .await?;

                let (profile, key_metrics, quote, history, price_target) = tokio::try_join!(
                    self.provider.fetch_profile(symbol),
                    self.provider.fetch_key_metrics(symbol),
                    self.provider.fetch_quote(symbol),
                    self.provider.fetch_history(symbol),
                    self.provider.fetch_price_target(symbol),
                )
                .with_context(|| format!("Failed to fetch market data for {symbol}"))?;

                debug!(symbol, points = history.len(), "Fetched asset data");
                Ok(AssetData {
                    profile,
                    quote,
                    key_metrics,
                    price_target,
                    history,
                })
            })
            .await
    }

    pub async fn analyze_symbol(
        &self,
        subject: &Subject,
        symbol: &str,
        force_refresh: bool,
    ) -> Result<AssetReport> {
        let symbol = normalize_symbol(symbol);
        let AssetData {
            profile,
            quote,
            key_metrics,
            price_target,
            history,
        } = self.fetch_asset(subject, &symbol, force_refresh).await?;
        let series = TimeSeries::normalize(&symbol, history);
        Ok(AssetReport::build(
            &profile,
            &quote,
            &key_metrics,
            &price_target,
            &series,
        ))
    }

    /// Analyzes all symbols concurrently and builds the cross-asset views over the ones
    /// that succeeded.
    pub async fn compare(
        &self,
        subject: &Subject,
        symbols: &[String],
        force_refresh: bool,
    ) -> ComparisonReport {
        let mut unique: Vec<String> = Vec::new();
        for symbol in symbols.iter().map(|s| normalize_symbol(s)) {
            if !symbol.is_empty() && !unique.contains(&symbol) {
                unique.push(symbol);
            }
        }

        let futures = unique.iter().map(|symbol| async move {
            let result = self.analyze_symbol(subject, symbol, force_refresh).await;
            (symbol.clone(), result)
        });
        let assets: Vec<(String, Result<AssetReport>)> = join_all(futures).await;

        let succeeded: Vec<&AssetReport> = assets
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .collect();
        let returns: Vec<(&str, _)> = succeeded
            .iter()
            .map(|r| (r.symbol.as_str(), &r.returns))
            .collect();
        let scored: Vec<(&str, &AssetReport)> = succeeded
            .iter()
            .map(|r| (r.symbol.as_str(), *r))
            .collect();

        let correlation = CorrelationMatrix::build(&returns, self.alignment);
        let radar = RadarScores::compute(&self.radar, &scored);
        info!(
            requested = unique.len(),
            succeeded = succeeded.len(),
            "Comparison complete"
        );

        ComparisonReport {
            assets,
            correlation,
            radar,
        }
    }

    /// Symbol lookup. Rate limited and cached, but does not count against the quota.
    pub async fn search_symbols(
        &self,
        subject: &Subject,
        query: &str,
    ) -> Result<Vec<SymbolMatch>> {
        let limits = self.limits.resolve_tier(&subject.tier)?;
        let key = cache_key(SEARCH, &query)?;
        self.search_cache
            .get_or_fetch(&key, false, || async move {
                self.limiter
                    .acquire(
                        &scope_key(Some(&subject.id), SEARCH),
                        limits.rate_limit(),
                        &self.retry,
                        self.limits.is_bypass(&subject.tier),
                    )
                    .await?;
                self.provider.search(query).await
            })
            .await
    }

    pub async fn quota_usage(&self, subject: &Subject) -> Result<QuotaRecord> {
        let limits = self.limits.resolve_tier(&subject.tier)?;
        self.quota.usage(&subject.id, limits.daily_calls).await
    }

    /// Stops the cache sweepers.
    pub fn shutdown(&self) {
        self.asset_cache.shutdown();
        self.search_cache.shutdown();
    }
}
