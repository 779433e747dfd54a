use super::correlation::Alignment;
use super::radar::RadarConfig;
use super::ratelimit::{Backoff, RateLimit, RetryPolicy};
use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SubjectConfig {
    pub id: String,
    #[serde(default = "default_tier_name")]
    pub tier: String,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        SubjectConfig {
            id: "local".to_string(),
            tier: default_tier_name(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Watchlist {
    pub name: String,
    pub symbols: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

impl ProvidersConfig {
    pub fn yahoo_base_url(&self) -> &str {
        self.yahoo
            .as_ref()
            .map_or("https://query1.finance.yahoo.com", |p| &p.base_url)
    }
}

/// Limits for one subscription tier.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    pub daily_calls: u32,
    pub requests_per_window: u32,
    pub window_ms: u64,
}

impl TierLimits {
    pub fn rate_limit(&self) -> RateLimit {
        RateLimit::new(self.requests_per_window, Duration::from_millis(self.window_ms))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub backoff: Backoff,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: 2,
            backoff: Backoff::Exponential,
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: self.backoff,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LimitsConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Offset from UTC at which quota days roll over.
    #[serde(default)]
    pub quota_utc_offset_minutes: i32,
    #[serde(default = "default_bypass_tiers")]
    pub bypass_tiers: Vec<String>,
    #[serde(default = "default_tier_name")]
    pub default_tier: String,
    #[serde(default = "default_tiers")]
    pub tiers: BTreeMap<String, TierLimits>,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            cache_ttl_secs: default_cache_ttl_secs(),
            quota_utc_offset_minutes: 0,
            bypass_tiers: default_bypass_tiers(),
            default_tier: default_tier_name(),
            tiers: default_tiers(),
            retry: RetryConfig::default(),
        }
    }
}

impl LimitsConfig {
    /// Limits for `tier`, falling back to the default tier for unknown names.
    pub fn resolve_tier(&self, tier: &str) -> Result<TierLimits> {
        if let Some(limits) = self.tiers.get(tier) {
            return Ok(*limits);
        }
        debug!(tier, default = %self.default_tier, "Unknown tier, using default limits");
        self.tiers.get(&self.default_tier).copied().ok_or_else(|| {
            anyhow!(
                "No limits configured for tier '{}' or default tier '{}'",
                tier,
                self.default_tier
            )
        })
    }

    pub fn is_bypass(&self, tier: &str) -> bool {
        self.bypass_tiers.iter().any(|t| t == tier)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn quota_offset(&self) -> Result<FixedOffset> {
        self.quota_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .with_context(|| {
                format!(
                    "Invalid quota UTC offset: {} minutes",
                    self.quota_utc_offset_minutes
                )
            })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub subject: SubjectConfig,
    #[serde(default)]
    pub watchlists: Vec<Watchlist>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub radar: RadarConfig,
    #[serde(default)]
    pub correlation_alignment: Alignment,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "tickerlens")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "tickerlens")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Symbols from every watchlist, in order, without duplicates.
    pub fn watchlist_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for symbol in self.watchlists.iter().flat_map(|w| &w.symbols) {
            if !symbols.contains(symbol) {
                symbols.push(symbol.clone());
            }
        }
        symbols
    }

    /// Limits for the configured subject's tier.
    pub fn subject_limits(&self) -> Result<TierLimits> {
        self.limits.resolve_tier(&self.subject.tier)
    }
}

fn default_tier_name() -> String {
    "free".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_base_delay_ms() -> u64 {
    250
}

fn default_bypass_tiers() -> Vec<String> {
    vec!["admin".to_string()]
}

fn default_tiers() -> BTreeMap<String, TierLimits> {
    BTreeMap::from([
        (
            "free".to_string(),
            TierLimits {
                daily_calls: 25,
                requests_per_window: 5,
                window_ms: 1000,
            },
        ),
        (
            "pro".to_string(),
            TierLimits {
                daily_calls: 500,
                requests_per_window: 20,
                window_ms: 1000,
            },
        ),
    ])
}
