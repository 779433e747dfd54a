//! Maps heterogeneous metric scales onto a shared `[0, 1]` axis for side-by-side comparison.

use super::metrics::MetricLookup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub lower_is_better: bool,
}

impl MetricRange {
    pub fn new(min: f64, max: f64, lower_is_better: bool) -> Self {
        Self {
            min,
            max,
            lower_is_better,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Clamps `value` into the range and rescales it to `[0, 1]`, inverting when lower is better.
///
/// Missing or non-finite values and invalid ranges stay absent; a degenerate range
/// (`min == max`) maps to 0.5.
pub fn normalize_for_radar(value: Option<f64>, range: &MetricRange) -> Option<f64> {
    if !range.is_valid() {
        return None;
    }
    let value = value.filter(|v| v.is_finite())?;
    if range.min == range.max {
        return Some(0.5);
    }
    let clamped = value.clamp(range.min, range.max);
    let normalized = (clamped - range.min) / (range.max - range.min);
    Some(if range.lower_is_better {
        1.0 - normalized
    } else {
        normalized
    })
}

/// Configured metric ranges keyed by [`MetricLookup::value_of`] names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RadarConfig {
    pub metrics: BTreeMap<String, MetricRange>,
}

impl Default for RadarConfig {
    fn default() -> Self {
        let metrics = [
            ("year_change", MetricRange::new(-50.0, 100.0, false)),
            ("sharpe", MetricRange::new(-1.0, 3.0, false)),
            ("std_dev_30", MetricRange::new(0.0, 5.0, true)),
            ("rsi_14", MetricRange::new(0.0, 100.0, false)),
            ("dist_52w_high", MetricRange::new(0.0, 50.0, true)),
            ("annualized_return", MetricRange::new(-20.0, 40.0, false)),
            ("pe_ratio", MetricRange::new(5.0, 50.0, true)),
            ("return_on_equity", MetricRange::new(0.0, 40.0, false)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self { metrics }
    }
}

/// Per-asset scores for each configured metric. Absent scores are kept as `None` and
/// never folded into aggregates as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarScores {
    pub metrics: Vec<String>,
    pub assets: Vec<(String, BTreeMap<String, Option<f64>>)>,
}

impl RadarScores {
    pub fn compute<M: MetricLookup>(config: &RadarConfig, assets: &[(&str, &M)]) -> Self {
        let metrics: Vec<String> = config.metrics.keys().cloned().collect();
        let assets = assets
            .iter()
            .map(|(symbol, source)| {
                let scores = config
                    .metrics
                    .iter()
                    .map(|(key, range)| {
                        (key.clone(), score_metric(symbol, key, range, *source))
                    })
                    .collect();
                (symbol.to_string(), scores)
            })
            .collect();
        Self { metrics, assets }
    }

    pub fn score(&self, symbol: &str, metric: &str) -> Option<f64> {
        self.assets
            .iter()
            .find(|(s, _)| s == symbol)
            .and_then(|(_, scores)| scores.get(metric).copied().flatten())
    }

    /// Mean of the available scores for `symbol`.
    pub fn average(&self, symbol: &str) -> Option<f64> {
        let (_, scores) = self.assets.iter().find(|(s, _)| s == symbol)?;
        let present: Vec<f64> = scores.values().filter_map(|v| *v).collect();
        if present.is_empty() {
            return None;
        }
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

fn score_metric(
    symbol: &str,
    key: &str,
    range: &MetricRange,
    source: &impl MetricLookup,
) -> Option<f64> {
    if !range.is_valid() {
        warn!(symbol, metric = key, ?range, "Ignoring radar metric with invalid range");
        return None;
    }
    match source.value_of(key) {
        Ok(value) => normalize_for_radar(value, range),
        Err(e) => {
            warn!(symbol, metric = key, error = %e, "Ignoring unknown radar metric");
            None
        }
    }
}
