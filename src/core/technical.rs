//! Moving averages, momentum and 52-week range position over closing prices.

use serde::Serialize;

pub const SMA_SHORT_WINDOW: usize = 50;
pub const SMA_LONG_WINDOW: usize = 200;
pub const RSI_PERIOD: usize = 14;
pub const RANGE_WINDOW: usize = 252;

/// Arithmetic mean of the last `window` closes.
pub fn sma(closes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || closes.len() < window {
        return None;
    }
    let tail = &closes[closes.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

/// Relative Strength Index over the last `period` close-to-close differences.
///
/// Gains and losses are plain averages over the window, not Wilder-smoothed:
/// `RSI = 100 - 100 / (1 + avgGain / avgLoss)`, and 100 when there are no losses.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let tail = &closes[closes.len() - (period + 1)..];
    let (gains, losses) = tail
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(gains, losses), diff| {
            if diff > 0.0 {
                (gains + diff, losses)
            } else {
                (gains, losses - diff)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rsi = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
    rsi.is_finite().then_some(rsi)
}

/// Golden-cross flag: whether the short SMA sits above the long one.
pub fn sma_signal(sma_short: Option<f64>, sma_long: Option<f64>) -> Option<bool> {
    match (sma_short, sma_long) {
        (Some(short), Some(long)) => Some(short > long),
        _ => None,
    }
}

/// Where the latest close sits inside the trailing 52-week range, both in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RangePosition {
    pub high: Option<f64>,
    pub low: Option<f64>,
    /// How far below the high the latest close is.
    pub dist_to_high: Option<f64>,
    /// How far above the low the latest close is.
    pub dist_to_low: Option<f64>,
}

pub fn range_position(closes: &[f64]) -> RangePosition {
    let Some(&last) = closes.last() else {
        return RangePosition::default();
    };
    let window = &closes[closes.len().saturating_sub(RANGE_WINDOW)..];
    let high = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().copied().fold(f64::INFINITY, f64::min);

    let dist_to_high = (high > 0.0).then(|| (high - last) / high * 100.0);
    let dist_to_low = (low > 0.0).then(|| (last - low) / low * 100.0);

    RangePosition {
        high: high.is_finite().then_some(high),
        low: low.is_finite().then_some(low),
        dist_to_high: dist_to_high.filter(|d| d.is_finite()),
        dist_to_low: dist_to_low.filter(|d| d.is_finite()),
    }
}
