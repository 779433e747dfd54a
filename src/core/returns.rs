//! Daily returns and calendar-anchored period changes.

use super::series::TimeSeries;
use anyhow::{Result, anyhow};
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::{Decimal, prelude::*};
use rust_finprim::rate::cagr;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyReturn {
    /// Date of the later of the two closes.
    pub date: NaiveDate,
    pub value: f64,
}

/// Close-to-close simple returns, `close[i+1] / close[i] - 1`.
///
/// Pairs with a non-positive or non-finite close are skipped rather than zeroed, so the
/// series can be shorter than `len(series) - 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReturnSeries {
    returns: Vec<DailyReturn>,
}

impl ReturnSeries {
    pub fn from_series(series: &TimeSeries) -> Self {
        let returns = series
            .points()
            .windows(2)
            .filter_map(|w| {
                let (prev, next) = (w[0].close, w[1].close);
                if !(prev.is_finite() && next.is_finite()) || prev <= 0.0 {
                    return None;
                }
                let value = next / prev - 1.0;
                value.is_finite().then_some(DailyReturn {
                    date: w[1].date,
                    value,
                })
            })
            .collect();
        Self { returns }
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn returns(&self) -> &[DailyReturn] {
        &self.returns
    }

    pub fn values(&self) -> Vec<f64> {
        self.returns.iter().map(|r| r.value).collect()
    }

    /// The most recent `n` returns, or all of them when fewer exist.
    pub fn last_values(&self, n: usize) -> Vec<f64> {
        let start = self.returns.len().saturating_sub(n);
        self.returns[start..].iter().map(|r| r.value).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Period {
    Day,
    Week,
    Month,
    Quarter,
    Year,
    YearToDate,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::Day,
        Period::Week,
        Period::Month,
        Period::Quarter,
        Period::Year,
        Period::YearToDate,
    ];

    /// Calendar look-back for the fixed-length periods. `Day` compares against the previous
    /// available point and `YearToDate` anchors on January 1, so neither has one.
    pub fn lookback(&self) -> Option<Duration> {
        match self {
            Period::Week => Some(Duration::days(7)),
            Period::Month => Some(Duration::days(30)),
            Period::Quarter => Some(Duration::days(90)),
            Period::Year => Some(Duration::days(365)),
            Period::Day | Period::YearToDate => None,
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Period::Day => "1D",
                Period::Week => "1W",
                Period::Month => "1M",
                Period::Quarter => "3M",
                Period::Year => "1Y",
                Period::YearToDate => "YTD",
            }
        )
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1D" => Ok(Period::Day),
            "1W" | "7D" => Ok(Period::Week),
            "1M" | "30D" => Ok(Period::Month),
            "3M" | "90D" => Ok(Period::Quarter),
            "1Y" | "365D" => Ok(Period::Year),
            "YTD" => Ok(Period::YearToDate),
            _ => Err(anyhow!("Invalid period: {}", s)),
        }
    }
}

/// Percentage change of the latest close against the anchor point for `period`.
///
/// The anchor is the closest available point dated on or before the target date. When the
/// series does not reach back that far the change is unavailable.
pub fn period_change(series: &TimeSeries, period: Period) -> Option<f64> {
    let points = series.points();
    let latest = points.last()?;

    let anchor = match period {
        Period::Day => points.len().checked_sub(2).map(|i| &points[i])?,
        Period::YearToDate => {
            let jan_first = NaiveDate::from_ymd_opt(latest.date.year(), 1, 1)?;
            series.at_or_before(jan_first)?
        }
        _ => series.at_or_before(latest.date - period.lookback()?)?,
    };

    if anchor.close <= 0.0 {
        return None;
    }
    let change = (latest.close / anchor.close - 1.0) * 100.0;
    debug!(
        symbol = series.symbol(),
        %period,
        anchor_date = %anchor.date,
        change,
        "Computed period change"
    );
    change.is_finite().then_some(change)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodChanges {
    pub day: Option<f64>,
    pub week: Option<f64>,
    pub month: Option<f64>,
    pub quarter: Option<f64>,
    pub year: Option<f64>,
    pub ytd: Option<f64>,
}

impl PeriodChanges {
    pub fn compute(series: &TimeSeries) -> Self {
        Self {
            day: period_change(series, Period::Day),
            week: period_change(series, Period::Week),
            month: period_change(series, Period::Month),
            quarter: period_change(series, Period::Quarter),
            year: period_change(series, Period::Year),
            ytd: period_change(series, Period::YearToDate),
        }
    }

    pub fn get(&self, period: Period) -> Option<f64> {
        match period {
            Period::Day => self.day,
            Period::Week => self.week,
            Period::Month => self.month,
            Period::Quarter => self.quarter,
            Period::Year => self.year,
            Period::YearToDate => self.ytd,
        }
    }
}

/// Compound annual growth rate (percent) from the first to the latest point.
pub fn annualized_return(series: &TimeSeries) -> Result<f64> {
    let (first, latest) = match (series.first(), series.latest()) {
        (Some(first), Some(latest)) => (first, latest),
        _ => return Err(anyhow!("No price history for {}", series.symbol())),
    };

    let days = (latest.date - first.date).num_days();
    if days < 1 {
        return Err(anyhow!("Price history for {} spans less than a day", series.symbol()));
    }
    let duration_years = days as f64 / 365.0;

    let begin_bal =
        Decimal::from_f64(first.close).ok_or_else(|| anyhow!("Invalid starting price"))?;
    let end_bal = Decimal::from_f64(latest.close).ok_or_else(|| anyhow!("Invalid latest price"))?;
    let n_years = Decimal::from_f64(duration_years).ok_or_else(|| anyhow!("Invalid duration"))?;
    if begin_bal <= Decimal::ZERO || n_years.is_zero() {
        return Err(anyhow!("Cannot annualize from a non-positive price"));
    }

    let rate = cagr(begin_bal, end_bal, n_years);
    let percentage = (rate * Decimal::from(100))
        .to_f64()
        .ok_or_else(|| anyhow!("CAGR percentage conversion failed"))?;
    debug!("cagr: {begin_bal}, {end_bal}, {n_years} = {rate}, {percentage}");
    Ok(percentage)
}
