//! Price history ingestion and the cleaned, date-ordered series built from it.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A date as delivered by an upstream source, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Unix(i64),
    Text(String),
}

impl RawDate {
    /// Parses the raw value into a calendar date. Text accepts `YYYY-MM-DD` or RFC 3339;
    /// unix timestamps are read as seconds in UTC.
    pub fn parse(&self) -> Option<NaiveDate> {
        match self {
            RawDate::Unix(ts) => DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()),
            RawDate::Text(text) => {
                let text = text.trim();
                NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().or_else(|| {
                    DateTime::parse_from_rfc3339(text)
                        .ok()
                        .map(|dt| dt.date_naive())
                })
            }
        }
    }
}

/// One unvalidated history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPricePoint {
    pub date: RawDate,
    pub close: Option<f64>,
}

impl RawPricePoint {
    pub fn new(date: RawDate, close: Option<f64>) -> Self {
        Self { date, close }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ascending, duplicate-free daily closes for one symbol. All closes are finite and positive.
///
/// The only way to build one is [`TimeSeries::normalize`], so every instance upholds the
/// invariants above. Refreshing data replaces the series wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl TimeSeries {
    /// Drops records with unparseable dates or non-positive/non-finite closes, then sorts
    /// by date. When several records share a date the first one received is kept.
    pub fn normalize<I>(symbol: &str, raw: I) -> Self
    where
        I: IntoIterator<Item = RawPricePoint>,
    {
        let mut skipped = 0usize;
        let mut points: Vec<PricePoint> = raw
            .into_iter()
            .filter_map(|record| {
                let point = match (record.date.parse(), record.close) {
                    (Some(date), Some(close)) if close.is_finite() && close > 0.0 => {
                        Some(PricePoint { date, close })
                    }
                    _ => None,
                };
                if point.is_none() {
                    skipped += 1;
                }
                point
            })
            .collect();

        // Stable sort keeps arrival order among equal dates, so dedup retains the first.
        points.sort_by_key(|p| p.date);
        let before_dedup = points.len();
        points.dedup_by_key(|p| p.date);

        debug!(
            symbol,
            kept = points.len(),
            skipped,
            duplicates = before_dedup - points.len(),
            "Normalized price history"
        );

        Self {
            symbol: symbol.to_string(),
            points,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// The most recent point dated on or before `date`.
    pub fn at_or_before(&self, date: NaiveDate) -> Option<&PricePoint> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).map(|i| &self.points[i])
    }

    /// Builds a series of consecutive calendar days starting at `start`.
    #[cfg(test)]
    pub(crate) fn from_closes(symbol: &str, start: NaiveDate, closes: &[f64]) -> Self {
        let raw = closes.iter().enumerate().map(|(i, close)| {
            let date = start + chrono::Duration::days(i as i64);
            RawPricePoint::new(RawDate::Text(date.to_string()), Some(*close))
        });
        Self::normalize(symbol, raw)
    }
}
