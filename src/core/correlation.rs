//! Pairwise Pearson correlation of daily returns across assets.

use super::returns::ReturnSeries;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Fewer shared returns than this and the coefficient is reported as unavailable.
pub const MIN_SHARED_RETURNS: usize = 3;

/// How two return series are paired before correlating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Only returns dated on the same calendar day are paired.
    #[default]
    ByDate,
    /// The trailing `min(lenA, lenB)` returns are paired by position, whatever their dates.
    Positional,
}

/// Pearson correlation coefficient, clamped into `[-1, 1]`.
///
/// `None` when the inputs differ in length, are too short, or either side has no variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < MIN_SHARED_RETURNS {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (cov, var_x, var_y) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0, 0.0), |(cov, var_x, var_y), (a, b)| {
            let (dx, dy) = (a - mean_x, b - mean_y);
            (cov + dx * dy, var_x + dx * dx, var_y + dy * dy)
        });

    let (std_x, std_y) = (var_x.sqrt(), var_y.sqrt());
    if std_x < f64::EPSILON || std_y < f64::EPSILON {
        return None;
    }

    let r = cov / (std_x * std_y);
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Pairs the two series according to `alignment`.
pub fn align(a: &ReturnSeries, b: &ReturnSeries, alignment: Alignment) -> (Vec<f64>, Vec<f64>) {
    match alignment {
        Alignment::Positional => {
            let k = a.len().min(b.len());
            (a.last_values(k), b.last_values(k))
        }
        Alignment::ByDate => {
            let by_date: HashMap<_, _> = b.returns().iter().map(|r| (r.date, r.value)).collect();
            a.returns()
                .iter()
                .filter_map(|r| by_date.get(&r.date).map(|other| (r.value, *other)))
                .unzip()
        }
    }
}

pub fn correlation(a: &ReturnSeries, b: &ReturnSeries, alignment: Alignment) -> Option<f64> {
    let (x, y) = align(a, b, alignment);
    pearson(&x, &y)
}

/// Square, symmetric matrix with a unit diagonal. Off-diagonal entries are `None` when
/// there is not enough overlapping data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub symbols: Vec<String>,
    pub alignment: Alignment,
    entries: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub pairs: usize,
}

impl CorrelationMatrix {
    pub fn build(assets: &[(&str, &ReturnSeries)], alignment: Alignment) -> Self {
        let n = assets.len();
        let mut entries = vec![vec![None; n]; n];

        for i in 0..n {
            entries[i][i] = Some(1.0);
            for j in (i + 1)..n {
                let value = correlation(assets[i].1, assets[j].1, alignment);
                debug!(
                    a = assets[i].0,
                    b = assets[j].0,
                    ?value,
                    "Computed pairwise correlation"
                );
                entries[i][j] = value;
                entries[j][i] = value;
            }
        }

        Self {
            symbols: assets.iter().map(|(s, _)| s.to_string()).collect(),
            alignment,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.entries
            .get(i)
            .and_then(|row| row.get(j))
            .copied()
            .flatten()
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.entries
    }

    /// Summary over the available off-diagonal pairs; `None` when there are none.
    pub fn stats(&self) -> Option<CorrelationStats> {
        let values: Vec<f64> = (0..self.len())
            .flat_map(|i| ((i + 1)..self.len()).map(move |j| (i, j)))
            .filter_map(|(i, j)| self.get(i, j))
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(CorrelationStats {
            average: values.iter().sum::<f64>() / values.len() as f64,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            pairs: values.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::{RawDate, RawPricePoint, TimeSeries};
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn returns_from(start: NaiveDate, closes: &[f64]) -> ReturnSeries {
        ReturnSeries::from_series(&TimeSeries::from_closes("T", start, closes))
    }

    #[test]
    fn test_pearson_perfect_relationships() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let z = [4.0, 3.0, 2.0, 1.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_unavailable_cases() {
        assert!(pearson(&[1.0, 2.0], &[1.0, 2.0]).is_none());
        assert!(pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_none());
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_positional_alignment_uses_trailing_returns() {
        let a = returns_from(start(), &[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let b = returns_from(start(), &[1.0, 2.0, 3.0]);
        let (x, y) = align(&a, &b, Alignment::Positional);
        assert_eq!(x.len(), 2);
        assert_eq!(x, a.last_values(2));
        assert_eq!(y, b.values());
    }

    #[test]
    fn test_date_alignment_pairs_shared_days() {
        let a = returns_from(start(), &[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        // Starts three days later, so only the overlapping dates pair up.
        let later = start() + chrono::Duration::days(3);
        let b = returns_from(later, &[13.0, 14.0, 15.0, 16.0]);

        let (x, y) = align(&a, &b, Alignment::ByDate);
        assert_eq!(x, a.last_values(2));
        assert_eq!(y, b.values()[..2].to_vec());
    }

    #[test]
    fn test_date_alignment_ignores_unmatched_gaps() {
        let raw = |d: &str, c: f64| RawPricePoint::new(RawDate::Text(d.to_string()), Some(c));
        let a = ReturnSeries::from_series(&TimeSeries::normalize(
            "A",
            vec![
                raw("2024-01-01", 10.0),
                raw("2024-01-02", 11.0),
                raw("2024-01-03", 10.0),
                raw("2024-01-04", 12.0),
                raw("2024-01-05", 13.0),
            ],
        ));
        let b = ReturnSeries::from_series(&TimeSeries::normalize(
            "B",
            vec![
                raw("2024-01-01", 20.0),
                raw("2024-01-02", 22.0),
                raw("2024-01-04", 24.0),
                raw("2024-01-05", 26.0),
            ],
        ));
        let (x, _) = align(&a, &b, Alignment::ByDate);
        // b has returns on 01-02, 01-04, 01-05; a has all four days.
        assert_eq!(x.len(), 3);
        let (x, _) = align(&a, &b, Alignment::Positional);
        assert_eq!(x.len(), 3);
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let series = [
            returns_from(start(), &[10.0, 11.0, 10.5, 12.0, 12.5, 12.0, 13.0]),
            returns_from(start(), &[20.0, 19.0, 19.5, 18.0, 18.2, 18.9, 18.1]),
            returns_from(start(), &[5.0, 5.1, 5.3, 5.2, 5.6, 5.5, 5.9]),
            returns_from(start(), &[7.0]),
        ];
        let assets: Vec<(&str, &ReturnSeries)> = ["A", "B", "C", "D"]
            .into_iter()
            .zip(series.iter())
            .collect();
        let matrix = CorrelationMatrix::build(&assets, Alignment::ByDate);

        assert_eq!(matrix.len(), 4);
        for i in 0..4 {
            assert_eq!(matrix.get(i, i), Some(1.0));
            for j in 0..4 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
                if let Some(v) = matrix.get(i, j) {
                    assert!((-1.0..=1.0).contains(&v));
                }
            }
        }
        // D has no returns: unavailable against everyone else, but its diagonal is still 1.
        assert!(matrix.get(0, 3).is_none());
        assert_eq!(matrix.get(3, 3), Some(1.0));
        assert!(matrix.get(0, 1).is_some());
    }

    #[test]
    fn test_matrix_stats() {
        let a = returns_from(start(), &[1.0, 2.0, 3.0, 5.0, 8.0]);
        let b = returns_from(start(), &[2.0, 4.0, 6.0, 10.0, 16.0]);
        let matrix = CorrelationMatrix::build(&[("A", &a), ("B", &b)], Alignment::ByDate);
        let stats = matrix.stats().unwrap();
        assert_eq!(stats.pairs, 1);
        assert!((stats.average - 1.0).abs() < 1e-9);

        let single = CorrelationMatrix::build(&[("A", &a)], Alignment::ByDate);
        assert!(single.stats().is_none());
    }
}
