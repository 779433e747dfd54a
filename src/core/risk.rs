//! Volatility and risk-adjusted return over a return series.
//!
//! Mean and standard deviation both use the population convention (divide by N).

use super::returns::ReturnSeries;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const VOLATILITY_WINDOW: usize = 30;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let std_dev = variance.sqrt();
    std_dev.is_finite().then_some(std_dev)
}

/// Standard deviation of the latest 30 returns (fewer if the series is shorter), in percent.
pub fn std_dev_30(returns: &ReturnSeries) -> Option<f64> {
    population_std_dev(&returns.last_values(VOLATILITY_WINDOW)).map(|sd| sd * 100.0)
}

/// `mean / std_dev * sqrt(252)` over the whole series. Unavailable for an empty or flat series.
pub fn sharpe_annualized(returns: &ReturnSeries) -> Option<f64> {
    let values = returns.values();
    let mean = mean(&values)?;
    let std_dev = population_std_dev(&values)?;
    if std_dev < f64::EPSILON {
        return None;
    }
    let sharpe = mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt();
    sharpe.is_finite().then_some(sharpe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::TimeSeries;
    use chrono::NaiveDate;

    fn returns_of(closes: &[f64]) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ReturnSeries::from_series(&TimeSeries::from_closes("T", start, closes))
    }

    #[test]
    fn test_example_volatility_and_sharpe() {
        let returns = returns_of(&[100.0, 102.0, 101.0, 105.0, 103.0]);
        let values = returns.values();

        let mean = values.iter().sum::<f64>() / 4.0;
        let sd = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 4.0).sqrt();

        let std_dev = std_dev_30(&returns).unwrap();
        assert!((std_dev - sd * 100.0).abs() < 1e-12);
        assert!((std_dev - 2.3404).abs() < 1e-3);

        let sharpe = sharpe_annualized(&returns).unwrap();
        assert!((sharpe - mean / sd * 252f64.sqrt()).abs() < 1e-9);
        assert!((sharpe - 5.2147).abs() < 1e-3);
    }

    #[test]
    fn test_std_dev_uses_latest_thirty() {
        // 10 volatile returns followed by 30 flat ones.
        let mut closes = vec![100.0];
        for i in 0..10 {
            closes.push(if i % 2 == 0 { 120.0 } else { 100.0 });
        }
        closes.extend(std::iter::repeat_n(100.0, 30));
        let returns = returns_of(&closes);
        assert_eq!(returns.len(), 40);

        assert_eq!(std_dev_30(&returns), Some(0.0));
        assert!(population_std_dev(&returns.values()).unwrap() > 0.0);
    }

    #[test]
    fn test_unavailable_for_empty_returns() {
        let returns = returns_of(&[100.0]);
        assert!(std_dev_30(&returns).is_none());
        assert!(sharpe_annualized(&returns).is_none());
    }

    #[test]
    fn test_sharpe_unavailable_for_zero_volatility() {
        let returns = returns_of(&[50.0, 50.0, 50.0, 50.0]);
        assert_eq!(std_dev_30(&returns), Some(0.0));
        assert!(sharpe_annualized(&returns).is_none());
    }

    #[test]
    fn test_mean_and_std_dev_helpers() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 3.0]), Some(2.0));
        assert_eq!(population_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), Some(2.0));
    }
}
