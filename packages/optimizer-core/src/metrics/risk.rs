//! Volatility and Sharpe ratio over daily returns.
//!
//! Both metrics are daily figures and are not annualized. Volatility uses the
//! sample standard deviation (n - 1 denominator).

use super::returns::{daily_returns, total_return};
use serde::{Deserialize, Serialize};

/// Annual risk-free rate used when none is configured.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Calendar days used to convert the annual risk-free rate to a daily one.
const DAYS_PER_YEAR: f64 = 365.0;

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation of daily returns.
///
/// Returns `None` with fewer than two observations.
pub fn volatility(returns: &[f64]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }

    // A constant series has no spread; the mean's rounding error must not show up as one
    if returns.iter().all(|&r| r == returns[0]) {
        return Some(0.0);
    }

    let m = mean(returns)?;
    let variance =
        returns.iter().map(|r| (r - m).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;

    Some(variance.sqrt())
}

/// Sharpe-like ratio of daily returns.
///
/// # Arguments
///
/// * `returns` - Daily returns
/// * `risk_free_rate` - Annual risk-free rate (e.g., 0.02 for 2%)
///
/// # Returns
///
/// `(mean daily return - risk_free_rate / 365) / daily volatility`, or `None`
/// when volatility is unavailable or zero.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> Option<f64> {
    let std = volatility(returns)?;
    let m = mean(returns)?;

    // Spread at rounding-noise scale relative to the mean counts as zero
    if std <= f64::EPSILON * m.abs().max(f64::MIN_POSITIVE) {
        return None;
    }

    Some((m - risk_free_rate / DAYS_PER_YEAR) / std)
}

/// Metrics derived from a single price series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct SeriesMetrics {
    /// First-to-last return
    pub total_return: Option<f64>,
    /// Daily return volatility
    pub volatility: Option<f64>,
    /// Daily Sharpe-like ratio
    pub sharpe: Option<f64>,
}

impl SeriesMetrics {
    /// Compute all metrics from a price series in ascending date order.
    pub fn from_prices(prices: &[f64], risk_free_rate: f64) -> Self {
        let returns = daily_returns(prices);

        Self {
            total_return: total_return(prices),
            volatility: volatility(&returns),
            sharpe: sharpe_ratio(&returns, risk_free_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_volatility_sample_std() {
        let returns = vec![0.01, -0.01, 0.02, 0.0];
        let vol = volatility(&returns).unwrap();

        // mean 0.005, squared deviations sum to 5e-4, / 3
        assert_relative_eq!(vol, (5e-4_f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_volatility_insufficient_data() {
        assert!(volatility(&[]).is_none());
        assert!(volatility(&[0.01]).is_none());
    }

    #[test]
    fn test_sharpe_ratio() {
        let returns = vec![0.01, -0.01, 0.02, 0.0];
        let vol = (5e-4_f64 / 3.0).sqrt();

        let sharpe = sharpe_ratio(&returns, 0.0).unwrap();
        assert_relative_eq!(sharpe, 0.005 / vol, epsilon = 1e-12);

        // 3.65% annual is 0.0001 per day
        let sharpe = sharpe_ratio(&returns, 0.0365).unwrap();
        assert_relative_eq!(sharpe, 0.0049 / vol, epsilon = 1e-12);
    }

    #[test]
    fn test_sharpe_ratio_flat_series() {
        let returns: Vec<f64> = (0..20).map(|_| 0.001).collect();
        assert!(sharpe_ratio(&returns, 0.02).is_none());
    }

    #[test]
    fn test_volatility_constant_series_is_zero() {
        assert_eq!(volatility(&[0.001; 20]), Some(0.0));
        assert_eq!(volatility(&[-0.0003; 7]), Some(0.0));
    }

    #[test]
    fn test_sharpe_ratio_negative() {
        let returns = vec![-0.01, -0.02, 0.005, -0.015];
        assert!(sharpe_ratio(&returns, 0.02).unwrap() < 0.0);
    }

    #[test]
    fn test_series_metrics() {
        let prices = vec![100.0, 101.0, 99.0, 102.0, 104.0];
        let metrics = SeriesMetrics::from_prices(&prices, DEFAULT_RISK_FREE_RATE);

        assert_relative_eq!(metrics.total_return.unwrap(), 0.04, epsilon = 1e-12);
        assert!(metrics.volatility.unwrap() > 0.0);
        assert!(metrics.sharpe.unwrap() > 0.0);
    }

    #[test]
    fn test_series_metrics_empty() {
        let metrics = SeriesMetrics::from_prices(&[], DEFAULT_RISK_FREE_RATE);
        assert_eq!(metrics, SeriesMetrics::default());
    }
}
