//! Per-ticker metrics across lookback horizons.

use crate::metrics::SeriesMetrics;
use crate::provider::PriceSource;
use crate::types::{Horizon, HorizonMetrics, MetricsRow, PortfolioTable, TickerAnalysis};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Split a comma-separated ticker list, trimming and uppercasing each entry.
///
/// # Example
///
/// ```rust
/// use optimizer_core::parse_tickers;
///
/// assert_eq!(parse_tickers(" aapl, msft ,,nvda"), vec!["AAPL", "MSFT", "NVDA"]);
/// ```
pub fn parse_tickers(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Metrics for every requested ticker, in request order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PortfolioAnalysis {
    pub tickers: Vec<TickerAnalysis>,
}

impl PortfolioAnalysis {
    /// Project the Sharpe / volatility table for one horizon label.
    pub fn metrics_table(&self, label: &str) -> Result<PortfolioTable> {
        self.tickers
            .iter()
            .map(|t| {
                t.horizon(label)
                    .map(|h| MetricsRow::partial(&t.ticker, h.sharpe, h.volatility))
                    .ok_or_else(|| Error::UnknownHorizon(label.to_string()))
            })
            .collect()
    }

    /// Labels of the horizons that were analyzed.
    pub fn horizon_labels(&self) -> Vec<&str> {
        self.tickers
            .first()
            .map(|t| t.horizons.iter().map(|h| h.label.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Fetch prices and compute metrics for each ticker and horizon.
///
/// A fetch failure or an empty series is logged and leaves that horizon's
/// metrics unavailable; it never aborts the analysis.
pub fn analyze_portfolio<S: PriceSource + ?Sized>(
    source: &S,
    tickers: &[String],
    horizons: &[Horizon],
    risk_free_rate: f64,
) -> PortfolioAnalysis {
    let tickers = tickers
        .iter()
        .map(|ticker| TickerAnalysis {
            ticker: ticker.clone(),
            horizons: horizons
                .iter()
                .map(|&horizon| analyze_horizon(source, ticker, horizon, risk_free_rate))
                .collect(),
        })
        .collect();

    PortfolioAnalysis { tickers }
}

fn analyze_horizon<S: PriceSource + ?Sized>(
    source: &S,
    ticker: &str,
    horizon: Horizon,
    risk_free_rate: f64,
) -> HorizonMetrics {
    let series = match source.daily_prices(ticker, horizon.days) {
        Ok(series) if !series.is_empty() => series,
        Ok(_) => {
            tracing::warn!(%ticker, horizon = horizon.label, "No price data found");
            return HorizonMetrics::unavailable(horizon);
        }
        Err(e) => {
            tracing::warn!(%ticker, horizon = horizon.label, error = %e, "Price fetch failed");
            return HorizonMetrics::unavailable(horizon);
        }
    };

    let metrics = SeriesMetrics::from_prices(&series.closes(), risk_free_rate);
    if metrics.sharpe.is_none() {
        tracing::warn!(%ticker, horizon = horizon.label, "Sharpe ratio unavailable");
    }

    HorizonMetrics {
        label: horizon.label.to_string(),
        days: horizon.days,
        total_return: metrics.total_return,
        volatility: metrics.volatility,
        sharpe: metrics.sharpe,
    }
}
