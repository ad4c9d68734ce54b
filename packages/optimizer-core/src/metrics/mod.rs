//! Price-series metrics.
//!
//! Provides daily returns, total-period return, volatility and the Sharpe ratio
//! used to build the allocation table.

mod returns;
mod risk;

pub use returns::{daily_returns, total_return};
pub use risk::{mean, sharpe_ratio, volatility, SeriesMetrics, DEFAULT_RISK_FREE_RATE};
