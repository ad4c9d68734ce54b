//! Capital allocation across a portfolio.
//!
//! Weights are proportional to positive Sharpe ratios, with a one-sided cap on
//! names whose volatility is well above the portfolio average.

mod heuristic;

pub use heuristic::{
    allocate, allocate_with, AllocationConfig, MissingMetricPolicy,
    DEFAULT_HIGH_RISK_WEIGHT_CAP, DEFAULT_VOLATILITY_CAP_FACTOR,
};
