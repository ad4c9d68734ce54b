//! Optimizer Core - Sharpe-weighted portfolio allocation.
//!
//! This crate provides the pieces of the portfolio optimizer:
//!
//! - **Metrics**: total return, volatility and Sharpe ratio from daily prices
//! - **Price sources**: Yahoo Finance chart API and an in-memory source
//! - **Analysis**: per-ticker metrics over the 6m / 1y / 5y horizons
//! - **Allocation**: Sharpe-weighted weights with a volatility cap
//!
//! # Example
//!
//! ```rust
//! use optimizer_core::{allocate, MetricsRow};
//!
//! let table = vec![
//!     MetricsRow::new("AAA", 1.0, 0.01),
//!     MetricsRow::new("BBB", 0.5, 0.01),
//! ];
//!
//! let rows = allocate(&table, 1000.0, 2.0).unwrap();
//! assert!((rows[0].allocation_amount - 666.666_666).abs() < 0.001);
//! ```

pub mod allocation;
pub mod analysis;
pub mod config;
pub mod metrics;
pub mod provider;
pub mod types;

// Re-export commonly used types
pub use types::{
    Allocation, AllocationRow, ApiResponse, Horizon, HorizonMetrics, MetricsRow, PortfolioTable,
    TickerAnalysis,
};

// Re-export main functionality
pub use allocation::{allocate, allocate_with, AllocationConfig, MissingMetricPolicy};
pub use analysis::{analyze_portfolio, parse_tickers, PortfolioAnalysis};
pub use config::Config;
pub use metrics::{daily_returns, sharpe_ratio, total_return, volatility, SeriesMetrics};
pub use provider::{MemoryPriceSource, PricePoint, PriceSeries, PriceSource, YahooPriceSource};
pub use types::HORIZONS;

/// Error types for optimizer-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing metric: {0}")]
    MissingMetric(String),

    #[error("Unknown horizon: {0}")]
    UnknownHorizon(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
}

/// Result type for optimizer-core operations.
pub type Result<T> = std::result::Result<T, Error>;
