//! Core data types for the portfolio optimizer.

use serde::{Deserialize, Serialize};

/// A lookback horizon: a display label and a trailing window in calendar days.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Horizon {
    /// Short label such as "1y"
    pub label: &'static str,
    /// Trailing calendar days of price history
    pub days: u32,
}

/// Horizons analyzed by default, shortest first.
pub const HORIZONS: [Horizon; 3] = [
    Horizon {
        label: "6m",
        days: 180,
    },
    Horizon {
        label: "1y",
        days: 365,
    },
    Horizon {
        label: "5y",
        days: 1825,
    },
];

impl Horizon {
    /// Look up a horizon by label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Horizon> {
        let label = label.trim().to_lowercase();
        HORIZONS.iter().copied().find(|h| h.label == label)
    }
}

/// Metrics for one ticker at a fixed horizon, as consumed by the allocator.
///
/// `None` marks a metric the provider could not compute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsRow {
    /// Ticker symbol (uppercase)
    pub ticker: String,
    /// Sharpe-like ratio of daily returns
    pub sharpe: Option<f64>,
    /// Standard deviation of daily returns
    pub volatility: Option<f64>,
}

impl MetricsRow {
    /// Create a row with both metrics available.
    pub fn new(ticker: &str, sharpe: f64, volatility: f64) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            sharpe: Some(sharpe),
            volatility: Some(volatility),
        }
    }

    /// Create a row that may be missing either metric.
    pub fn partial(ticker: &str, sharpe: Option<f64>, volatility: Option<f64>) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            sharpe,
            volatility,
        }
    }

    /// Sharpe value if present and finite.
    pub fn usable_sharpe(&self) -> Option<f64> {
        self.sharpe.filter(|s| s.is_finite())
    }

    /// Volatility value if present and finite.
    pub fn usable_volatility(&self) -> Option<f64> {
        self.volatility.filter(|v| v.is_finite())
    }

    /// Whether both metrics are usable.
    pub fn is_complete(&self) -> bool {
        self.usable_sharpe().is_some() && self.usable_volatility().is_some()
    }
}

/// Ordered metrics table, one row per requested ticker in input order.
pub type PortfolioTable = Vec<MetricsRow>;

/// One line of an allocation result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationRow {
    /// Ticker symbol
    pub ticker: String,
    /// Sharpe value used for weighting
    pub sharpe: f64,
    /// Volatility value used for the risk cap
    pub volatility: f64,
    /// Fraction of the investment, in [0, 1]
    pub weight: f64,
    /// Dollar amount (weight * investment)
    pub allocation_amount: f64,
}

/// Full allocation result with the rows the policy left out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Allocation {
    /// Allocated rows in input order
    pub rows: Vec<AllocationRow>,
    /// Tickers dropped because a metric was unavailable
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<String>,
    /// Total investment distributed across `rows`
    pub investment: f64,
    /// Mean volatility the risk cap was measured against
    pub average_volatility: f64,
}

impl Allocation {
    /// Sum of all weights (1.0 within floating-point tolerance).
    pub fn total_weight(&self) -> f64 {
        self.rows.iter().map(|r| r.weight).sum()
    }

    /// Sum of all dollar allocations.
    pub fn total_allocated(&self) -> f64 {
        self.rows.iter().map(|r| r.allocation_amount).sum()
    }
}

/// Metrics for one ticker over one horizon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HorizonMetrics {
    /// Horizon label ("6m", "1y", "5y")
    pub label: String,
    /// Lookback window in calendar days
    pub days: u32,
    /// Total-period return as a decimal
    pub total_return: Option<f64>,
    /// Standard deviation of daily returns
    pub volatility: Option<f64>,
    /// Sharpe-like ratio of daily returns
    pub sharpe: Option<f64>,
}

impl HorizonMetrics {
    /// Metrics for a horizon whose price data was unavailable.
    pub fn unavailable(horizon: Horizon) -> Self {
        Self {
            label: horizon.label.to_string(),
            days: horizon.days,
            total_return: None,
            volatility: None,
            sharpe: None,
        }
    }
}

/// All horizon metrics for one ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickerAnalysis {
    /// Ticker symbol
    pub ticker: String,
    /// One entry per analyzed horizon
    pub horizons: Vec<HorizonMetrics>,
}

impl TickerAnalysis {
    /// Metrics for a horizon label, if it was analyzed.
    pub fn horizon(&self, label: &str) -> Option<&HorizonMetrics> {
        self.horizons.iter().find(|h| h.label == label)
    }
}

/// Output envelope used by the CLI's JSON mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_lookup() {
        assert_eq!(Horizon::from_label("1y").map(|h| h.days), Some(365));
        assert_eq!(Horizon::from_label(" 6M ").map(|h| h.days), Some(180));
        assert_eq!(Horizon::from_label("5y").map(|h| h.days), Some(1825));
        assert!(Horizon::from_label("3y").is_none());
    }

    #[test]
    fn test_metrics_row_new() {
        let row = MetricsRow::new("aapl", 0.8, 0.02);
        assert_eq!(row.ticker, "AAPL");
        assert!(row.is_complete());
    }

    #[test]
    fn test_metrics_row_non_finite_is_unusable() {
        let row = MetricsRow::partial("AAPL", Some(f64::NAN), Some(0.02));
        assert!(row.usable_sharpe().is_none());
        assert!(!row.is_complete());

        let row = MetricsRow::partial("AAPL", Some(0.5), None);
        assert!(!row.is_complete());
    }

    #[test]
    fn test_metrics_row_json() {
        let json = r#"{"ticker":"MSFT","sharpe":null,"volatility":0.015}"#;
        let row: MetricsRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.ticker, "MSFT");
        assert!(row.sharpe.is_none());
        assert_eq!(row.volatility, Some(0.015));
    }

    #[test]
    fn test_allocation_totals() {
        let allocation = Allocation {
            rows: vec![AllocationRow {
                ticker: "AAPL".to_string(),
                sharpe: 1.0,
                volatility: 0.01,
                weight: 1.0,
                allocation_amount: 500.0,
            }],
            excluded: Vec::new(),
            investment: 500.0,
            average_volatility: 0.01,
        };

        assert_eq!(allocation.total_weight(), 1.0);
        assert_eq!(allocation.total_allocated(), 500.0);
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
