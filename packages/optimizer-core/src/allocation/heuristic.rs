//! Sharpe-weighted allocation with a volatility cap.

use crate::types::{Allocation, AllocationRow, MetricsRow};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A ticker this many times more volatile than the average is high risk.
pub const DEFAULT_VOLATILITY_CAP_FACTOR: f64 = 2.0;

/// Maximum pre-renormalization weight of a high-risk ticker.
pub const DEFAULT_HIGH_RISK_WEIGHT_CAP: f64 = 0.15;

/// How rows with an unavailable Sharpe or volatility are handled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingMetricPolicy {
    /// Leave the row out of the allocation and report it as excluded.
    #[default]
    Drop,
    /// Treat a missing Sharpe as 0 and a missing volatility as the cohort mean.
    Neutral,
    /// Fail the allocation.
    Reject,
}

impl fmt::Display for MissingMetricPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Drop => "drop",
            Self::Neutral => "neutral",
            Self::Reject => "reject",
        };
        f.write_str(name)
    }
}

impl FromStr for MissingMetricPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "neutral" => Ok(Self::Neutral),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown missing-metric policy '{}' (expected drop, neutral or reject)",
                other
            )),
        }
    }
}

/// Tunable parameters of the allocation heuristic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AllocationConfig {
    /// Volatility above `factor * average` marks a ticker as high risk
    pub volatility_cap_factor: f64,
    /// Weight ceiling applied to high-risk tickers before renormalization
    pub high_risk_weight_cap: f64,
    /// Handling of rows with unavailable metrics
    pub missing_metrics: MissingMetricPolicy,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            volatility_cap_factor: DEFAULT_VOLATILITY_CAP_FACTOR,
            high_risk_weight_cap: DEFAULT_HIGH_RISK_WEIGHT_CAP,
            missing_metrics: MissingMetricPolicy::default(),
        }
    }
}

impl AllocationConfig {
    /// Default config with a custom volatility cap factor.
    pub fn with_cap_factor(volatility_cap_factor: f64) -> Self {
        Self {
            volatility_cap_factor,
            ..Default::default()
        }
    }

    /// Reject a non-positive cap factor or a weight cap outside (0, 1].
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.volatility_cap_factor.is_finite() || self.volatility_cap_factor <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "volatility cap factor must be positive, got {}",
                self.volatility_cap_factor
            )));
        }

        if !(self.high_risk_weight_cap > 0.0 && self.high_risk_weight_cap <= 1.0) {
            return Err(Error::InvalidInput(format!(
                "high-risk weight cap must be in (0, 1], got {}",
                self.high_risk_weight_cap
            )));
        }

        Ok(())
    }
}

/// Allocate `investment` across `table` with the default missing-metric policy.
///
/// Rows with unavailable metrics are dropped from the result.
///
/// # Example
///
/// ```rust
/// use optimizer_core::{allocate, MetricsRow};
///
/// let table = vec![
///     MetricsRow::new("AAA", -0.2, 0.01),
///     MetricsRow::new("BBB", -0.1, 0.02),
/// ];
///
/// // No positive Sharpe: fall back to equal weights
/// let rows = allocate(&table, 1000.0, 2.0).unwrap();
/// assert!((rows[0].weight - 0.5).abs() < 1e-12);
/// ```
pub fn allocate(
    table: &[MetricsRow],
    investment: f64,
    volatility_cap_factor: f64,
) -> Result<Vec<AllocationRow>> {
    let config = AllocationConfig::with_cap_factor(volatility_cap_factor);
    Ok(allocate_with(table, investment, &config)?.rows)
}

/// Allocate `investment` across `table`.
///
/// # Arguments
///
/// * `table` - Per-ticker metrics, in the order the result should keep
/// * `investment` - Total amount to distribute (must be positive)
/// * `config` - Cap factor, weight cap and missing-metric policy
///
/// # Returns
///
/// An `Allocation` whose weights sum to 1 and whose amounts sum to
/// `investment`, or an error for an empty table, a non-positive investment,
/// invalid parameters, or metrics the policy cannot resolve.
pub fn allocate_with(
    table: &[MetricsRow],
    investment: f64,
    config: &AllocationConfig,
) -> Result<Allocation> {
    if table.is_empty() {
        return Err(Error::InvalidInput(
            "Portfolio table must contain at least one ticker".to_string(),
        ));
    }

    if !investment.is_finite() || investment <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "Investment must be positive, got {}",
            investment
        )));
    }

    config.validate()?;

    let (inputs, excluded) = resolve_metrics(table, config.missing_metrics)?;

    if let Some(bad) = inputs.iter().find(|r| r.volatility < 0.0) {
        return Err(Error::InvalidInput(format!(
            "Volatility of {} is negative: {}",
            bad.ticker, bad.volatility
        )));
    }

    let n = inputs.len() as f64;

    // Proportional to positive Sharpe, or equal weights when none is positive
    let positive_sharpe: Vec<f64> = inputs.iter().map(|r| r.sharpe.max(0.0)).collect();
    let max_sharpe = positive_sharpe.iter().copied().fold(0.0, f64::max);

    let mut weights: Vec<f64> = if max_sharpe == 0.0 {
        tracing::debug!("No positive Sharpe ratios, using equal weights");
        vec![1.0 / n; inputs.len()]
    } else {
        // Scaled into [0, 1] first so the sum stays finite for huge ratios
        let scaled: Vec<f64> = positive_sharpe.iter().map(|s| s / max_sharpe).collect();
        let scaled_sum: f64 = scaled.iter().sum();
        scaled.into_iter().map(|s| s / scaled_sum).collect()
    };

    let average_volatility = finite_mean(inputs.iter().map(|r| r.volatility), inputs.len());
    let threshold = config.volatility_cap_factor * average_volatility;

    for (weight, row) in weights.iter_mut().zip(&inputs) {
        if row.volatility > threshold {
            tracing::debug!(
                ticker = %row.ticker,
                volatility = row.volatility,
                threshold,
                "Capping high-risk weight"
            );
            *weight = weight.min(config.high_risk_weight_cap);
        }
    }

    let weight_sum: f64 = weights.iter().sum();
    let rows = inputs
        .into_iter()
        .zip(weights)
        .map(|(row, weight)| {
            let weight = weight / weight_sum;
            AllocationRow {
                ticker: row.ticker,
                sharpe: row.sharpe,
                volatility: row.volatility,
                weight,
                allocation_amount: weight * investment,
            }
        })
        .collect();

    Ok(Allocation {
        rows,
        excluded,
        investment,
        average_volatility,
    })
}

/// Mean of finite values, dividing before summing so large inputs do not overflow.
fn finite_mean(values: impl Iterator<Item = f64>, len: usize) -> f64 {
    let n = len as f64;
    values.map(|v| v / n).sum()
}

/// A row with both metrics resolved to numbers.
struct ResolvedRow {
    ticker: String,
    sharpe: f64,
    volatility: f64,
}

/// Apply the missing-metric policy, returning usable rows and dropped tickers.
fn resolve_metrics(
    table: &[MetricsRow],
    policy: MissingMetricPolicy,
) -> Result<(Vec<ResolvedRow>, Vec<String>)> {
    let mut resolved = Vec::with_capacity(table.len());
    let mut excluded = Vec::new();

    match policy {
        MissingMetricPolicy::Drop => {
            for row in table {
                match (row.usable_sharpe(), row.usable_volatility()) {
                    (Some(sharpe), Some(volatility)) => resolved.push(ResolvedRow {
                        ticker: row.ticker.clone(),
                        sharpe,
                        volatility,
                    }),
                    _ => {
                        tracing::warn!(
                            ticker = %row.ticker,
                            "Dropping ticker with missing metrics"
                        );
                        excluded.push(row.ticker.clone());
                    }
                }
            }

            if resolved.is_empty() {
                return Err(Error::MissingMetric(format!(
                    "No ticker has both Sharpe and volatility: {}",
                    excluded.join(", ")
                )));
            }
        }
        MissingMetricPolicy::Neutral => {
            let available: Vec<f64> = table.iter().filter_map(|r| r.usable_volatility()).collect();
            let fallback_volatility = if available.is_empty() {
                0.0
            } else {
                finite_mean(available.iter().copied(), available.len())
            };

            for row in table {
                resolved.push(ResolvedRow {
                    ticker: row.ticker.clone(),
                    sharpe: row.usable_sharpe().unwrap_or(0.0),
                    volatility: row.usable_volatility().unwrap_or(fallback_volatility),
                });
            }
        }
        MissingMetricPolicy::Reject => {
            let missing: Vec<&str> = table
                .iter()
                .filter(|r| !r.is_complete())
                .map(|r| r.ticker.as_str())
                .collect();

            if !missing.is_empty() {
                return Err(Error::MissingMetric(missing.join(", ")));
            }

            for row in table {
                resolved.push(ResolvedRow {
                    ticker: row.ticker.clone(),
                    sharpe: row.usable_sharpe().unwrap_or_default(),
                    volatility: row.usable_volatility().unwrap_or_default(),
                });
            }
        }
    }

    Ok((resolved, excluded))
}
