//! Return calculations over a price series.

/// Daily percentage changes between consecutive prices.
///
/// A step whose previous price is zero is skipped, so the result may be
/// shorter than `prices.len() - 1`.
///
/// # Example
///
/// ```rust
/// use optimizer_core::metrics::daily_returns;
///
/// let returns = daily_returns(&[100.0, 110.0, 99.0]);
/// assert!((returns[0] - 0.10).abs() < 1e-12);
/// assert!((returns[1] + 0.10).abs() < 1e-12);
/// ```
pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Total return from the first to the last price, as a decimal.
///
/// Returns `None` for an empty series or a zero starting price.
pub fn total_return(prices: &[f64]) -> Option<f64> {
    let start = *prices.first()?;
    let end = *prices.last()?;

    if start == 0.0 {
        return None;
    }

    Some((end - start) / start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_daily_returns() {
        let returns = daily_returns(&[100.0, 105.0, 110.25]);
        assert_eq!(returns.len(), 2);
        assert_relative_eq!(returns[0], 0.05, epsilon = 1e-12);
        assert_relative_eq!(returns[1], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_daily_returns_short_series() {
        assert!(daily_returns(&[]).is_empty());
        assert!(daily_returns(&[100.0]).is_empty());
    }

    #[test]
    fn test_daily_returns_skips_zero_price() {
        let returns = daily_returns(&[0.0, 10.0, 11.0]);
        assert_eq!(returns.len(), 1);
        assert_relative_eq!(returns[0], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_total_return() {
        let ret = total_return(&[100.0, 90.0, 120.0]).unwrap();
        assert_relative_eq!(ret, 0.20, epsilon = 1e-12);
    }

    #[test]
    fn test_total_return_unavailable() {
        assert!(total_return(&[]).is_none());
        assert!(total_return(&[0.0, 10.0]).is_none());
        assert_eq!(total_return(&[50.0]), Some(0.0));
    }
}
