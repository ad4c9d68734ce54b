//! Daily price sources.
//!
//! A `PriceSource` returns the trailing daily closes for a ticker. The Yahoo
//! implementation talks to the public chart API; the in-memory one serves
//! pre-loaded series.

mod yahoo;

pub use yahoo::{YahooPriceSource, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};

use crate::{Error, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One daily close.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Close price, split/dividend adjusted when the source provides it
    pub close: f64,
}

/// Daily closes for a ticker, ascending by date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSeries {
    /// Ticker symbol
    pub ticker: String,
    /// Price points in ascending date order
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create a series, sorting points by date.
    pub fn new(ticker: &str, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self {
            ticker: ticker.to_uppercase(),
            points,
        }
    }

    /// Close prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Number of price points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no prices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points within `days` calendar days of the latest date.
    pub fn trailing(&self, days: u32) -> PriceSeries {
        let Some(last) = self.points.last() else {
            return self.clone();
        };

        let cutoff = last.date.checked_sub_days(Days::new(u64::from(days)));
        let points = self
            .points
            .iter()
            .filter(|p| cutoff.map(|c| p.date > c).unwrap_or(true))
            .copied()
            .collect();

        PriceSeries {
            ticker: self.ticker.clone(),
            points,
        }
    }
}

/// A source of daily price history.
pub trait PriceSource {
    /// Fetch daily prices for `ticker` covering the trailing `days` calendar days.
    fn daily_prices(&self, ticker: &str, days: u32) -> Result<PriceSeries>;
}

/// Price source backed by series held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPriceSource {
    series: HashMap<String, PriceSeries>,
}

impl MemoryPriceSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a series.
    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.ticker.clone(), series);
    }

    /// Add closes on consecutive calendar days ending at `end`.
    pub fn insert_closes(&mut self, ticker: &str, closes: &[f64], end: NaiveDate) {
        let count = closes.len() as u64;
        let points = closes
            .iter()
            .enumerate()
            .filter_map(|(i, &close)| {
                end.checked_sub_days(Days::new(count - 1 - i as u64))
                    .map(|date| PricePoint { date, close })
            })
            .collect();

        self.insert(PriceSeries::new(ticker, points));
    }

    /// Builder-style variant of `insert_closes`.
    pub fn with_closes(mut self, ticker: &str, closes: &[f64], end: NaiveDate) -> Self {
        self.insert_closes(ticker, closes, end);
        self
    }
}

impl PriceSource for MemoryPriceSource {
    fn daily_prices(&self, ticker: &str, days: u32) -> Result<PriceSeries> {
        self.series
            .get(&ticker.to_uppercase())
            .map(|s| s.trailing(days))
            .ok_or_else(|| Error::DataUnavailable(format!("no price data for {}", ticker)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_series_sorted_and_closes() {
        let series = PriceSeries::new(
            "aapl",
            vec![
                PricePoint {
                    date: date(2024, 1, 3),
                    close: 12.0,
                },
                PricePoint {
                    date: date(2024, 1, 2),
                    close: 11.0,
                },
            ],
        );

        assert_eq!(series.ticker, "AAPL");
        assert_eq!(series.closes(), vec![11.0, 12.0]);
    }

    #[test]
    fn test_memory_source_trailing_window() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let source = MemoryPriceSource::new().with_closes("AAA", &closes, date(2024, 3, 10));

        let series = source.daily_prices("aaa", 3).unwrap();
        assert_eq!(series.closes(), vec![107.0, 108.0, 109.0]);
        assert_eq!(series.points[0].date, date(2024, 3, 8));

        let all = source.daily_prices("AAA", 365).unwrap();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn test_memory_source_unknown_ticker() {
        let source = MemoryPriceSource::new();
        let result = source.daily_prices("NOPE", 30);
        assert!(matches!(result, Err(Error::DataUnavailable(_))));
    }

    #[test]
    fn test_trailing_empty_series() {
        let series = PriceSeries::new("AAA", Vec::new());
        assert!(series.trailing(30).is_empty());
    }
}
