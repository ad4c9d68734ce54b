//! Yahoo Finance chart API price source.

use super::{PricePoint, PriceSeries, PriceSource};
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::time::Duration as StdDuration;

/// Public Yahoo Finance query host.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo rejects requests without a browser-like user agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Price source backed by the Yahoo Finance v8 chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooPriceSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl YahooPriceSource {
    /// Create a source for the given host and user agent.
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a source for the public Yahoo host.
    pub fn public() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL, DEFAULT_USER_AGENT)
    }

    /// Fetch daily prices between `start` and `end`.
    pub fn fetch_range(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries> {
        let ticker = ticker.to_uppercase();
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);

        tracing::info!(%ticker, %start, %end, "Downloading price history");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", start.timestamp().to_string()),
                ("period2", end.timestamp().to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits".to_string()),
            ])
            .send()?;

        let status = response.status();
        let body = response.text()?;

        let chart: ChartResponse = match serde_json::from_str(&body) {
            Ok(chart) => chart,
            Err(_) if !status.is_success() => {
                return Err(Error::DataUnavailable(format!(
                    "{} request returned {}",
                    ticker, status
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let series = parse_chart(&ticker, chart)?;
        tracing::info!(%ticker, points = series.len(), "Fetched price history");

        Ok(series)
    }
}

impl PriceSource for YahooPriceSource {
    fn daily_prices(&self, ticker: &str, days: u32) -> Result<PriceSeries> {
        let end = Utc::now();
        let start = end - Duration::days(i64::from(days));
        self.fetch_range(ticker, start, end)
    }
}

/// Convert a chart payload into a price series.
///
/// Adjusted closes are preferred; bars without a close are skipped.
fn parse_chart(ticker: &str, response: ChartResponse) -> Result<PriceSeries> {
    if let Some(error) = response.chart.error {
        return Err(Error::DataUnavailable(format!(
            "{}: {} - {}",
            ticker, error.code, error.description
        )));
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| Error::DataUnavailable(format!("{}: empty chart result", ticker)))?;

    let timestamps = data.timestamp.unwrap_or_default();

    let adjusted = data
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .map(|a| a.adjclose);
    let closes = match adjusted {
        Some(adj) if !adj.is_empty() => adj,
        _ => {
            tracing::debug!(%ticker, "No adjusted closes, using raw closes");
            data.indicators
                .quote
                .into_iter()
                .next()
                .map(|q| q.close)
                .unwrap_or_default()
        }
    };

    if timestamps.len() != closes.len() {
        tracing::warn!(
            %ticker,
            timestamps = timestamps.len(),
            closes = closes.len(),
            "Chart arrays differ in length, keeping the paired prefix"
        );
    }

    let points: Vec<PricePoint> = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let date = DateTime::from_timestamp(ts, 0)?.date_naive();
            close
                .filter(|c| c.is_finite())
                .map(|close| PricePoint { date, close })
        })
        .collect();

    if points.is_empty() {
        return Err(Error::DataUnavailable(format!(
            "{}: no price data in range",
            ticker
        )));
    }

    Ok(PriceSeries::new(ticker, points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(ticker: &str, json: &str) -> Result<PriceSeries> {
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        parse_chart(ticker, response)
    }

    #[test]
    fn test_parse_prefers_adjusted_close() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "AAPL"},
                    "timestamp": [1704205800, 1704292200, 1704378600],
                    "indicators": {
                        "quote": [{"close": [185.64, 184.25, 181.91]}],
                        "adjclose": [{"adjclose": [184.9, null, 181.2]}]
                    }
                }],
                "error": null
            }
        }"#;

        let series = parse("AAPL", json).unwrap();

        assert_eq!(series.closes(), vec![184.9, 181.2]);
        assert_eq!(
            series.points[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_parse_falls_back_to_close() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704205800, 1704292200],
                    "indicators": {"quote": [{"close": [10.0, 11.0]}]}
                }],
                "error": null
            }
        }"#;

        let series = parse("XYZ", json).unwrap();
        assert_eq!(series.closes(), vec![10.0, 11.0]);
    }

    #[test]
    fn test_parse_api_error() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;

        match parse("NOPE", json) {
            Err(Error::DataUnavailable(msg)) => assert!(msg.contains("Not Found")),
            other => panic!("expected DataUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_no_timestamps() {
        let json = r#"{
            "chart": {
                "result": [{"indicators": {"quote": [{}]}}],
                "error": null
            }
        }"#;

        assert!(matches!(parse("NEW", json), Err(Error::DataUnavailable(_))));
    }

    #[test]
    fn test_parse_mismatched_lengths_keeps_paired_prefix() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704205800, 1704292200, 1704378600],
                    "indicators": {"quote": [{"close": [185.64, 184.25]}]}
                }],
                "error": null
            }
        }"#;

        let series = parse("AAPL", json).unwrap();
        assert_eq!(series.closes(), vec![185.64, 184.25]);
        assert_eq!(
            series.points[1].date,
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
    }

    #[test]
    #[ignore]
    fn test_fetch_live() {
        let source = YahooPriceSource::public().unwrap();
        let series = source.daily_prices("AAPL", 30).unwrap();
        assert!(!series.is_empty());
    }
}
