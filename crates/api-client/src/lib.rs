use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate};
use core_types::DailyBar;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::ApiError;
use crate::responses::{ChartResponse, ChartResult};

pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::ChartErrorBody;

/// The generic, abstract interface for a historical market-data source.
/// This trait is the contract the fetch command uses, allowing the
/// underlying implementation (live or mock) to be swapped out.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Fetches daily OHLCV bars for a symbol over an inclusive date range.
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, ApiError>;
}

/// A concrete implementation of `MarketDataClient` for the Yahoo Finance
/// v8 chart endpoint (the same API the research notebook's downloader
/// wraps).
#[derive(Clone)]
pub struct YahooChartClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for YahooChartClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooChartClient {
    pub fn new() -> Self {
        // Yahoo rejects requests without a browser-ish user agent.
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (compatible; mras-fetch)"),
        );

        Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .build()
                .expect("Failed to build reqwest client"),
            base_url: "https://query1.finance.yahoo.com".to_string(),
        }
    }
}

#[async_trait]
impl MarketDataClient for YahooChartClient {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, ApiError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        // period2 is exclusive, so push it one day past the requested end.
        let period1 = start
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp()
            .to_string();
        let period2 = (end + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp()
            .to_string();

        tracing::debug!(symbol, %start, %end, "requesting daily bars");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("includeAdjustedClose", "true"),
            ])
            .send()
            .await?;
        let text = response.text().await?;

        let parsed = serde_json::from_str::<ChartResponse>(&text)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;

        if let Some(err) = parsed.chart.error {
            return Err(ApiError::Upstream {
                code: err.code,
                description: err.description,
            });
        }

        let result = parsed
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| {
                ApiError::InvalidData("chart response carried neither result nor error".into())
            })?;

        let bars = bars_from_chart(result)?;
        if bars.is_empty() {
            return Err(ApiError::NoData(symbol.to_string()));
        }
        Ok(bars)
    }
}

/// Converts a chart result into daily bars, skipping rows without a close
/// price (holiday padding). Falls back to the raw close when no adjusted
/// close is published.
fn bars_from_chart(result: ChartResult) -> Result<Vec<DailyBar>, ApiError> {
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::InvalidData("chart result has no quote block".into()))?;
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(close) = slot(&quote.close, i) else {
            continue;
        };
        let date = DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| ApiError::InvalidData(format!("invalid row timestamp: {ts}")))?
            .date_naive();

        bars.push(DailyBar {
            date,
            open: slot(&quote.open, i).unwrap_or(close),
            high: slot(&quote.high, i).unwrap_or(close),
            low: slot(&quote.low, i).unwrap_or(close),
            close,
            adj_close: slot(&adjclose.adjclose, i).unwrap_or(close),
            volume: slot(&quote.volume, i).unwrap_or(0),
        });
    }
    Ok(bars)
}

fn slot<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_rows_and_skips_null_closes() {
        let raw = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1356998400, 1357084800, 1357171200],
                    "indicators": {
                        "quote": [{
                            "open":   [100.0, null, 102.0],
                            "high":   [101.0, null, 103.0],
                            "low":    [99.0,  null, 101.0],
                            "close":  [100.5, null, 102.5],
                            "volume": [1000,  null, 2000]
                        }],
                        "adjclose": [{ "adjclose": [100.5, null, 102.5] }]
                    }
                }],
                "error": null
            }
        }"#;
        let parsed: ChartResponse = serde_json::from_str(raw).unwrap();
        let result = parsed.chart.result.unwrap().remove(0);
        let bars = bars_from_chart(result).unwrap();

        // The all-null middle row (a holiday) is dropped.
        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[0].date,
            NaiveDate::from_ymd_opt(2013, 1, 1).unwrap()
        );
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[1].volume, 2000);
    }

    #[test]
    fn missing_adjclose_falls_back_to_close() {
        let raw = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1356998400],
                    "indicators": { "quote": [{
                        "open": [1.0], "high": [1.0], "low": [1.0],
                        "close": [1.5], "volume": [10]
                    }] }
                }],
                "error": null
            }
        }"#;
        let parsed: ChartResponse = serde_json::from_str(raw).unwrap();
        let result = parsed.chart.result.unwrap().remove(0);
        let bars = bars_from_chart(result).unwrap();
        assert_eq!(bars[0].adj_close, 1.5);
    }

    #[test]
    fn upstream_error_body_deserializes() {
        let raw = r#"{
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        }"#;
        let parsed: ChartResponse = serde_json::from_str(raw).unwrap();
        let err = parsed.chart.error.unwrap();
        assert_eq!(err.code, "Not Found");
    }
}
