//! Yahoo Finance market data service.
//!
//! Fetches daily OHLCV history from the v8 chart API. One request per
//! instrument, no retries: provider failures propagate to the caller, which
//! decides whether to skip the instrument. Yahoo has no official API and the
//! response format can change without notice.

use crate::domain::market::{Candle, PriceSeries};
use crate::domain::ports::MarketDataService;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

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
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

pub struct YahooMarketDataService {
    client: reqwest::Client,
    base_url: String,
}

impl YahooMarketDataService {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<Candle>> {
        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) => {
                anyhow::bail!("Provider error for {}: {} ({})", symbol, err.code, err.description)
            }
            (None, None) => anyhow::bail!("Empty chart result for {}", symbol),
        };

        let data = result
            .into_iter()
            .next()
            .with_context(|| format!("Chart result array is empty for {}", symbol))?;

        let timestamps = data
            .timestamp
            .with_context(|| format!("No timestamps in chart response for {}", symbol))?;
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .with_context(|| format!("No quote data in chart response for {}", symbol))?;

        let mut candles = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Bars with no fields at all are non-trading days; skip them.
            // Partially-filled bars go through and are forward-filled by the
            // sanitize pass.
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            candles.push(Candle {
                timestamp: ts,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(f64::NAN),
            });
        }

        Ok(candles)
    }
}

#[async_trait]
impl MarketDataService for YahooMarketDataService {
    async fn get_daily_history(&self, symbol: &str, range: &str) -> Result<PriceSeries> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("range", range), ("interval", "1d")])
            .send()
            .await
            .with_context(|| format!("Failed to fetch history for {}", symbol))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("History fetch for {} failed: HTTP {} {}", symbol, status, body);
        }

        let chart: ChartResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse chart response for {}", symbol))?;

        let candles = Self::parse_response(symbol, chart)?;
        let series = PriceSeries::new(symbol, candles).sanitize();
        if let (Some(first), Some(last)) = (series.candles.first(), series.candles.last()) {
            info!(
                symbol,
                bars = series.len(),
                from = %trading_date(first.timestamp),
                to = %trading_date(last.timestamp),
                "fetched daily history"
            );
        }
        Ok(series)
    }
}

fn trading_date(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
