//! In-memory market data service for tests and offline runs.

use crate::domain::market::{Candle, PriceSeries};
use crate::domain::ports::MarketDataService;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Default)]
pub struct MockMarketDataService {
    series: HashMap<String, PriceSeries>,
}

impl MockMarketDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.series.insert(series.symbol.clone(), series);
        self
    }
}

#[async_trait]
impl MarketDataService for MockMarketDataService {
    async fn get_daily_history(&self, symbol: &str, _range: &str) -> Result<PriceSeries> {
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No mock data registered for {}", symbol))
    }
}

/// Deterministic synthetic daily series: a drifting price with a repeating
/// wobble and uneven volume. Enough structure for every indicator window and
/// for a classifier to find a pattern.
pub fn synthetic_series(symbol: &str, bars: usize) -> PriceSeries {
    let candles = (0..bars)
        .map(|i| {
            let drift = i as f64 * 0.15;
            let wobble = ((i * 7) % 13) as f64 * 0.6 - 3.6;
            let close = 100.0 + drift + wobble;
            let spread = 1.0 + ((i * 3) % 5) as f64 * 0.2;
            Candle {
                timestamp: 1_600_000_000 + 86_400 * i as i64,
                open: close - spread * 0.3,
                high: close + spread,
                low: close - spread,
                close,
                volume: 10_000.0 + ((i * 11) % 17) as f64 * 900.0,
            }
        })
        .collect();
    PriceSeries::new(symbol, candles)
}
