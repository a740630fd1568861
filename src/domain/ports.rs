use crate::domain::market::PriceSeries;
use anyhow::Result;
use async_trait::async_trait;

// Need async_trait for async functions in traits
#[async_trait]
pub trait MarketDataService: Send + Sync {
    /// Fetch the daily OHLCV history for one instrument over a provider range
    /// string ("2y", "3mo", ...). Errors propagate untouched; callers decide
    /// whether one instrument's failure aborts the batch (it should not).
    async fn get_daily_history(&self, symbol: &str, range: &str) -> Result<PriceSeries>;
}
