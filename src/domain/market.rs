use serde::{Deserialize, Serialize};

/// One daily OHLCV bar. Timestamps are epoch seconds (UTC midnight for daily
/// data as delivered by the provider).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    fn is_valid(&self) -> bool {
        self.high >= self.low
            && self.close > 0.0
            && self.volume >= 0.0
            && self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }
}

/// A time-ordered price history for a single instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub candles: Vec<Candle>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Self {
        Self {
            symbol: symbol.into(),
            candles,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Clean a raw provider series: forward-fill non-finite fields from the
    /// previous bar, drop bars that remain invalid (high < low, close <= 0,
    /// negative volume) and drop bars whose timestamp does not advance.
    pub fn sanitize(mut self) -> Self {
        let mut cleaned: Vec<Candle> = Vec::with_capacity(self.candles.len());

        for mut candle in self.candles.drain(..) {
            if let Some(prev) = cleaned.last() {
                // Forward-fill holes left by the provider (partial bars).
                if !candle.open.is_finite() {
                    candle.open = prev.open;
                }
                if !candle.high.is_finite() {
                    candle.high = prev.high;
                }
                if !candle.low.is_finite() {
                    candle.low = prev.low;
                }
                if !candle.close.is_finite() {
                    candle.close = prev.close;
                }
                if !candle.volume.is_finite() {
                    candle.volume = prev.volume;
                }

                if candle.timestamp <= prev.timestamp {
                    continue;
                }
            }

            if candle.is_valid() {
                cleaned.push(candle);
            }
        }

        self.candles = cleaned;
        self
    }
}

/// Predicted next-period direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

/// Strip the exchange suffix for display ("RELIANCE.NS" -> "RELIANCE").
pub fn display_name(symbol: &str) -> &str {
    symbol.strip_suffix(".NS").unwrap_or(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            timestamp: ts,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn sanitize_drops_invalid_bars() {
        let series = PriceSeries::new(
            "TEST",
            vec![
                bar(1, 10.0, 11.0, 9.0, 10.5, 100.0),
                // high < low
                bar(2, 10.0, 9.0, 11.0, 10.0, 100.0),
                // close <= 0
                bar(3, 10.0, 11.0, 9.0, 0.0, 100.0),
                // negative volume
                bar(4, 10.0, 11.0, 9.0, 10.0, -5.0),
                bar(5, 10.0, 11.0, 9.0, 10.2, 120.0),
            ],
        );

        let cleaned = series.sanitize();
        let stamps: Vec<i64> = cleaned.candles.iter().map(|c| c.timestamp).collect();
        assert_eq!(stamps, vec![1, 5]);
    }

    #[test]
    fn sanitize_forward_fills_partial_bars() {
        let series = PriceSeries::new(
            "TEST",
            vec![
                bar(1, 10.0, 11.0, 9.0, 10.5, 100.0),
                bar(2, f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN),
            ],
        );

        let cleaned = series.sanitize();
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned.candles[1].close, 10.5);
        assert_eq!(cleaned.candles[1].volume, 100.0);
    }

    #[test]
    fn sanitize_enforces_increasing_timestamps() {
        let series = PriceSeries::new(
            "TEST",
            vec![
                bar(5, 10.0, 11.0, 9.0, 10.5, 100.0),
                bar(5, 10.0, 11.0, 9.0, 10.6, 100.0),
                bar(4, 10.0, 11.0, 9.0, 10.7, 100.0),
                bar(6, 10.0, 11.0, 9.0, 10.8, 100.0),
            ],
        );

        let cleaned = series.sanitize();
        let stamps: Vec<i64> = cleaned.candles.iter().map(|c| c.timestamp).collect();
        assert_eq!(stamps, vec![5, 6]);
    }

    #[test]
    fn display_name_strips_nse_suffix() {
        assert_eq!(display_name("RELIANCE.NS"), "RELIANCE");
        assert_eq!(display_name("AAPL"), "AAPL");
    }
}
