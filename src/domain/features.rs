use serde::{Deserialize, Serialize};

/// Ordered list of feature column names.
/// This order is the schema shared between training and inference; a persisted
/// model carries a copy and refuses to score against a different one.
pub const FEATURE_NAMES: &[&str] = &[
    "sma_10",
    "sma_30",
    "ema_12",
    "rsi",
    "macd",
    "macd_signal",
    "stoch_k",
    "bb_upper",
    "bb_middle",
    "bb_lower",
    "atr",
    "obv",
    "volume_ma",
    "returns",
    "volatility",
    "price_range",
    "ma_signal",
    "rsi_signal",
    "volume_spike",
];

/// One bar's worth of indicator output, aligned with the price series by
/// timestamp. `None` marks a rolling window that is not yet fully populated
/// (warm-up) or a degenerate computation (e.g. zero stochastic range).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub timestamp: i64,
    pub sma_10: Option<f64>,
    pub sma_30: Option<f64>,
    pub ema_12: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub stoch_k: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub atr: Option<f64>,
    pub obv: Option<f64>,
    pub volume_ma: Option<f64>,
    pub returns: Option<f64>,
    pub volatility: Option<f64>,
    pub price_range: Option<f64>,
    pub ma_signal: Option<f64>,
    pub rsi_signal: Option<f64>,
    pub volume_spike: Option<f64>,
}

impl FeatureRow {
    fn columns(&self) -> [Option<f64>; 19] {
        [
            self.sma_10,
            self.sma_30,
            self.ema_12,
            self.rsi,
            self.macd,
            self.macd_signal,
            self.stoch_k,
            self.bb_upper,
            self.bb_middle,
            self.bb_lower,
            self.atr,
            self.obv,
            self.volume_ma,
            self.returns,
            self.volatility,
            self.price_range,
            self.ma_signal,
            self.rsi_signal,
            self.volume_spike,
        ]
    }

    /// True when every column is populated (all warm-up windows filled).
    pub fn is_complete(&self) -> bool {
        self.columns().iter().all(|c| c.is_some())
    }

    /// Values in `FEATURE_NAMES` order. Residual missing values are filled
    /// with 0.0, matching the training-time convention.
    pub fn to_vector(&self) -> Vec<f64> {
        self.columns().iter().map(|c| c.unwrap_or(0.0)).collect()
    }
}
