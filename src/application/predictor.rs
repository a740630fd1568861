//! Live prediction over a portfolio of instruments.
//!
//! Each instrument is resolved, fetched, featurized, and scored independently;
//! every failure becomes a status value on its result line. One bad symbol
//! never takes the batch down.

use crate::application::dataset::latest_complete_row;
use crate::application::indicators;
use crate::application::model::TrainedModel;
use crate::domain::market::Direction;
use crate::domain::ports::MarketDataService;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Outcome of one instrument's inference. Failures are data, not exceptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionStatus {
    Success,
    ModelNotFound,
    NoData,
    InsufficientHistory,
    Failed(String),
}

impl std::fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionStatus::Success => write!(f, "success"),
            PredictionStatus::ModelNotFound => write!(f, "model not found"),
            PredictionStatus::NoData => write!(f, "no data available"),
            PredictionStatus::InsufficientHistory => {
                write!(f, "not enough history to fill indicator windows")
            }
            PredictionStatus::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub symbol: String,
    pub direction: Option<Direction>,
    /// Confidence percentage in [0, 100]; present only on success.
    pub confidence: Option<f64>,
    pub status: PredictionStatus,
}

impl PredictionResult {
    fn failed(symbol: &str, status: PredictionStatus) -> Self {
        Self {
            symbol: symbol.to_string(),
            direction: None,
            confidence: None,
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PredictionStatus::Success
    }
}

/// Aggregate metrics over the successful slice of a portfolio run.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioMetrics {
    pub total_predictions: usize,
    pub bullish_count: usize,
    pub bullish_percentage: f64,
    pub avg_confidence: f64,
}

impl PortfolioMetrics {
    pub fn from_results(results: &[PredictionResult]) -> Option<Self> {
        let successful: Vec<&PredictionResult> =
            results.iter().filter(|r| r.is_success()).collect();
        if successful.is_empty() {
            return None;
        }

        let total = successful.len();
        let bullish = successful
            .iter()
            .filter(|r| r.direction == Some(Direction::Up))
            .count();
        let avg_confidence = successful
            .iter()
            .filter_map(|r| r.confidence)
            .sum::<f64>()
            / total as f64;

        Some(Self {
            total_predictions: total,
            bullish_count: bullish,
            bullish_percentage: bullish as f64 / total as f64 * 100.0,
            avg_confidence,
        })
    }
}

/// Applies persisted models to freshly fetched trailing windows.
pub struct StockPredictor {
    models: HashMap<String, TrainedModel>,
    market_data: Arc<dyn MarketDataService>,
    /// Provider range for the trailing window; long enough to fill every
    /// indicator window, far shorter than the training period.
    range: String,
}

impl StockPredictor {
    pub fn new(
        models: HashMap<String, TrainedModel>,
        market_data: Arc<dyn MarketDataService>,
        range: impl Into<String>,
    ) -> Self {
        Self {
            models,
            market_data,
            range: range.into(),
        }
    }

    /// Predict one instrument. Infallible by design: everything that can go
    /// wrong is folded into the status.
    pub async fn predict_symbol(&self, symbol: &str) -> PredictionResult {
        let Some(model) = self.models.get(symbol) else {
            return PredictionResult::failed(symbol, PredictionStatus::ModelNotFound);
        };

        let series = match self.market_data.get_daily_history(symbol, &self.range).await {
            Ok(series) if series.is_empty() => {
                return PredictionResult::failed(symbol, PredictionStatus::NoData);
            }
            Ok(series) => series,
            Err(e) => {
                warn!(symbol, error = %e, "history fetch failed");
                return PredictionResult::failed(symbol, PredictionStatus::Failed(e.to_string()));
            }
        };

        // The identical feature pipeline training used, applied to the
        // trailing window; only the newest fully-populated row is scored.
        let rows = indicators::compute(&series);
        let Some(latest) = latest_complete_row(&rows) else {
            return PredictionResult::failed(symbol, PredictionStatus::InsufficientHistory);
        };

        match model.predict(&latest.to_vector()) {
            Ok(prediction) => PredictionResult {
                symbol: symbol.to_string(),
                direction: Some(prediction.direction),
                confidence: Some(prediction.confidence),
                status: PredictionStatus::Success,
            },
            Err(e) => {
                warn!(symbol, error = %e, "model scoring failed");
                PredictionResult::failed(symbol, PredictionStatus::Failed(e.to_string()))
            }
        }
    }

    /// Predict every requested instrument sequentially, in the given order.
    pub async fn predict_portfolio(&self, symbols: &[String]) -> Vec<PredictionResult> {
        let mut results = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            results.push(self.predict_symbol(symbol).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(symbol: &str, direction: Direction, confidence: f64) -> PredictionResult {
        PredictionResult {
            symbol: symbol.to_string(),
            direction: Some(direction),
            confidence: Some(confidence),
            status: PredictionStatus::Success,
        }
    }

    #[test]
    fn metrics_cover_only_successful_results() {
        let results = vec![
            success("A", Direction::Up, 90.0),
            success("B", Direction::Down, 60.0),
            PredictionResult::failed("C", PredictionStatus::Failed("boom".to_string())),
        ];

        let metrics = PortfolioMetrics::from_results(&results).unwrap();
        assert_eq!(metrics.total_predictions, 2);
        assert_eq!(metrics.bullish_count, 1);
        assert!((metrics.bullish_percentage - 50.0).abs() < 1e-9);
        assert!((metrics.avg_confidence - 75.0).abs() < 1e-9);
    }

    #[test]
    fn metrics_are_absent_when_nothing_succeeded() {
        let results = vec![
            PredictionResult::failed("A", PredictionStatus::ModelNotFound),
            PredictionResult::failed("B", PredictionStatus::NoData),
        ];
        assert!(PortfolioMetrics::from_results(&results).is_none());
    }

    #[test]
    fn status_lines_render_reasons() {
        assert_eq!(PredictionStatus::ModelNotFound.to_string(), "model not found");
        assert_eq!(PredictionStatus::NoData.to_string(), "no data available");
        assert_eq!(
            PredictionStatus::Failed("x".to_string()).to_string(),
            "x"
        );
    }
}
