//! Feature/target assembly.
//!
//! Turns indicator rows into the supervised (X, y) pair. Alignment is
//! lookahead-safe: a row is used only when every indicator window behind it is
//! populated and its label's future close exists. Rows failing either test are
//! dropped, never imputed from the future.

use crate::domain::errors::TrainError;
use crate::domain::features::{FEATURE_NAMES, FeatureRow};
use crate::domain::market::PriceSeries;
use serde::Serialize;
use std::path::Path;

/// Default number of bars between a feature row and the close that labels it.
pub const DEFAULT_HORIZON: usize = 1;

/// Time-ordered training data for one instrument.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    pub symbol: String,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
    /// Timestamps of the rows that survived, for diagnostics and export.
    pub timestamps: Vec<i64>,
}

impl LabeledDataset {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// Direction label for bar `i`: 1 when the close `horizon` bars ahead is
/// higher, 0 when it is not, None when no such bar exists.
pub(crate) fn direction_label(closes: &[f64], i: usize, horizon: usize) -> Option<f64> {
    let future = closes.get(i + horizon)?;
    Some(if *future > closes[i] { 1.0 } else { 0.0 })
}

/// Assemble (X, y) from a series and its indicator rows.
///
/// X holds only the engineered feature columns in `FEATURE_NAMES` order; raw
/// OHLCV never enters the matrix. Residual missing values are filled with 0 by
/// `FeatureRow::to_vector` — with complete rows that is a no-op, but it is the
/// same convention inference applies, kept deliberately simple.
pub fn assemble(
    series: &PriceSeries,
    rows: &[FeatureRow],
    horizon: usize,
) -> Result<LabeledDataset, TrainError> {
    debug_assert_eq!(series.len(), rows.len());
    let closes = series.closes();

    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut timestamps = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let Some(label) = direction_label(&closes, i, horizon) else {
            // Bars at the tail have no future close; nothing after them can
            // be labeled either.
            break;
        };
        if !row.is_complete() {
            continue;
        }
        x.push(row.to_vector());
        y.push(label);
        timestamps.push(row.timestamp);
    }

    if y.is_empty() {
        return Err(TrainError::InsufficientHistory {
            rows: 0,
            required: 1,
        });
    }

    Ok(LabeledDataset {
        symbol: series.symbol.clone(),
        x,
        y,
        timestamps,
    })
}

/// The most recent fully-populated feature row, if any. This is the row
/// inference scores.
pub fn latest_complete_row(rows: &[FeatureRow]) -> Option<&FeatureRow> {
    rows.iter().rev().find(|r| r.is_complete())
}

/// Flat CSV record for dataset export.
#[derive(Debug, Serialize)]
struct DatasetRecord<'a> {
    symbol: &'a str,
    timestamp: i64,
    sma_10: f64,
    sma_30: f64,
    ema_12: f64,
    rsi: f64,
    macd: f64,
    macd_signal: f64,
    stoch_k: f64,
    bb_upper: f64,
    bb_middle: f64,
    bb_lower: f64,
    atr: f64,
    obv: f64,
    volume_ma: f64,
    returns: f64,
    volatility: f64,
    price_range: f64,
    ma_signal: f64,
    rsi_signal: f64,
    volume_spike: f64,
    target: f64,
}

/// Append a labeled dataset to a CSV file, writing headers only when the file
/// does not exist yet.
pub fn write_csv(dataset: &LabeledDataset, path: &Path) -> anyhow::Result<()> {
    let file_exists = path.exists();

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    for (i, features) in dataset.x.iter().enumerate() {
        debug_assert_eq!(features.len(), FEATURE_NAMES.len());
        wtr.serialize(DatasetRecord {
            symbol: &dataset.symbol,
            timestamp: dataset.timestamps[i],
            sma_10: features[0],
            sma_30: features[1],
            ema_12: features[2],
            rsi: features[3],
            macd: features[4],
            macd_signal: features[5],
            stoch_k: features[6],
            bb_upper: features[7],
            bb_middle: features[8],
            bb_lower: features[9],
            atr: features[10],
            obv: features[11],
            volume_ma: features[12],
            returns: features[13],
            volatility: features[14],
            price_range: features[15],
            ma_signal: features[16],
            rsi_signal: features[17],
            volume_spike: features[18],
            target: dataset.y[i],
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::indicators;
    use crate::domain::market::Candle;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: 86_400 * (i as i64 + 1),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 1_000.0 + (i % 5) as f64 * 100.0,
            })
            .collect();
        PriceSeries::new("TEST", candles)
    }

    #[test]
    fn labels_follow_the_future_close() {
        let closes = [10.0, 12.0, 11.0, 15.0];
        assert_eq!(direction_label(&closes, 0, 1), Some(1.0));
        assert_eq!(direction_label(&closes, 1, 1), Some(0.0));
        assert_eq!(direction_label(&closes, 2, 1), Some(1.0));
        assert_eq!(direction_label(&closes, 3, 1), None);
    }

    #[test]
    fn equal_future_close_labels_down() {
        let closes = [10.0, 10.0];
        assert_eq!(direction_label(&closes, 0, 1), Some(0.0));
    }

    #[test]
    fn assemble_drops_warmup_and_unlabeled_rows() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + ((i * 3) % 7) as f64 - i as f64 * 0.05)
            .collect();
        let series = series_from_closes(&closes);
        let rows = indicators::compute(&series);
        let dataset = assemble(&series, &rows, 1).unwrap();

        // First complete row sits behind the slowest window, and the final
        // bar has no label.
        assert_eq!(dataset.len(), 60 - indicators::LARGEST_WINDOW + 1 - 1);
        assert_eq!(dataset.timestamps[0], rows[29].timestamp);
        assert_eq!(
            *dataset.timestamps.last().unwrap(),
            rows[rows.len() - 2].timestamp
        );
        for features in &dataset.x {
            assert_eq!(features.len(), FEATURE_NAMES.len());
        }
    }

    #[test]
    fn assemble_respects_larger_horizons() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i % 9) as f64).collect();
        let series = series_from_closes(&closes);
        let rows = indicators::compute(&series);

        let h1 = assemble(&series, &rows, 1).unwrap();
        let h5 = assemble(&series, &rows, 5).unwrap();
        assert_eq!(h1.len() - 4, h5.len());
    }

    #[test]
    fn too_short_series_surfaces_insufficient_history() {
        let closes: Vec<f64> = (0..indicators::LARGEST_WINDOW)
            .map(|i| 100.0 + i as f64)
            .collect();
        let series = series_from_closes(&closes);
        let rows = indicators::compute(&series);

        let err = assemble(&series, &rows, 1).unwrap_err();
        assert!(matches!(
            err,
            TrainError::InsufficientHistory { rows: 0, .. }
        ));
    }

    #[test]
    fn latest_complete_row_skips_trailing_gaps() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 4) as f64).collect();
        let series = series_from_closes(&closes);
        let mut rows = indicators::compute(&series);
        assert_eq!(
            latest_complete_row(&rows).unwrap().timestamp,
            rows[39].timestamp
        );

        // Poke a hole in the last row; the previous complete one wins.
        rows[39].rsi = None;
        assert_eq!(
            latest_complete_row(&rows).unwrap().timestamp,
            rows[38].timestamp
        );
    }
}
