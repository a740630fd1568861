//! Candidate evaluation under time-respecting cross-validation.
//!
//! Folds walk forward: each fold trains on an expanding prefix and validates
//! on the block immediately after it, so validation rows are always strictly
//! later than every training row. Random k-fold would leak future bars into
//! training and overstate accuracy; this ordering is the central correctness
//! property of the trainer.

use crate::application::dataset::LabeledDataset;
use crate::application::model::{Classifier, FitParams, ModelKind, StandardScaler, TrainedModel};
use crate::domain::errors::TrainError;
use crate::domain::features::FEATURE_NAMES;
use std::ops::Range;
use tracing::{debug, info};

pub const DEFAULT_CV_FOLDS: usize = 5;

/// One walk-forward fold: a training prefix and the validation block after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Range<usize>,
    pub validation: Range<usize>,
}

/// Expanding-window k-fold split over `n` time-ordered rows.
///
/// The validation block size is n / (k + 1); remainder rows pad the earliest
/// training block. Too few rows for `k` folds is an error, never a silent
/// reduction in fold count.
pub fn time_series_split(n: usize, k: usize) -> Result<Vec<Fold>, TrainError> {
    let validation_size = n / (k + 1);
    if k == 0 || validation_size == 0 {
        return Err(TrainError::InsufficientHistory {
            rows: n,
            required: k + 1,
        });
    }

    let first_validation = n - k * validation_size;
    Ok((0..k)
        .map(|i| {
            let start = first_validation + i * validation_size;
            Fold {
                train: 0..start,
                validation: start..start + validation_size,
            }
        })
        .collect())
}

/// Mean accuracy of one candidate kind across the folds. The scaler is fitted
/// on each fold's training rows only.
fn cross_validate(
    kind: ModelKind,
    dataset: &LabeledDataset,
    folds: &[Fold],
    params: FitParams,
) -> Result<f64, String> {
    let mut total = 0.0;

    for fold in folds {
        let x_train = dataset.x[fold.train.clone()].to_vec();
        let y_train = dataset.y[fold.train.clone()].to_vec();
        let x_val = dataset.x[fold.validation.clone()].to_vec();
        let y_val = &dataset.y[fold.validation.clone()];

        let scaler = StandardScaler::fit(&x_train);
        let model = Classifier::fit(kind, &scaler.transform(&x_train), &y_train, params)?;
        let scores = model.score(&scaler.transform(&x_val))?;

        let correct = scores
            .iter()
            .zip(y_val.iter())
            .filter(|(p, label)| {
                let predicted = if **p > 0.5 { 1.0 } else { 0.0 };
                predicted == **label
            })
            .count();
        total += correct as f64 / y_val.len() as f64;
    }

    Ok(total / folds.len() as f64)
}

/// Index of the winner: highest mean accuracy, ties broken by evaluation
/// order (first wins).
pub(crate) fn pick_best(scores: &[(ModelKind, f64)]) -> usize {
    let mut best = 0;
    for (i, (_, score)) in scores.iter().enumerate().skip(1) {
        if *score > scores[best].1 {
            best = i;
        }
    }
    best
}

/// Evaluates the candidate kinds for one instrument, selects the best by mean
/// cross-validated accuracy, and refits the winner on the full history.
pub struct ModelTrainer {
    candidates: Vec<ModelKind>,
    cv_folds: usize,
    params: FitParams,
}

impl ModelTrainer {
    pub fn new(candidates: Vec<ModelKind>, cv_folds: usize, params: FitParams) -> Self {
        Self {
            candidates,
            cv_folds,
            params,
        }
    }

    pub fn train(&self, dataset: &LabeledDataset) -> Result<TrainedModel, TrainError> {
        let folds = time_series_split(dataset.len(), self.cv_folds)?;

        let mut scores = Vec::with_capacity(self.candidates.len());
        for &kind in &self.candidates {
            let accuracy =
                cross_validate(kind, dataset, &folds, self.params).map_err(|reason| {
                    TrainError::Fit {
                        symbol: dataset.symbol.clone(),
                        reason,
                    }
                })?;
            debug!(
                symbol = %dataset.symbol,
                model = %kind,
                accuracy,
                "cross-validation complete"
            );
            scores.push((kind, accuracy));
        }

        let (kind, cv_accuracy) = scores[pick_best(&scores)];

        // Refit on every row. The persisted artifact sees more data than any
        // fold did, so cv_accuracy is a selection score, not an out-of-sample
        // guarantee.
        let scaler = StandardScaler::fit(&dataset.x);
        let classifier = Classifier::fit(
            kind,
            &scaler.transform(&dataset.x),
            &dataset.y,
            self.params,
        )
        .map_err(|reason| TrainError::Fit {
            symbol: dataset.symbol.clone(),
            reason,
        })?;

        info!(
            symbol = %dataset.symbol,
            model = %kind,
            accuracy = cv_accuracy,
            rows = dataset.len(),
            "selected model"
        );

        Ok(TrainedModel {
            symbol: dataset.symbol.clone(),
            kind,
            cv_accuracy,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            scaler,
            classifier,
        })
    }
}

/// Aggregate over one training batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub count: usize,
    pub avg_score: f64,
    pub best_score: f64,
    pub worst_score: f64,
}

impl TrainingSummary {
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        Some(Self {
            count: scores.len(),
            avg_score: scores.iter().sum::<f64>() / scores.len() as f64,
            best_score: scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            worst_score: scores.iter().cloned().fold(f64::INFINITY, f64::min),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_never_precedes_training() {
        for n in [12, 18, 50, 137, 400] {
            for k in 2..=6 {
                let folds = time_series_split(n, k).unwrap();
                assert_eq!(folds.len(), k);
                for fold in &folds {
                    assert!(!fold.train.is_empty());
                    assert!(!fold.validation.is_empty());
                    // Every validation index is strictly later than every
                    // training index.
                    assert_eq!(fold.train.end, fold.validation.start);
                }
                assert_eq!(folds.last().unwrap().validation.end, n);
            }
        }
    }

    #[test]
    fn folds_expand_monotonically() {
        let folds = time_series_split(60, 5).unwrap();
        for pair in folds.windows(2) {
            assert!(pair[1].train.end > pair[0].train.end);
            assert_eq!(pair[1].validation.start, pair[0].validation.end);
        }
    }

    #[test]
    fn remainder_rows_pad_the_earliest_block() {
        // 13 rows, 5 folds: validation blocks of 2, first train block of 3.
        let folds = time_series_split(13, 5).unwrap();
        assert_eq!(folds[0].train, 0..3);
        assert_eq!(folds[0].validation, 3..5);
    }

    #[test]
    fn too_few_rows_is_an_error_not_fewer_folds() {
        let err = time_series_split(5, 5).unwrap_err();
        assert!(matches!(err, TrainError::InsufficientHistory { .. }));
        assert!(time_series_split(6, 5).is_ok());
    }

    #[test]
    fn tie_goes_to_the_first_candidate() {
        let scores = vec![
            (ModelKind::RandomForest, 0.61),
            (ModelKind::Linear, 0.61),
        ];
        assert_eq!(pick_best(&scores), 0);

        let scores = vec![
            (ModelKind::RandomForest, 0.55),
            (ModelKind::Linear, 0.61),
        ];
        assert_eq!(pick_best(&scores), 1);
    }

    #[test]
    fn training_is_deterministic() {
        let dataset = synthetic_dataset(90);
        let trainer = ModelTrainer::new(
            vec![ModelKind::RandomForest, ModelKind::Linear],
            DEFAULT_CV_FOLDS,
            FitParams {
                n_trees: 20,
                seed: 42,
            },
        );

        let a = trainer.train(&dataset).unwrap();
        let b = trainer.train(&dataset).unwrap();
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.cv_accuracy, b.cv_accuracy);

        let row = vec![0.5; FEATURE_NAMES.len()];
        let pa = a.predict(&row).unwrap();
        let pb = b.predict(&row).unwrap();
        assert_eq!(pa.direction, pb.direction);
        assert_eq!(pa.confidence, pb.confidence);
    }

    #[test]
    fn summary_aggregates_scores() {
        let summary = TrainingSummary::from_scores(&[0.5, 0.7, 0.6]).unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.avg_score - 0.6).abs() < 1e-9);
        assert_eq!(summary.best_score, 0.7);
        assert_eq!(summary.worst_score, 0.5);

        assert!(TrainingSummary::from_scores(&[]).is_none());
    }

    fn synthetic_dataset(n: usize) -> LabeledDataset {
        // A learnable pattern: the label follows the sign of a feature mix.
        let x: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                let phase = (i % 10) as f64;
                let mut row = vec![0.0; FEATURE_NAMES.len()];
                row[0] = phase;
                row[1] = 5.0 - phase;
                row[3] = 30.0 + phase * 4.0;
                row
            })
            .collect();
        let y: Vec<f64> = x
            .iter()
            .map(|row| if row[0] > row[1] { 1.0 } else { 0.0 })
            .collect();
        LabeledDataset {
            symbol: "TEST".to_string(),
            x,
            y,
            timestamps: (0..n as i64).collect(),
        }
    }
}
