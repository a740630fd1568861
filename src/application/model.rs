//! Model kinds, the standardization transform, and the persisted model bundle.
//!
//! Both candidate kinds are fitted against the 0/1 direction target and their
//! raw response is read as the probability of an up move: the forest's mean
//! tree response is the vote share of its trees (already in [0, 1]), and the
//! least-squares linear model is a linear probability model, clamped. The
//! class boundary is 0.5 either way.

use crate::domain::errors::TrainError;
use crate::domain::features::FEATURE_NAMES;
use crate::domain::market::Direction;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};
use std::str::FromStr;

/// The closed set of candidate model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    RandomForest,
    Linear,
}

impl FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rf" | "random_forest" => Ok(ModelKind::RandomForest),
            "linear" | "lr" => Ok(ModelKind::Linear),
            _ => anyhow::bail!("Unknown model kind: {}. Must be 'rf' or 'linear'", s),
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::RandomForest => write!(f, "rf"),
            ModelKind::Linear => write!(f, "linear"),
        }
    }
}

/// Hyperparameters threaded from configuration into each fit.
#[derive(Debug, Clone, Copy)]
pub struct FitParams {
    pub n_trees: usize,
    pub seed: u64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
        }
    }
}

/// Column-wise standardization: (x - mean) / std, fitted on training rows
/// only. A constant column keeps a unit scale so it passes through at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let n_cols = rows.first().map_or(0, |r| r.len());
        let n = rows.len() as f64;

        let mut means = vec![0.0; n_cols];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row.iter()) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut scales = vec![0.0; n_cols];
        for row in rows {
            for (s, (v, m)) in scales.iter_mut().zip(row.iter().zip(means.iter())) {
                *s += (v - m) * (v - m);
            }
        }
        for s in &mut scales {
            *s = (*s / n).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Self { means, scales }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

/// The fitted estimator behind a model bundle.
#[derive(Debug, Serialize, Deserialize)]
pub enum Classifier {
    RandomForest(RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    Linear(LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>),
}

impl Classifier {
    /// Fit one candidate kind on standardized rows and 0/1 targets.
    pub fn fit(
        kind: ModelKind,
        x: &Vec<Vec<f64>>,
        y: &Vec<f64>,
        params: FitParams,
    ) -> Result<Self, String> {
        let matrix = to_matrix(x)?;
        match kind {
            ModelKind::RandomForest => {
                let forest_params = RandomForestRegressorParameters::default()
                    .with_n_trees(params.n_trees)
                    .with_seed(params.seed);
                let model = RandomForestRegressor::fit(&matrix, y, forest_params)
                    .map_err(|e| format!("Random forest fit failed: {}", e))?;
                Ok(Classifier::RandomForest(model))
            }
            ModelKind::Linear => {
                let model =
                    LinearRegression::fit(&matrix, y, LinearRegressionParameters::default())
                        .map_err(|e| format!("Linear fit failed: {}", e))?;
                Ok(Classifier::Linear(model))
            }
        }
    }

    /// P(up) per row, clamped into [0, 1].
    pub fn score(&self, x: &Vec<Vec<f64>>) -> Result<Vec<f64>, String> {
        let matrix = to_matrix(x)?;
        let raw = match self {
            Classifier::RandomForest(model) => model.predict(&matrix),
            Classifier::Linear(model) => model.predict(&matrix),
        }
        .map_err(|e| format!("Prediction failed: {}", e))?;

        Ok(raw.into_iter().map(|p| p.clamp(0.0, 1.0)).collect())
    }
}

fn to_matrix(rows: &Vec<Vec<f64>>) -> Result<DenseMatrix<f64>, String> {
    DenseMatrix::from_2d_vec(rows).map_err(|e| format!("Matrix creation failed: {}", e))
}

/// A scored direction for one feature row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub direction: Direction,
    /// Max class probability, as a percentage in [50, 100].
    pub confidence: f64,
    pub probability_up: f64,
}

/// The persisted per-instrument artifact: winning estimator, its fitted
/// transform, the schema it was trained against, and the selection score.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModel {
    pub symbol: String,
    pub kind: ModelKind,
    pub cv_accuracy: f64,
    pub feature_names: Vec<String>,
    pub(crate) scaler: StandardScaler,
    pub(crate) classifier: Classifier,
}

impl TrainedModel {
    /// Score one feature vector (in `FEATURE_NAMES` order). The stored schema
    /// must match the runtime schema exactly; anything else is a hard error,
    /// not a silent reorder.
    pub fn predict(&self, features: &[f64]) -> anyhow::Result<Prediction> {
        if self.feature_names != FEATURE_NAMES {
            return Err(TrainError::SchemaMismatch {
                expected: self.feature_names.join(", "),
                actual: FEATURE_NAMES.join(", "),
            }
            .into());
        }
        if features.len() != self.feature_names.len() {
            return Err(TrainError::SchemaMismatch {
                expected: self.feature_names.join(", "),
                actual: format!("{} columns", features.len()),
            }
            .into());
        }

        let scaled = vec![self.scaler.transform_row(features)];
        let scores = self
            .classifier
            .score(&scaled)
            .map_err(|e| anyhow::anyhow!(e))?;
        let p_up = *scores
            .first()
            .ok_or_else(|| anyhow::anyhow!("No prediction returned"))?;

        let direction = if p_up > 0.5 {
            Direction::Up
        } else {
            Direction::Down
        };
        Ok(Prediction {
            direction,
            confidence: p_up.max(1.0 - p_up) * 100.0,
            probability_up: p_up,
        })
    }
}
