//! Configuration loading from environment variables.
//!
//! Everything is consumed once at process start; there is no runtime
//! reconfiguration. CLI flags on the binaries override individual fields.

use crate::application::dataset::DEFAULT_HORIZON;
use crate::application::model::ModelKind;
use crate::application::trainer::DEFAULT_CV_FOLDS;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Provider range strings accepted for history fetches.
const VALID_RANGES: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

const DEFAULT_SYMBOLS: &[&str] = &[
    "RELIANCE.NS",
    "TCS.NS",
    "INFY.NS",
    "HDFCBANK.NS",
    "ICICIBANK.NS",
];

#[derive(Debug, Clone)]
pub struct Config {
    /// Instruments to train and predict, in reporting order.
    pub symbols: Vec<String>,
    /// Provider range for training history.
    pub history_range: String,
    /// Provider range for the inference-time trailing window.
    pub prediction_range: String,
    /// Bars ahead that define the direction target.
    pub horizon: usize,
    pub cv_folds: usize,
    /// Candidate model kinds, in evaluation order (ties resolve to the
    /// earliest).
    pub candidates: Vec<ModelKind>,
    pub model_path: PathBuf,
    pub data_base_url: String,
    pub n_trees: usize,
    pub seed: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let symbols = parse_symbols(
            &env::var("SYMBOLS").unwrap_or_else(|_| DEFAULT_SYMBOLS.join(",")),
        )?;
        let history_range =
            validate_range(&env::var("HISTORY_RANGE").unwrap_or_else(|_| "2y".to_string()))?;
        let prediction_range =
            validate_range(&env::var("PREDICTION_RANGE").unwrap_or_else(|_| "3mo".to_string()))?;
        let candidates = parse_candidates(
            &env::var("MODEL_CANDIDATES").unwrap_or_else(|_| "rf,linear".to_string()),
        )?;

        Ok(Self {
            symbols,
            history_range,
            prediction_range,
            horizon: parse_usize("PREDICTION_HORIZON", DEFAULT_HORIZON)?,
            cv_folds: parse_usize("CV_FOLDS", DEFAULT_CV_FOLDS)?,
            candidates,
            model_path: PathBuf::from(
                env::var("MODEL_PATH").unwrap_or_else(|_| "models/models.json".to_string()),
            ),
            data_base_url: env::var("DATA_BASE_URL")
                .unwrap_or_else(|_| "https://query2.finance.yahoo.com".to_string()),
            n_trees: parse_usize("N_TREES", 100)?,
            seed: parse_u64("SEED", 42)?,
        })
    }
}

fn parse_usize(key: &str, default: usize) -> Result<usize> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("Failed to parse {} as an integer: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_u64(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {} as an integer: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

pub fn parse_symbols(raw: &str) -> Result<Vec<String>> {
    let symbols: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if symbols.is_empty() {
        anyhow::bail!("SYMBOLS must name at least one instrument");
    }
    Ok(symbols)
}

/// Unknown model kinds are a configuration error; fail fast at parse time
/// rather than mid-batch.
pub fn parse_candidates(raw: &str) -> Result<Vec<ModelKind>> {
    let candidates: Vec<ModelKind> = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(ModelKind::from_str)
        .collect::<Result<_>>()?;
    if candidates.is_empty() {
        anyhow::bail!("MODEL_CANDIDATES must name at least one model kind");
    }
    Ok(candidates)
}

pub fn validate_range(raw: &str) -> Result<String> {
    let range = raw.trim().to_lowercase();
    if VALID_RANGES.contains(&range.as_str()) {
        Ok(range)
    } else {
        anyhow::bail!(
            "Invalid range '{}'. Must be one of: {}",
            raw,
            VALID_RANGES.join(", ")
        )
    }
}
