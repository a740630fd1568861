use thiserror::Error;

/// Errors raised while assembling or fitting a per-instrument model.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("insufficient history: {rows} usable rows, need at least {required}")]
    InsufficientHistory { rows: usize, required: usize },

    #[error("model fit failed for {symbol}: {reason}")]
    Fit { symbol: String, reason: String },

    #[error("feature schema mismatch: model was trained on [{expected}], runtime uses [{actual}]")]
    SchemaMismatch { expected: String, actual: String },
}
