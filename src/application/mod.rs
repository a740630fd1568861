pub mod dataset;
pub mod indicators;
pub mod model;
pub mod predictor;
pub mod reporting;
pub mod trainer;
