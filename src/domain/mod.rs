// Market data domain
pub mod market;

// Feature schema shared by training and inference
pub mod features;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
