// Price records and prediction views
pub mod market;

// Feature pipeline, CSV layout and evaluation metrics
pub mod ml;

// Domain-specific error types
pub mod errors;
