// Column layout of the price CSV files
pub mod csv_layout;

// Date featurization and feature assembly
pub mod feature_pipeline;

// Regression metrics and cross-validation aggregates
pub mod metrics;

pub use csv_layout::{CsvLayout, PriceColumn};
pub use feature_pipeline::{DateTextFeaturizer, FeaturePipeline, FeatureSpec};
pub use metrics::{AverageMetrics, FoldMetrics, RegressionMetrics};
