// Model fitting, persistence format and live prediction
pub mod ml;

// Offline filter, train, gate and publish run
pub mod training_pipeline;

pub use training_pipeline::{TrainingOutcome, TrainingPipeline};
