pub mod boosted_trees;
pub mod model;
pub mod noise_filter;
pub mod prediction_service;
pub mod predictor;
pub mod trainer;

pub use boosted_trees::{BoostedTreeRegressor, BoostingParameters};
pub use model::{ModelSchema, PriceModel};
pub use prediction_service::{ModelSource, ModelStatus, PredictionService};
pub use predictor::PricePredictor;
pub use trainer::{TrainedModel, Trainer, TrainingOptions};
