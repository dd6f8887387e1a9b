//! Data directory and artifact file names.

use std::path::{Path, PathBuf};

pub const METRICS_FILE: &str = "AverageMetrics.json";
pub const PREDICTIONS_FILE: &str = "Predictions.json";
pub const PARTIAL_PREDICTIONS_FILE: &str = "PredictionsPartial.json";
pub const PLOT_FILE: &str = "StockPricePlot.json";

/// Where the trainer writes and the server reads every artifact
#[derive(Debug, Clone, PartialEq)]
pub struct PathsEnvConfig {
    pub data_dir: PathBuf,
    pub raw_data_file: String,
    pub model_file: String,
}

impl Default for PathsEnvConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            raw_data_file: "crudeoil_price-raw.csv".to_string(),
            model_file: "crudeoil-price-model.bin".to_string(),
        }
    }
}

impl PathsEnvConfig {
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            data_dir: var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            raw_data_file: var("RAW_DATA_FILE").unwrap_or(defaults.raw_data_file),
            model_file: var("MODEL_FILE").unwrap_or(defaults.model_file),
        }
    }

    /// Same file names, rooted somewhere else.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn resolve(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    pub fn raw_data_path(&self) -> PathBuf {
        self.resolve(&self.raw_data_file)
    }

    pub fn model_path(&self) -> PathBuf {
        self.resolve(&self.model_file)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.resolve(METRICS_FILE)
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.resolve(PREDICTIONS_FILE)
    }

    pub fn partial_predictions_path(&self) -> PathBuf {
        self.resolve(PARTIAL_PREDICTIONS_FILE)
    }

    pub fn plot_path(&self) -> PathBuf {
        self.resolve(PLOT_FILE)
    }

    /// Every file a successful training run publishes, model last.
    pub fn published_artifacts(&self) -> Vec<PathBuf> {
        vec![
            self.metrics_path(),
            self.predictions_path(),
            self.partial_predictions_path(),
            self.plot_path(),
            self.model_path(),
        ]
    }
}
