use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a record into a feature vector
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Invalid date '{date}': expected YYYY-MM-DD")]
    InvalidDate { date: String },

    #[error("Date '{date}' shares no n-grams with the fitted vocabulary")]
    OutOfVocabulary { date: String },

    #[error("Cannot fit a featurizer on an empty training set")]
    EmptyVocabulary,
}

/// Errors related to fitting and evaluating the regression model
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Label column '{label}' is not part of the CSV layout")]
    MissingLabel { label: String },

    #[error("Not enough rows for {folds}-fold cross-validation: {rows}")]
    NotEnoughRows { rows: usize, folds: usize },

    #[error("Invalid training parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("Regressor failure: {reason}")]
    Regressor { reason: String },

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

/// Errors raised when answering a prediction request
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("No model is currently loaded")]
    NotReady,

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("Prediction failed: {reason}")]
    Model { reason: String },
}

/// Errors raised while loading a persisted model
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Model file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("Failed to read model file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to deserialize model {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported model format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Errors of the offline batch steps (filter, load, train, write artifacts)
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid row {line} in {path:?}: {reason}")]
    Row {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("JSON error on {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PipelineError::Json {
            path: path.into(),
            source,
        }
    }
}

/// Errors of the artifact upload endpoint
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Request carries no 'file' field")]
    MissingFile,

    #[error("Unusable file name '{name}'")]
    InvalidFileName { name: String },

    #[error("Malformed multipart body: {reason}")]
    Malformed { reason: String },

    #[error("Failed to store upload at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
