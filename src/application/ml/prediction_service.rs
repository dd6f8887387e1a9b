//! Serving-side holder of the loaded model.
//!
//! The model is published as an immutable `Arc` snapshot through an
//! [`ArcSwapOption`]. `predict` takes a snapshot and works on it to the end,
//! so a concurrent `reload` never blocks readers and never exposes a
//! half-swapped model. A failed reload keeps the previous snapshot.

use super::model::{ModelSchema, PriceModel};
use super::predictor::PricePredictor;
use crate::domain::errors::{ModelLoadError, PredictionError};
use crate::domain::market::{PredictionResult, StockPriceRecord};
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where the serving side reads model artifacts from
pub trait ModelSource: Send + Sync {
    fn load_model(&self) -> Result<PriceModel, ModelLoadError>;

    /// Human readable location, for logs
    fn describe(&self) -> String;
}

/// A model as published to readers.
#[derive(Debug)]
pub struct ModelSnapshot {
    pub model: PriceModel,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub loaded: bool,
    pub source: String,
    pub loaded_at: Option<DateTime<Utc>>,
    pub schema: Option<ModelSchema>,
}

pub struct PredictionService {
    current: ArcSwapOption<ModelSnapshot>,
    source: Arc<dyn ModelSource>,
}

impl PredictionService {
    /// Starts unloaded; call [`reload`](Self::reload) to load a model.
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            source,
        }
    }

    /// Attempts an initial load. A missing or unreadable model leaves the
    /// service unloaded (predictions answer `NotReady`) instead of failing.
    pub fn with_initial_load(source: Arc<dyn ModelSource>) -> Self {
        let service = Self::new(source);
        if let Err(e) = service.reload() {
            warn!("Starting without a model: {}", e);
        }
        service
    }

    /// Re-reads the model from its source and swaps it in atomically.
    pub fn reload(&self) -> Result<Arc<ModelSnapshot>, ModelLoadError> {
        match self.source.load_model() {
            Ok(model) => {
                let snapshot = Arc::new(ModelSnapshot {
                    model,
                    loaded_at: Utc::now(),
                });
                self.current.store(Some(snapshot.clone()));
                info!(
                    "Loaded model from {} ({} features, trained {})",
                    self.source.describe(),
                    snapshot.model.schema().features.len(),
                    snapshot.model.schema().trained_at
                );
                Ok(snapshot)
            }
            Err(e) => {
                if self.is_ready() {
                    error!("Model reload failed, keeping previous model: {}", e);
                } else {
                    error!("Model reload failed: {}", e);
                }
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> Option<Arc<ModelSnapshot>> {
        self.current.load_full()
    }

    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }

    pub fn status(&self) -> ModelStatus {
        let snapshot = self.snapshot();
        ModelStatus {
            loaded: snapshot.is_some(),
            source: self.source.describe(),
            loaded_at: snapshot.as_ref().map(|s| s.loaded_at),
            schema: snapshot.as_ref().map(|s| s.model.schema().clone()),
        }
    }
}

impl PricePredictor for PredictionService {
    fn predict(&self, record: &StockPriceRecord) -> Result<PredictionResult, PredictionError> {
        let snapshot = self.snapshot().ok_or(PredictionError::NotReady)?;
        snapshot.model.predict(record)
    }

    fn predict_batch(
        &self,
        records: &[StockPriceRecord],
    ) -> Result<Vec<PredictionResult>, PredictionError> {
        let snapshot = self.snapshot().ok_or(PredictionError::NotReady)?;
        snapshot.model.predict_batch(records)
    }
}
