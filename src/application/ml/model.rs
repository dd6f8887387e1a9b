use super::boosted_trees::{BoostedTreeRegressor, BoostingParameters};
use super::predictor::PricePredictor;
use crate::domain::errors::{PredictionError, TrainingError};
use crate::domain::market::{PredictionResult, StockPriceRecord};
use crate::domain::ml::{CsvLayout, FeaturePipeline, FeatureSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bumped whenever the serialized layout of [`PriceModel`] changes.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Describes what a persisted model expects and produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSchema {
    pub format_version: u32,
    pub label: String,
    pub features: Vec<String>,
    pub training_rows: usize,
    pub trained_at: DateTime<Utc>,
}

/// The model artifact: fitted feature pipeline plus the trained regressor.
#[derive(Debug, Serialize, Deserialize)]
pub struct PriceModel {
    schema: ModelSchema,
    pipeline: FeaturePipeline,
    regressor: BoostedTreeRegressor,
}

impl PriceModel {
    pub fn fit(
        records: &[StockPriceRecord],
        spec: &FeatureSpec,
        layout: &CsvLayout,
        params: &BoostingParameters,
    ) -> Result<Self, TrainingError> {
        let pipeline = FeaturePipeline::fit(records, spec, layout)?;
        let features = pipeline.transform_all(records)?;
        let labels = pipeline.labels(records);
        let regressor = BoostedTreeRegressor::fit(&features, &labels, params)?;

        let schema = ModelSchema {
            format_version: MODEL_FORMAT_VERSION,
            label: pipeline.label_column().to_string(),
            features: pipeline.feature_names(),
            training_rows: records.len(),
            trained_at: Utc::now(),
        };

        Ok(Self {
            schema,
            pipeline,
            regressor,
        })
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn regressor(&self) -> &BoostedTreeRegressor {
        &self.regressor
    }

    /// Raw scores for already-featurized rows.
    pub fn score(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, PredictionError> {
        self.regressor
            .predict(rows)
            .map_err(|e| PredictionError::Model {
                reason: e.to_string(),
            })
    }
}

impl PricePredictor for PriceModel {
    fn predict(&self, record: &StockPriceRecord) -> Result<PredictionResult, PredictionError> {
        let features = self.pipeline.transform(record)?;
        let score = self
            .score(&[features])?
            .first()
            .copied()
            .ok_or_else(|| PredictionError::Model {
                reason: "No prediction returned".to_string(),
            })?;
        Ok(PredictionResult::new(record.clone(), score))
    }

    fn predict_batch(
        &self,
        records: &[StockPriceRecord],
    ) -> Result<Vec<PredictionResult>, PredictionError> {
        let features = self.pipeline.transform_all(records)?;
        let scores = self.score(&features)?;
        Ok(records
            .iter()
            .cloned()
            .zip(scores)
            .map(|(record, score)| PredictionResult::new(record, score))
            .collect())
    }
}
