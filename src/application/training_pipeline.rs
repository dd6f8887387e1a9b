//! Offline train-and-publish run: filter, load, train, gate, write.

use crate::application::ml::noise_filter::{FilterReport, filter_noise_lines};
use crate::application::ml::{ModelSource, PricePredictor, TrainedModel, Trainer};
use crate::domain::errors::PipelineError;
use crate::domain::market::{PredictionResult, StockPriceRecord};
use crate::domain::ml::{AverageMetrics, CsvLayout, FoldMetrics};
use crate::infrastructure::persistence::{ArtifactStore, load_records};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Result of a run that got as far as the publish gate.
#[derive(Debug)]
pub enum TrainingOutcome {
    /// Metrics cleared the threshold and every artifact was written.
    Published {
        metrics: AverageMetrics,
        folds: Vec<FoldMetrics>,
        artifacts: Vec<PathBuf>,
    },
    /// Metrics did not clear the threshold; nothing was written.
    Rejected {
        metrics: AverageMetrics,
        folds: Vec<FoldMetrics>,
        threshold: f64,
    },
}

impl TrainingOutcome {
    pub fn metrics(&self) -> &AverageMetrics {
        match self {
            TrainingOutcome::Published { metrics, .. } => metrics,
            TrainingOutcome::Rejected { metrics, .. } => metrics,
        }
    }

    pub fn folds(&self) -> &[FoldMetrics] {
        match self {
            TrainingOutcome::Published { folds, .. } => folds,
            TrainingOutcome::Rejected { folds, .. } => folds,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, TrainingOutcome::Published { .. })
    }
}

pub struct TrainingPipeline {
    raw_data: PathBuf,
    layout: CsvLayout,
    trainer: Trainer,
    store: ArtifactStore,
    threshold: f64,
    partial_rows: usize,
    preview_rows: usize,
}

impl TrainingPipeline {
    pub fn new(
        raw_data: impl Into<PathBuf>,
        layout: CsvLayout,
        trainer: Trainer,
        store: ArtifactStore,
    ) -> Self {
        Self {
            raw_data: raw_data.into(),
            layout,
            trainer,
            store,
            threshold: 0.8,
            partial_rows: 100,
            preview_rows: 50,
        }
    }

    /// Average R² a run must strictly exceed to be published.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_partial_rows(mut self, partial_rows: usize) -> Self {
        self.partial_rows = partial_rows;
        self
    }

    /// Loaded rows echoed at debug level before training.
    pub fn with_preview_rows(mut self, preview_rows: usize) -> Self {
        self.preview_rows = preview_rows;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn filter(&self) -> Result<FilterReport, PipelineError> {
        filter_noise_lines(&self.raw_data)
    }

    pub fn run(&self) -> Result<TrainingOutcome, PipelineError> {
        let report = self.filter()?;
        let records = load_records(&report.output, &self.layout)?;
        self.log_preview(&records);
        let trained = self.trainer.train_and_evaluate(&records)?;
        self.gate(trained, &records)
    }

    fn log_preview(&self, records: &[StockPriceRecord]) {
        debug!("Loaded data ({})", self.layout);
        for record in records.iter().take(self.preview_rows) {
            let values: Vec<String> = self
                .layout
                .columns()
                .iter()
                .filter_map(|c| record.value(*c).map(|v| format!("{}={}", c, v)))
                .collect();
            debug!("  {} | {}", record.date, values.join(" | "));
        }
        if records.len() > self.preview_rows {
            debug!("  ... {} more rows", records.len() - self.preview_rows);
        }
        debug!("Count: {}", records.len());
    }

    /// Reads the published model back from the store and predicts `date`
    /// with it, proving the artifact on disk is usable.
    pub fn sample_prediction(&self, date: &str) -> Result<PredictionResult, PipelineError> {
        let model = self.store.load_model()?;
        let prediction = model.predict(&StockPriceRecord::new(date))?;
        info!(
            "Prediction example: {} -> {:.4}",
            prediction.record.date, prediction.predicted_close
        );
        Ok(prediction)
    }

    /// Publishes `trained` when its average R² clears the threshold. The
    /// prediction artifacts are a replay of the model over `records`.
    pub fn gate(
        &self,
        trained: TrainedModel,
        records: &[StockPriceRecord],
    ) -> Result<TrainingOutcome, PipelineError> {
        let TrainedModel {
            model,
            folds,
            metrics,
        } = trained;

        if !metrics.passes(self.threshold) {
            warn!(
                "R² {:.4} does not exceed {:.2}, model not published",
                metrics.r_squared, self.threshold
            );
            return Ok(TrainingOutcome::Rejected {
                metrics,
                folds,
                threshold: self.threshold,
            });
        }

        info!(
            "R² {:.4} exceeds {:.2}, publishing",
            metrics.r_squared, self.threshold
        );
        let replay = model.predict_batch(records)?;
        let artifacts = self
            .store
            .publish(&model, &metrics, &replay, self.partial_rows)?;

        Ok(TrainingOutcome::Published {
            metrics,
            folds,
            artifacts,
        })
    }
}
