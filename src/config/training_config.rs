//! Training configuration parsing from environment variables.
//!
//! Covers the CSV layout, label and feature selection, cross-validation,
//! boosting hyperparameters and the publish gate.

use crate::application::ml::{BoostingParameters, TrainingOptions};
use crate::domain::ml::{CsvLayout, FeatureSpec, PriceColumn};
use anyhow::{Context, Result, anyhow};

/// Training environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingEnvConfig {
    pub layout: CsvLayout,
    pub label: PriceColumn,
    pub extra_features: Vec<PriceColumn>,
    pub folds: usize,
    pub seed: u64,
    pub publish_threshold: f64,
    pub partial_rows: usize,
    pub boosting: BoostingParameters,
}

impl Default for TrainingEnvConfig {
    fn default() -> Self {
        Self {
            layout: CsvLayout::default(),
            label: PriceColumn::Close,
            extra_features: Vec::new(),
            folds: 5,
            seed: 0,
            publish_threshold: 0.8,
            partial_rows: 100,
            boosting: BoostingParameters::default(),
        }
    }
}

impl TrainingEnvConfig {
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let layout = match var("CSV_COLUMNS") {
            Some(raw) => raw
                .parse::<CsvLayout>()
                .map_err(|e| anyhow!(e))
                .context("Invalid CSV_COLUMNS")?,
            None => defaults.layout,
        };
        let label = match var("TRAIN_LABEL") {
            Some(raw) => raw
                .parse::<PriceColumn>()
                .map_err(|e| anyhow!(e))
                .context("Invalid TRAIN_LABEL")?,
            None => defaults.label,
        };
        let extra_features = match var("TRAIN_EXTRA_FEATURES") {
            Some(raw) => parse_columns(&raw).context("Invalid TRAIN_EXTRA_FEATURES")?,
            None => defaults.extra_features,
        };

        let boosting = BoostingParameters {
            n_trees: parse_or(&var, "TRAIN_TREES", defaults.boosting.n_trees),
            learning_rate: parse_or(&var, "TRAIN_LEARNING_RATE", defaults.boosting.learning_rate),
            max_depth: parse_or(&var, "TRAIN_MAX_DEPTH", defaults.boosting.max_depth),
            min_samples_leaf: parse_or(
                &var,
                "TRAIN_MIN_SAMPLES_LEAF",
                defaults.boosting.min_samples_leaf,
            ),
        };

        Ok(Self {
            layout,
            label,
            extra_features,
            folds: parse_or(&var, "TRAIN_FOLDS", defaults.folds),
            seed: parse_or(&var, "TRAIN_SEED", defaults.seed),
            publish_threshold: parse_or(&var, "PUBLISH_R2_THRESHOLD", defaults.publish_threshold),
            partial_rows: parse_or(&var, "PREDICTIONS_PARTIAL_ROWS", defaults.partial_rows),
            boosting,
        })
    }

    pub fn training_options(&self) -> TrainingOptions {
        TrainingOptions {
            features: FeatureSpec {
                label: self.label,
                numeric: self.extra_features.clone(),
            },
            boosting: self.boosting.clone(),
            folds: self.folds,
            seed: self.seed,
        }
    }
}

fn parse_columns(raw: &str) -> Result<Vec<PriceColumn>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<PriceColumn>().map_err(|e| anyhow!(e)))
        .collect()
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    var(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
