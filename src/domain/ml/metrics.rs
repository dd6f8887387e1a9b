//! Regression metrics and their cross-validation average.
//!
//! The loss function is the squared loss, so `loss_function` equals the
//! mean squared error for every evaluation.

use serde::{Deserialize, Serialize};

/// Metrics of one evaluation pass (predictions against labels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionMetrics {
    pub mean_absolute_error: f64,
    pub mean_squared_error: f64,
    pub root_mean_squared_error: f64,
    pub loss_function: f64,
    pub r_squared: f64,
}

impl RegressionMetrics {
    /// Compares predictions with labels. An empty input yields all zeros,
    /// a constant label yields `r_squared == 0`.
    pub fn evaluate(predictions: &[f64], labels: &[f64]) -> Self {
        let n = predictions.len().min(labels.len());
        if n == 0 {
            return Self::default();
        }

        let (abs_sum, sq_sum) = predictions
            .iter()
            .zip(labels.iter())
            .fold((0.0, 0.0), |(abs, sq), (p, t)| {
                let diff = p - t;
                (abs + diff.abs(), sq + diff * diff)
            });

        let mean_label = labels[..n].iter().sum::<f64>() / n as f64;
        let total_sq: f64 = labels[..n].iter().map(|t| (t - mean_label).powi(2)).sum();

        let mse = sq_sum / n as f64;
        let r_squared = if total_sq > 0.0 {
            1.0 - sq_sum / total_sq
        } else {
            0.0
        };

        Self {
            mean_absolute_error: abs_sum / n as f64,
            mean_squared_error: mse,
            root_mean_squared_error: mse.sqrt(),
            loss_function: mse,
            r_squared,
        }
    }
}

/// Metrics of a single cross-validation fold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldMetrics {
    pub fold: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: RegressionMetrics,
}

/// Arithmetic mean of the per-fold metrics; the publish gate of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageMetrics {
    pub mean_absolute_error: f64,
    pub mean_squared_error: f64,
    pub root_mean_squared_error: f64,
    pub loss_function: f64,
    pub r_squared: f64,
}

impl AverageMetrics {
    /// `None` when there are no folds to average.
    pub fn from_folds(folds: &[FoldMetrics]) -> Option<Self> {
        if folds.is_empty() {
            return None;
        }
        let n = folds.len() as f64;
        let mean = |f: fn(&RegressionMetrics) -> f64| {
            folds.iter().map(|fold| f(&fold.metrics)).sum::<f64>() / n
        };

        Some(Self {
            mean_absolute_error: mean(|m| m.mean_absolute_error),
            mean_squared_error: mean(|m| m.mean_squared_error),
            root_mean_squared_error: mean(|m| m.root_mean_squared_error),
            loss_function: mean(|m| m.loss_function),
            r_squared: mean(|m| m.r_squared),
        })
    }

    /// Strictly greater than the threshold.
    pub fn passes(&self, r_squared_threshold: f64) -> bool {
        self.r_squared > r_squared_threshold
    }
}
