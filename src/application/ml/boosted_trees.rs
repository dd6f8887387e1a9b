//! Gradient-boosted regression trees over smartcore decision trees.
//!
//! Squared loss: the ensemble starts from the label mean and every tree is
//! fitted to the residuals of the trees before it, scaled by the learning
//! rate. Tree induction itself is delegated to smartcore.

use crate::domain::errors::TrainingError;
use serde::{Deserialize, Serialize};
use smartcore::error::Failed;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use std::fmt;

type RegressionTree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Boosting hyperparameters. Defaults follow the FastTree regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParameters {
    pub n_trees: usize,
    pub learning_rate: f64,
    pub max_depth: u16,
    pub min_samples_leaf: usize,
}

impl Default for BoostingParameters {
    fn default() -> Self {
        Self {
            n_trees: 100,
            learning_rate: 0.2,
            max_depth: 6,
            min_samples_leaf: 10,
        }
    }
}

impl BoostingParameters {
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u16) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.n_trees == 0 {
            return Err(TrainingError::InvalidParameter {
                reason: "n_trees must be at least 1".to_string(),
            });
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(TrainingError::InvalidParameter {
                reason: format!("learning_rate must be in (0, 1], got {}", self.learning_rate),
            });
        }
        if self.max_depth == 0 || self.min_samples_leaf == 0 {
            return Err(TrainingError::InvalidParameter {
                reason: "max_depth and min_samples_leaf must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn tree_parameters(&self) -> DecisionTreeRegressorParameters {
        DecisionTreeRegressorParameters::default()
            .with_max_depth(self.max_depth)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_min_samples_split(self.min_samples_leaf * 2)
    }
}

/// Additive ensemble of regression trees.
#[derive(Serialize, Deserialize)]
pub struct BoostedTreeRegressor {
    base_score: f64,
    learning_rate: f64,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl fmt::Debug for BoostedTreeRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoostedTreeRegressor")
            .field("base_score", &self.base_score)
            .field("learning_rate", &self.learning_rate)
            .field("n_features", &self.n_features)
            .field("n_trees", &self.trees.len())
            .finish()
    }
}

fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>, Failed> {
    DenseMatrix::from_2d_vec(&rows.to_vec())
}

impl BoostedTreeRegressor {
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[f64],
        params: &BoostingParameters,
    ) -> Result<Self, TrainingError> {
        params.validate()?;
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(TrainingError::InvalidParameter {
                reason: format!(
                    "Need matching non-empty features and labels, got {} rows and {} labels",
                    rows.len(),
                    labels.len()
                ),
            });
        }

        let matrix = to_matrix(rows).map_err(|e| TrainingError::Regressor {
            reason: format!("Matrix error: {}", e),
        })?;

        let base_score = labels.iter().sum::<f64>() / labels.len() as f64;
        let mut scores = vec![base_score; labels.len()];
        let mut trees = Vec::with_capacity(params.n_trees);

        for _ in 0..params.n_trees {
            let residuals: Vec<f64> = labels
                .iter()
                .zip(scores.iter())
                .map(|(label, score)| label - score)
                .collect();

            let tree = RegressionTree::fit(&matrix, &residuals, params.tree_parameters())
                .map_err(|e| TrainingError::Regressor {
                    reason: format!("Training error: {}", e),
                })?;
            let step = tree.predict(&matrix).map_err(|e| TrainingError::Regressor {
                reason: format!("Predict error: {}", e),
            })?;

            for (score, delta) in scores.iter_mut().zip(step) {
                *score += params.learning_rate * delta;
            }
            trees.push(tree);
        }

        Ok(Self {
            base_score,
            learning_rate: params.learning_rate,
            n_features: rows[0].len(),
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, Failed> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let matrix = to_matrix(rows)?;
        let mut scores = vec![self.base_score; rows.len()];
        for tree in &self.trees {
            let step = tree.predict(&matrix)?;
            for (score, delta) in scores.iter_mut().zip(step) {
                *score += self.learning_rate * delta;
            }
        }
        Ok(scores)
    }
}
