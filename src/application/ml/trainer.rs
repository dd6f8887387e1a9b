use super::boosted_trees::BoostingParameters;
use super::model::PriceModel;
use crate::domain::errors::TrainingError;
use crate::domain::market::StockPriceRecord;
use crate::domain::ml::{AverageMetrics, CsvLayout, FeatureSpec, FoldMetrics, RegressionMetrics};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use tracing::{debug, info};

/// Everything that shapes a training run besides the data itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    pub features: FeatureSpec,
    pub boosting: BoostingParameters,
    pub folds: usize,
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            features: FeatureSpec::default(),
            boosting: BoostingParameters::default(),
            folds: 5,
            seed: 0,
        }
    }
}

/// A model fitted on the full data set plus its cross-validation estimate.
#[derive(Debug)]
pub struct TrainedModel {
    pub model: PriceModel,
    pub folds: Vec<FoldMetrics>,
    pub metrics: AverageMetrics,
}

/// Fits the pipeline and estimates its quality with k-fold cross-validation.
pub struct Trainer {
    layout: CsvLayout,
    options: TrainingOptions,
}

impl Trainer {
    pub fn new(layout: CsvLayout, options: TrainingOptions) -> Self {
        Self { layout, options }
    }

    pub fn fit(&self, records: &[StockPriceRecord]) -> Result<PriceModel, TrainingError> {
        PriceModel::fit(
            records,
            &self.options.features,
            &self.layout,
            &self.options.boosting,
        )
    }

    /// One metrics record per fold. Every fold re-fits the whole pipeline
    /// (featurizer included) on its training portion.
    pub fn cross_validate(
        &self,
        records: &[StockPriceRecord],
    ) -> Result<Vec<FoldMetrics>, TrainingError> {
        let k = self.options.folds;
        if k < 2 {
            return Err(TrainingError::InvalidParameter {
                reason: format!("folds must be at least 2, got {}", k),
            });
        }
        if records.len() < k {
            return Err(TrainingError::NotEnoughRows {
                rows: records.len(),
                folds: k,
            });
        }

        let assignments = fold_assignments(records.len(), k, self.options.seed);
        (0..k)
            .into_par_iter()
            .map(|fold| -> Result<FoldMetrics, TrainingError> {
                let (train, test): (Vec<_>, Vec<_>) = records
                    .iter()
                    .zip(assignments.iter())
                    .partition(|(_, assigned)| **assigned != fold);
                let train: Vec<StockPriceRecord> = train.into_iter().map(|(r, _)| r.clone()).collect();
                let test: Vec<StockPriceRecord> = test.into_iter().map(|(r, _)| r.clone()).collect();

                let model = self.fit(&train)?;
                let features = model.pipeline().transform_all(&test)?;
                let predictions = model.regressor().predict(&features).map_err(|e| {
                    TrainingError::Regressor {
                        reason: format!("Predict error: {}", e),
                    }
                })?;
                let labels = model.pipeline().labels(&test);
                let metrics = RegressionMetrics::evaluate(&predictions, &labels);
                debug!(
                    "Fold {}: train={} test={} R²={:.4}",
                    fold,
                    train.len(),
                    test.len(),
                    metrics.r_squared
                );

                Ok(FoldMetrics {
                    fold,
                    train_rows: train.len(),
                    test_rows: test.len(),
                    metrics,
                })
            })
            .collect()
    }

    pub fn train_and_evaluate(
        &self,
        records: &[StockPriceRecord],
    ) -> Result<TrainedModel, TrainingError> {
        info!(
            "Training boosted trees (Trees: {}, Depth: {}, MinLeaf: {}) on {} rows...",
            self.options.boosting.n_trees,
            self.options.boosting.max_depth,
            self.options.boosting.min_samples_leaf,
            records.len()
        );
        let model = self.fit(records)?;

        info!("Cross-validating with {} folds...", self.options.folds);
        let folds = self.cross_validate(records)?;
        let metrics = AverageMetrics::from_folds(&folds).ok_or(TrainingError::NotEnoughRows {
            rows: records.len(),
            folds: self.options.folds,
        })?;

        Ok(TrainedModel {
            model,
            folds,
            metrics,
        })
    }
}

/// Fold index of every row: a seeded shuffle dealt round-robin into `k` folds,
/// so fold sizes differ by at most one.
pub fn fold_assignments(rows: usize, k: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let mut assignments = vec![0; rows];
    for (position, row) in order.into_iter().enumerate() {
        assignments[row] = position % k;
    }
    assignments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::PriceColumn;
    use crate::testing::synthetic_records;

    fn quick_options() -> TrainingOptions {
        TrainingOptions {
            boosting: BoostingParameters::default()
                .with_n_trees(20)
                .with_min_samples_leaf(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_fold_assignments_partition_rows() {
        let assignments = fold_assignments(23, 5, 0);
        assert_eq!(assignments.len(), 23);
        let mut sizes = [0usize; 5];
        for fold in &assignments {
            sizes[*fold] += 1;
        }
        assert_eq!(sizes.iter().sum::<usize>(), 23);
        assert!(sizes.iter().all(|s| *s == 4 || *s == 5));

        assert_eq!(assignments, fold_assignments(23, 5, 0));
    }

    #[test]
    fn test_cross_validate_averages_folds() {
        let records = synthetic_records(300);
        let trainer = Trainer::new(CsvLayout::default(), quick_options());

        let trained = trainer.train_and_evaluate(&records).unwrap();
        assert_eq!(trained.folds.len(), 5);
        assert_eq!(
            trained.folds.iter().map(|f| f.test_rows).sum::<usize>(),
            records.len()
        );

        let mean_r2 = trained.folds.iter().map(|f| f.metrics.r_squared).sum::<f64>() / 5.0;
        let mean_mae = trained
            .folds
            .iter()
            .map(|f| f.metrics.mean_absolute_error)
            .sum::<f64>()
            / 5.0;
        assert!((trained.metrics.r_squared - mean_r2).abs() < 1e-9);
        assert!((trained.metrics.mean_absolute_error - mean_mae).abs() < 1e-9);
        assert!(trained.metrics.r_squared > 0.8);
    }

    #[test]
    fn test_not_enough_rows() {
        let records = synthetic_records(3);
        let trainer = Trainer::new(CsvLayout::default(), quick_options());
        assert!(matches!(
            trainer.cross_validate(&records),
            Err(TrainingError::NotEnoughRows { rows: 3, folds: 5 })
        ));
    }

    #[test]
    fn test_single_fold_rejected() {
        let options = TrainingOptions {
            folds: 1,
            ..quick_options()
        };
        let trainer = Trainer::new(CsvLayout::default(), options);
        assert!(matches!(
            trainer.cross_validate(&synthetic_records(20)),
            Err(TrainingError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_missing_label_fails_training() {
        let layout: CsvLayout = "date,open,high,low,close".parse().unwrap();
        let options = TrainingOptions {
            features: FeatureSpec {
                label: PriceColumn::Price,
                numeric: vec![],
            },
            ..quick_options()
        };
        let trainer = Trainer::new(layout, options);
        assert!(matches!(
            trainer.fit(&synthetic_records(20)),
            Err(TrainingError::MissingLabel { .. })
        ));
    }
}
