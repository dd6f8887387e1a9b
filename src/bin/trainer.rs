//! Offline trainer: filters the raw CSV, trains with cross-validation and
//! publishes the model and its artifacts when the average R² clears the gate.
//!
//! # Usage
//! ```sh
//! cargo run --bin trainer -- --data-dir data --threshold 0.8
//! cargo run --bin trainer -- --publish-url http://127.0.0.1:8071
//! ```
//!
//! Every flag overrides the matching environment variable (see `.env`).

use anyhow::{Context, Result};
use clap::Parser;
use crudeprice::application::ml::Trainer;
use crudeprice::application::{TrainingOutcome, TrainingPipeline};
use crudeprice::config::Config;
use crudeprice::domain::ml::{AverageMetrics, FoldMetrics, PriceColumn};
use crudeprice::infrastructure::{ArtifactPublisher, ArtifactStore};
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the raw CSV and receiving every artifact
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Raw CSV file name inside the data directory
    #[arg(long)]
    raw_file: Option<String>,

    /// Model file name inside the data directory
    #[arg(long)]
    model_file: Option<String>,

    /// Column to predict
    #[arg(long)]
    label: Option<PriceColumn>,

    /// Extra numeric feature columns, comma separated (e.g. open,volume)
    #[arg(long, value_delimiter = ',')]
    features: Option<Vec<PriceColumn>>,

    /// Cross-validation folds
    #[arg(long)]
    folds: Option<usize>,

    /// Seed of the fold shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Average R² a run must exceed to be published
    #[arg(long)]
    threshold: Option<f64>,

    /// Number of boosted trees
    #[arg(long)]
    trees: Option<usize>,

    /// Boosting learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Minimum examples per leaf
    #[arg(long)]
    min_leaf: Option<usize>,

    /// Rows kept in PredictionsPartial.json
    #[arg(long)]
    partial_rows: Option<usize>,

    /// Date predicted with the reloaded model after publishing
    #[arg(long, default_value = "2020-03-22")]
    sample_date: String,

    /// Loaded rows echoed at debug level before training
    #[arg(long, default_value_t = 50)]
    preview_rows: usize,

    /// Push published artifacts to this server and trigger a reload
    #[arg(long)]
    publish_url: Option<String>,
}

/// What the command line asks for beyond the shared configuration.
struct RunOptions {
    sample_date: String,
    preview_rows: usize,
    publish_url: Option<String>,
}

impl Args {
    fn apply(self, config: &mut Config) -> RunOptions {
        if let Some(dir) = self.data_dir {
            config.paths.data_dir = dir;
        }
        if let Some(file) = self.raw_file {
            config.paths.raw_data_file = file;
        }
        if let Some(file) = self.model_file {
            config.paths.model_file = file;
        }

        let training = &mut config.training;
        if let Some(label) = self.label {
            training.label = label;
        }
        if let Some(features) = self.features {
            training.extra_features = features;
        }
        if let Some(folds) = self.folds {
            training.folds = folds;
        }
        if let Some(seed) = self.seed {
            training.seed = seed;
        }
        if let Some(threshold) = self.threshold {
            training.publish_threshold = threshold;
        }
        if let Some(trees) = self.trees {
            training.boosting.n_trees = trees;
        }
        if let Some(rate) = self.learning_rate {
            training.boosting.learning_rate = rate;
        }
        if let Some(min_leaf) = self.min_leaf {
            training.boosting.min_samples_leaf = min_leaf;
        }
        if let Some(rows) = self.partial_rows {
            training.partial_rows = rows;
        }
        RunOptions {
            sample_date: self.sample_date,
            preview_rows: self.preview_rows,
            publish_url: self.publish_url,
        }
    }
}

fn print_metrics(folds: &[FoldMetrics], average: &AverageMetrics) {
    println!("\n══════════════════════════════════════════════════════");
    println!("  CROSS-VALIDATION ({} folds)", folds.len());
    println!("══════════════════════════════════════════════════════");
    println!(
        "  {:>4} {:>7} {:>6} {:>10} {:>10} {:>10} {:>8}",
        "Fold", "Train", "Test", "MAE", "MSE", "RMSE", "R²"
    );
    for fold in folds {
        let m = &fold.metrics;
        println!(
            "  {:>4} {:>7} {:>6} {:>10.4} {:>10.4} {:>10.4} {:>8.4}",
            fold.fold,
            fold.train_rows,
            fold.test_rows,
            m.mean_absolute_error,
            m.mean_squared_error,
            m.root_mean_squared_error,
            m.r_squared
        );
    }
    println!("──────────────────────────────────────────────────────");
    println!("  Mean Absolute Error:     {:.4}", average.mean_absolute_error);
    println!("  Mean Squared Error:      {:.4}", average.mean_squared_error);
    println!("  Root Mean Squared Error: {:.4}", average.root_mean_squared_error);
    println!("  Loss Function:           {:.4}", average.loss_function);
    println!("  R Squared:               {:.4}", average.r_squared);
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = Config::from_env()?;
    let run = Args::parse().apply(&mut config);

    info!(
        "Training on {:?} (label: {}, layout: {})",
        config.paths.raw_data_path(),
        config.training.label,
        config.training.layout
    );

    let store = ArtifactStore::new(config.paths.clone()).with_label(config.training.label);
    let trainer = Trainer::new(
        config.training.layout.clone(),
        config.training.training_options(),
    );
    let pipeline = TrainingPipeline::new(
        config.paths.raw_data_path(),
        config.training.layout.clone(),
        trainer,
        store,
    )
    .with_threshold(config.training.publish_threshold)
    .with_partial_rows(config.training.partial_rows)
    .with_preview_rows(run.preview_rows);

    let outcome = pipeline.run().context("Training run failed")?;
    print_metrics(outcome.folds(), outcome.metrics());

    match outcome {
        TrainingOutcome::Published { artifacts, .. } => {
            println!("\n  Published {} artifacts to {:?}", artifacts.len(), config.paths.data_dir);
            match pipeline.sample_prediction(&run.sample_date) {
                Ok(sample) => println!(
                    "\n  Prediction example:\n  Date: {}\n  Predicted Price: {:.4}",
                    sample.record.date, sample.predicted_close
                ),
                Err(e) => warn!("Sample prediction for {} failed: {}", run.sample_date, e),
            }
            if let Some(url) = run.publish_url {
                let publisher = ArtifactPublisher::new(&url)?;
                let runtime = tokio::runtime::Runtime::new()
                    .context("Failed to start runtime for publishing")?;
                runtime
                    .block_on(publisher.publish_all(&artifacts))
                    .with_context(|| format!("Failed to publish artifacts to {}", url))?;
                println!("  Pushed artifacts to {} and reloaded the model", url);
            }
        }
        TrainingOutcome::Rejected { threshold, .. } => {
            println!(
                "\n  Model not published: R² does not exceed {:.2}",
                threshold
            );
        }
    }

    Ok(())
}
