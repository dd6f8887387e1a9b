#![allow(dead_code)]

use crudeprice::application::ml::{BoostingParameters, PredictionService, Trainer, TrainingOptions};
use crudeprice::application::{TrainingOutcome, TrainingPipeline};
use crudeprice::config::PathsEnvConfig;
use crudeprice::domain::ml::CsvLayout;
use crudeprice::infrastructure::ArtifactStore;
use crudeprice::infrastructure::observability::Metrics;
use crudeprice::interfaces::http::{AppState, router};
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const HEADER: &str = "Date,Open,High,Low,Close,Price,Volume";

/// Weekday prices from 2018-01-01 driven by year and month, with a few
/// corrupted lines mixed in the way raw exports have them.
pub fn raw_csv(rows: usize) -> String {
    let mut csv = format!("{}\n", HEADER);
    let mut day = chrono::NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    let mut written = 0;
    while written < rows {
        use chrono::Datelike;
        if day.weekday().number_from_monday() <= 5 {
            let close = 40.0 + 8.0 * (day.year() - 2018) as f64 + 0.6 * day.month() as f64;
            csv.push_str(&format!(
                "{},{:.2},{:.2},{:.2},{:.2},{:.2},{}\n",
                day.format("%Y-%m-%d"),
                close - 0.3,
                close + 0.8,
                close - 0.9,
                close,
                close,
                250_000 + written
            ));
            written += 1;
            if written % 50 == 0 {
                csv.push_str(&format!("{},null,null,null,null,null,null\n", day.format("%Y-%m-%d")));
            }
        }
        day += chrono::Duration::days(1);
    }
    csv.push_str("2020-04-20,17.73,17.85,-40.32,-37.63,-37.63,247947\n");
    csv
}

pub fn data_paths(dir: &Path) -> PathsEnvConfig {
    PathsEnvConfig::default().with_data_dir(dir)
}

pub fn write_raw(paths: &PathsEnvConfig, rows: usize) {
    fs::create_dir_all(paths.data_dir()).unwrap();
    fs::write(paths.raw_data_path(), raw_csv(rows)).unwrap();
}

pub fn quick_pipeline(paths: &PathsEnvConfig, threshold: f64) -> TrainingPipeline {
    let options = TrainingOptions {
        boosting: BoostingParameters::default()
            .with_n_trees(25)
            .with_min_samples_leaf(5),
        ..Default::default()
    };
    TrainingPipeline::new(
        paths.raw_data_path(),
        CsvLayout::default(),
        Trainer::new(CsvLayout::default(), options),
        ArtifactStore::new(paths.clone()),
    )
    .with_threshold(threshold)
    .with_partial_rows(20)
}

/// Trains on a fresh raw file in `dir` and publishes, panicking if the gate rejects.
pub fn publish_model(dir: &Path) -> Vec<std::path::PathBuf> {
    let paths = data_paths(dir);
    write_raw(&paths, 260);
    match quick_pipeline(&paths, 0.8).run().unwrap() {
        TrainingOutcome::Published { artifacts, .. } => artifacts,
        other => panic!("expected a published model, got {:?}", other),
    }
}

pub fn app_state(dir: &Path) -> AppState {
    let store = Arc::new(ArtifactStore::new(data_paths(dir)));
    AppState {
        predictor: Arc::new(PredictionService::with_initial_load(store.clone())),
        store,
        metrics: Metrics::new().unwrap(),
    }
}

pub fn app(state: AppState) -> axum::Router {
    router(state, 16 * 1024 * 1024)
}
