//! File-backed store for everything a training run publishes.
//!
//! All writes replace whole files through a temp file renamed into place in
//! the same directory. Readers see either the old or the new content.

use crate::application::ml::{ModelSource, PriceModel};
use crate::application::ml::model::MODEL_FORMAT_VERSION;
use crate::config::PathsEnvConfig;
use crate::domain::errors::{ModelLoadError, PipelineError, UploadError};
use crate::domain::market::{PredictionResult, StockPriceCorrelate};
use crate::domain::ml::{AverageMetrics, PriceColumn};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct ArtifactStore {
    paths: PathsEnvConfig,
    label: PriceColumn,
}

#[derive(Deserialize)]
struct VersionHeader {
    schema: SchemaHeader,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaHeader {
    format_version: u32,
}

impl ArtifactStore {
    pub fn new(paths: PathsEnvConfig) -> Self {
        Self {
            paths,
            label: PriceColumn::Close,
        }
    }

    /// Column reported as the actual value when deriving correlate points.
    pub fn with_label(mut self, label: PriceColumn) -> Self {
        self.label = label;
        self
    }

    pub fn paths(&self) -> &PathsEnvConfig {
        &self.paths
    }

    pub fn write_model(&self, model: &PriceModel) -> Result<PathBuf, PipelineError> {
        let path = self.paths.model_path();
        let bytes = serde_json::to_vec(model).map_err(|e| PipelineError::json(&path, e))?;
        write_atomic(&path, &bytes).map_err(|e| PipelineError::io(&path, e))?;
        info!("Model saved to {:?}", path);
        Ok(path)
    }

    pub fn write_metrics(&self, metrics: &AverageMetrics) -> Result<PathBuf, PipelineError> {
        let path = self.paths.metrics_path();
        self.write_json(&path, metrics, true)?;
        Ok(path)
    }

    /// Writes the full replay, its most recent `partial_rows` rows and the
    /// correlate view derived from it.
    pub fn write_predictions(
        &self,
        predictions: &[PredictionResult],
        partial_rows: usize,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        let full = self.paths.predictions_path();
        self.write_json(&full, &predictions, false)?;

        let partial = self.paths.partial_predictions_path();
        let start = predictions.len().saturating_sub(partial_rows);
        self.write_json(&partial, &&predictions[start..], false)?;

        let plot = self.paths.plot_path();
        let points = self.correlate(predictions);
        self.write_json(&plot, &points, false)?;

        Ok(vec![full, partial, plot])
    }

    /// Writes every artifact of an accepted run. The model goes last so a
    /// server reloading mid-publish never pairs a new model with old files.
    pub fn publish(
        &self,
        model: &PriceModel,
        metrics: &AverageMetrics,
        predictions: &[PredictionResult],
        partial_rows: usize,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        let mut written = vec![self.write_metrics(metrics)?];
        written.extend(self.write_predictions(predictions, partial_rows)?);
        written.push(self.write_model(model)?);
        info!("Published {} artifacts to {:?}", written.len(), self.paths.data_dir());
        Ok(written)
    }

    pub fn read_metrics(&self) -> Result<Option<AverageMetrics>, PipelineError> {
        self.read_json(&self.paths.metrics_path())
    }

    /// All predictions when `take_last` is negative, otherwise the last `take_last`.
    pub fn read_predictions(
        &self,
        take_last: i64,
    ) -> Result<Option<Vec<PredictionResult>>, PipelineError> {
        let predictions: Option<Vec<PredictionResult>> =
            self.read_json(&self.paths.predictions_path())?;
        Ok(predictions.map(|mut all| {
            if take_last >= 0 {
                let keep = usize::try_from(take_last).unwrap_or(usize::MAX);
                let start = all.len().saturating_sub(keep);
                all.drain(..start);
            }
            all
        }))
    }

    /// The plot file, or points derived from the predictions when it is absent.
    pub fn read_correlate(&self) -> Result<Option<Vec<StockPriceCorrelate>>, PipelineError> {
        if let Some(points) = self.read_json(&self.paths.plot_path())? {
            return Ok(Some(points));
        }
        debug!("No plot file, deriving correlate view from predictions");
        Ok(self
            .read_predictions(-1)?
            .map(|predictions| self.correlate(&predictions)))
    }

    /// Stores an uploaded artifact under the sanitized base name of
    /// `file_name`, replacing any file of that name.
    pub fn save_upload(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, UploadError> {
        let name = sanitize_file_name(file_name).ok_or_else(|| UploadError::InvalidFileName {
            name: file_name.to_string(),
        })?;
        let path = self.paths.resolve(&name);
        write_atomic(&path, bytes).map_err(|e| UploadError::Io {
            path: path.clone(),
            source: e,
        })?;
        info!("Stored upload {:?} ({} bytes)", path, bytes.len());
        Ok(path)
    }

    fn correlate(&self, predictions: &[PredictionResult]) -> Vec<StockPriceCorrelate> {
        predictions
            .iter()
            .map(|p| StockPriceCorrelate::from_prediction(p, self.label))
            .collect()
    }

    fn write_json<T: serde::Serialize>(
        &self,
        path: &Path,
        value: &T,
        pretty: bool,
    ) -> Result<(), PipelineError> {
        let bytes = if pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .map_err(|e| PipelineError::json(path, e))?;
        write_atomic(path, &bytes).map_err(|e| PipelineError::io(path, e))?;
        debug!("Wrote {:?}", path);
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, PipelineError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PipelineError::io(path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PipelineError::json(path, e))
    }
}

impl ModelSource for ArtifactStore {
    fn load_model(&self) -> Result<PriceModel, ModelLoadError> {
        let path = self.paths.model_path();
        let bytes = fs::read(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ModelLoadError::NotFound { path: path.clone() }
            } else {
                ModelLoadError::Io {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        let header: VersionHeader =
            serde_json::from_slice(&bytes).map_err(|e| ModelLoadError::Corrupt {
                path: path.clone(),
                source: e,
            })?;
        if header.schema.format_version != MODEL_FORMAT_VERSION {
            return Err(ModelLoadError::UnsupportedVersion {
                found: header.schema.format_version,
                expected: MODEL_FORMAT_VERSION,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ModelLoadError::Corrupt { path, source: e })
    }

    fn describe(&self) -> String {
        self.paths.model_path().display().to_string()
    }
}

/// Base name of an uploaded file, or `None` when nothing usable remains.
///
/// Both separators are honoured since clients send paths from any platform.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        return None;
    }
    Some(base.to_string())
}

/// Whole-file replace: write a sibling temp file, then rename over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let result = fs::write(&temp, bytes).and_then(|()| fs::rename(&temp, path));
    if result.is_err() {
        match fs::remove_file(&temp) {
            Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                warn!("Failed to remove temp file {:?}: {}", temp, cleanup);
            }
            _ => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::{BoostingParameters, PricePredictor};
    use crate::domain::market::StockPriceRecord;
    use crate::domain::ml::{CsvLayout, FeatureSpec};
    use crate::testing::synthetic_records;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> ArtifactStore {
        ArtifactStore::new(PathsEnvConfig::default().with_data_dir(dir.join("data")))
    }

    fn predictions(n: usize) -> Vec<PredictionResult> {
        (0..n)
            .map(|i| {
                let mut record = StockPriceRecord::new(format!("2020-01-{:02}", i + 1));
                record.close = 50.0 + i as f64;
                PredictionResult::new(record, 49.5 + i as f64)
            })
            .collect()
    }

    fn metrics() -> AverageMetrics {
        AverageMetrics {
            mean_absolute_error: 0.5,
            mean_squared_error: 0.3,
            root_mean_squared_error: 0.3f64.sqrt(),
            loss_function: 0.3,
            r_squared: 0.93,
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(
            sanitize_file_name("crudeoil-price-model.zip").as_deref(),
            Some("crudeoil-price-model.zip")
        );
        assert_eq!(
            sanitize_file_name("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_file_name("C:\\Users\\me\\Predictions.json").as_deref(),
            Some("Predictions.json")
        );
        assert_eq!(sanitize_file_name("dir/"), None);
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name(""), None);
    }

    #[test]
    fn test_write_atomic_creates_dir_and_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("file.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_write_atomic_failure_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        // A file cannot replace a non-empty directory.
        let path = dir.path().join("taken");
        fs::create_dir_all(path.join("inner")).unwrap();

        assert!(write_atomic(&path, b"payload").is_err());
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("taken")]);
    }

    #[test]
    fn test_missing_artifacts_read_as_none() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.read_metrics().unwrap().is_none());
        assert!(store.read_predictions(-1).unwrap().is_none());
        assert!(store.read_correlate().unwrap().is_none());
        assert!(matches!(
            store.load_model(),
            Err(ModelLoadError::NotFound { .. })
        ));
    }

    #[test]
    fn test_metrics_roundtrip_pretty() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let path = store.write_metrics(&metrics()).unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("\n"));
        assert!(text.contains("\"rSquared\""));
        assert_eq!(store.read_metrics().unwrap(), Some(metrics()));
    }

    #[test]
    fn test_predictions_take_last() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.write_predictions(&predictions(10), 4).unwrap();

        let all = store.read_predictions(-1).unwrap().unwrap();
        assert_eq!(all.len(), 10);

        let last = store.read_predictions(3).unwrap().unwrap();
        assert_eq!(last.len(), 3);
        assert_eq!(last[0].record.date, "2020-01-08");

        assert_eq!(store.read_predictions(0).unwrap().unwrap().len(), 0);
        assert_eq!(store.read_predictions(50).unwrap().unwrap().len(), 10);

        let partial: Vec<PredictionResult> =
            serde_json::from_slice(&fs::read(store.paths().partial_predictions_path()).unwrap())
                .unwrap();
        assert_eq!(partial.len(), 4);
        assert_eq!(partial[3].record.date, "2020-01-10");
    }

    #[test]
    fn test_correlate_falls_back_to_predictions() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.write_predictions(&predictions(3), 100).unwrap();

        let from_plot = store.read_correlate().unwrap().unwrap();
        fs::remove_file(store.paths().plot_path()).unwrap();
        let derived = store.read_correlate().unwrap().unwrap();

        assert_eq!(from_plot, derived);
        assert_eq!(derived[1].price, 51.0);
        assert_eq!(derived[1].predicted_price, 50.5);
    }

    #[test]
    fn test_publish_then_load_model() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let records = synthetic_records(60);
        let model = PriceModel::fit(
            &records,
            &FeatureSpec::default(),
            &CsvLayout::default(),
            &BoostingParameters::default().with_n_trees(4).with_min_samples_leaf(3),
        )
        .unwrap();
        let replay = model.predict_batch(&records).unwrap();

        let written = store.publish(&model, &metrics(), &replay, 100).unwrap();
        assert_eq!(written.len(), 5);
        assert!(written.iter().all(|p| p.exists()));

        let loaded = store.load_model().unwrap();
        assert_eq!(loaded.schema(), model.schema());
        let again = loaded.predict(&records[7]).unwrap();
        assert!((again.predicted_close - replay[7].predicted_close).abs() < 1e-9);
    }

    #[test]
    fn test_load_rejects_unknown_version_and_garbage() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let path = store.paths().model_path();

        write_atomic(&path, br#"{"schema":{"formatVersion":99}}"#).unwrap();
        assert!(matches!(
            store.load_model(),
            Err(ModelLoadError::UnsupportedVersion { found: 99, .. })
        ));

        write_atomic(&path, b"\x00\x01 not json").unwrap();
        assert!(matches!(
            store.load_model(),
            Err(ModelLoadError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_save_upload_overwrites_by_base_name() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        store.save_upload("crudeoil-price-model.zip", b"v1").unwrap();
        let path = store.save_upload("some/dir/crudeoil-price-model.zip", b"v2").unwrap();

        assert_eq!(path, store.paths().resolve("crudeoil-price-model.zip"));
        assert_eq!(fs::read(&path).unwrap(), b"v2");
        assert!(matches!(
            store.save_upload("../", b"x"),
            Err(UploadError::InvalidFileName { .. })
        ));
    }
}
