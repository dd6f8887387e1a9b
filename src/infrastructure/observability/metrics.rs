//! Prometheus metrics definitions for crudeprice
//!
//! All metrics use the `crudeprice_` prefix.

use prometheus::{
    CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

/// Prometheus metrics for the serving side
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Predictions served, by outcome
    pub predictions_total: CounterVec,
    /// Model reload attempts, by result
    pub model_reloads_total: CounterVec,
    /// Artifact uploads, by result
    pub uploads_total: CounterVec,
    /// Reads of persisted artifacts, by artifact
    pub artifact_requests_total: CounterVec,
    /// 1 while a model is loaded
    pub model_loaded: GenericGauge<AtomicF64>,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
    /// Time spent in a single prediction
    pub prediction_latency_seconds: Histogram,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let predictions_total = CounterVec::new(
            Opts::new("crudeprice_predictions_total", "Predictions served by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(predictions_total.clone()))?;

        let model_reloads_total = CounterVec::new(
            Opts::new("crudeprice_model_reloads_total", "Model reload attempts by result"),
            &["result"],
        )?;
        registry.register(Box::new(model_reloads_total.clone()))?;

        let uploads_total = CounterVec::new(
            Opts::new("crudeprice_uploads_total", "Artifact uploads by result"),
            &["result"],
        )?;
        registry.register(Box::new(uploads_total.clone()))?;

        let artifact_requests_total = CounterVec::new(
            Opts::new(
                "crudeprice_artifact_requests_total",
                "Reads of persisted artifacts",
            ),
            &["artifact"],
        )?;
        registry.register(Box::new(artifact_requests_total.clone()))?;

        let model_loaded = Gauge::with_opts(Opts::new(
            "crudeprice_model_loaded",
            "Model status (0=unloaded, 1=loaded)",
        ))?;
        registry.register(Box::new(model_loaded.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "crudeprice_uptime_seconds",
            "Server uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let prediction_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "crudeprice_prediction_latency_seconds",
                "Single prediction latency in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1]),
        )?;
        registry.register(Box::new(prediction_latency_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            predictions_total,
            model_reloads_total,
            uploads_total,
            artifact_requests_total,
            model_loaded,
            uptime_seconds,
            prediction_latency_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_predictions(&self, outcome: &str) {
        self.predictions_total.with_label_values(&[outcome]).inc();
    }

    pub fn inc_reloads(&self, result: &str) {
        self.model_reloads_total.with_label_values(&[result]).inc();
    }

    pub fn inc_uploads(&self, result: &str) {
        self.uploads_total.with_label_values(&[result]).inc();
    }

    pub fn inc_artifact_requests(&self, artifact: &str) {
        self.artifact_requests_total
            .with_label_values(&[artifact])
            .inc();
    }

    pub fn set_model_loaded(&self, loaded: bool) {
        self.model_loaded.set(if loaded { 1.0 } else { 0.0 });
    }

    pub fn observe_prediction_latency(&self, seconds: f64) {
        self.prediction_latency_seconds.observe(seconds);
    }
}
