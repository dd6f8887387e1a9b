//! Push-based metrics reporter for crudeprice
//!
//! Periodically outputs the serving state as structured JSON to stdout.

use crate::application::ml::{ModelStatus, PredictionService};
use crate::infrastructure::observability::metrics::Metrics;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics snapshot for JSON output
#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub model: ModelStatus,
}

/// Outputs metrics as structured JSON logs on a configurable interval.
pub struct MetricsReporter {
    service: Arc<PredictionService>,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(service: Arc<PredictionService>, metrics: Metrics, interval_seconds: u64) -> Self {
        Self {
            service,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    /// Run the reporter in a loop, outputting metrics periodically
    pub async fn run(self) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            let snapshot = self.collect_snapshot();
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    // Prefixed so log shippers can filter on it
                    println!("METRICS_JSON:{}", json);
                    info!(
                        "Model loaded: {} | Uptime: {}s",
                        snapshot.model.loaded, snapshot.uptime_seconds
                    );
                }
                Err(e) => warn!("Failed to serialize metrics: {}", e),
            }
        }
    }

    /// Collect current metrics snapshot
    pub fn collect_snapshot(&self) -> MetricsSnapshot {
        let uptime = self.start_time.elapsed().as_secs();
        let model = self.service.status();

        self.metrics.uptime_seconds.set(uptime as f64);
        self.metrics.set_model_loaded(model.loaded);

        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            model,
        }
    }
}
