//! crudeprice Server - serves published predictions and live inference
//!
//! # Usage
//! ```sh
//! SERVER_PORT=8071 cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `DATA_DIR` - Directory holding the published artifacts (default: data)
//! - `MODEL_FILE` - Model file name (default: crudeoil-price-model.bin)
//! - `SERVER_BIND_ADDRESS` / `SERVER_PORT` - Listen address (default: 127.0.0.1:8071)
//! - `OBSERVABILITY_ENABLED` - Enable metrics reporting (default: true)
//! - `OBSERVABILITY_INTERVAL` - Interval in seconds between metric outputs (default: 60)

use anyhow::{Context, Result};
use crudeprice::application::ml::PredictionService;
use crudeprice::config::Config;
use crudeprice::infrastructure::ArtifactStore;
use crudeprice::infrastructure::observability::{Metrics, MetricsReporter};
use crudeprice::interfaces::http::{AppState, router};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("crudeprice Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: DataDir={:?}, Model={}",
        config.paths.data_dir, config.paths.model_file
    );

    let store = Arc::new(ArtifactStore::new(config.paths.clone()).with_label(config.training.label));
    let predictor = Arc::new(PredictionService::with_initial_load(store.clone()));
    let metrics = Metrics::new()?;
    metrics.set_model_loaded(predictor.is_ready());

    if config.observability.enabled {
        let reporter = MetricsReporter::new(
            predictor.clone(),
            metrics.clone(),
            config.observability.interval_seconds,
        );
        tokio::spawn(async move {
            reporter.run().await;
        });
        info!(
            "Metrics reporter started (interval: {}s)",
            config.observability.interval_seconds
        );
    } else {
        info!("Metrics reporting disabled.");
    }

    let state = AppState {
        predictor,
        store,
        metrics,
    };
    let app = router(state, config.server.max_upload_bytes);

    let address = config.server.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}. Press Ctrl+C to shutdown.", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received. Exiting...");
            }
        })
        .await?;

    Ok(())
}
