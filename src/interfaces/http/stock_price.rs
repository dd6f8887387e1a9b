//! `/api/stockprice/*` handlers.

use super::AppState;
use super::error::ApiError;
use crate::application::ml::{ModelStatus, PricePredictor};
use crate::domain::errors::PredictionError;
use crate::domain::market::{PredictionResult, StockPriceCorrelate, StockPriceRecord};
use crate::domain::ml::AverageMetrics;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use std::time::Instant;
use tracing::info;

pub async fn get_predictions(
    State(state): State<AppState>,
    Path(take_last): Path<i64>,
) -> Result<Json<Vec<PredictionResult>>, ApiError> {
    state.metrics.inc_artifact_requests("predictions");
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || store.read_predictions(take_last))
        .await??
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No predictions have been published".to_string()))
}

pub async fn get_metrics(State(state): State<AppState>) -> Result<Json<AverageMetrics>, ApiError> {
    state.metrics.inc_artifact_requests("metrics");
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || store.read_metrics())
        .await??
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No metrics have been published".to_string()))
}

pub async fn get_correlate(
    State(state): State<AppState>,
) -> Result<Json<Vec<StockPriceCorrelate>>, ApiError> {
    state.metrics.inc_artifact_requests("correlate");
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || store.read_correlate())
        .await??
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No predictions have been published".to_string()))
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<StockPriceRecord>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(record) = payload.map_err(|rejection| {
        state.metrics.inc_predictions("invalid_input");
        ApiError::InvalidInput(rejection.body_text())
    })?;

    let started = Instant::now();
    let result = state.predictor.predict(&record);
    state
        .metrics
        .observe_prediction_latency(started.elapsed().as_secs_f64());

    let outcome = match &result {
        Ok(_) => "ok",
        Err(PredictionError::NotReady) => "not_ready",
        Err(PredictionError::Feature(_)) => "invalid_input",
        Err(PredictionError::Model { .. }) => "error",
    };
    state.metrics.inc_predictions(outcome);

    Ok(Json(result?))
}

/// 204 once the new model is live. On failure the previous model stays.
pub async fn reload_model(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let predictor = state.predictor.clone();
    let reloaded = tokio::task::spawn_blocking(move || predictor.reload()).await?;
    state.metrics.set_model_loaded(state.predictor.is_ready());

    match reloaded {
        Ok(snapshot) => {
            state.metrics.inc_reloads("success");
            info!(
                "Model reloaded ({} training rows)",
                snapshot.model.schema().training_rows
            );
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            state.metrics.inc_reloads("failure");
            Err(e.into())
        }
    }
}

pub async fn status(State(state): State<AppState>) -> Json<ModelStatus> {
    Json(state.predictor.status())
}
