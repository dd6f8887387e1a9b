//! HTTP serving surface.

pub mod error;
pub mod file_uploader;
pub mod stock_price;

use crate::application::ml::PredictionService;
use crate::infrastructure::ArtifactStore;
use crate::infrastructure::observability::Metrics;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::Uri;
use axum::http::header;
use axum::http::uri::PathAndQuery;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Shared by every handler. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<PredictionService>,
    pub store: Arc<ArtifactStore>,
    pub metrics: Metrics,
}

/// Routes match case-insensitively: `/api/StockPrice/GetMetrics` reaches the
/// same handler as `/api/stockprice/getmetrics`.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let stock_price = Router::new()
        .route(
            "/getpredictions/{take_last}",
            get(stock_price::get_predictions),
        )
        .route("/getmetrics", get(stock_price::get_metrics))
        .route("/getcorrelate", get(stock_price::get_correlate))
        .route("/prediction", post(stock_price::predict))
        .route("/reloadmodel", get(stock_price::reload_model))
        .route("/status", get(stock_price::status));

    let routes = Router::new()
        .nest("/api/stockprice", stock_price)
        .route(
            "/api/fileuploader",
            post(file_uploader::upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Router::new().fallback_service(
        ServiceBuilder::new()
            .map_request(lowercase_path)
            .service(routes),
    )
}

/// Lowercases the path before routing. The query string is left untouched.
fn lowercase_path(mut request: Request) -> Request {
    let uri = request.uri();
    if !uri.path().bytes().any(|b| b.is_ascii_uppercase()) {
        return request;
    }

    let lowered = match uri.query() {
        Some(query) => format!("{}?{}", uri.path().to_ascii_lowercase(), query),
        None => uri.path().to_ascii_lowercase(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = PathAndQuery::try_from(lowered).ok();
    if let Ok(lowered) = Uri::from_parts(parts) {
        *request.uri_mut() = lowered;
    }
    request
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.set_model_loaded(state.predictor.is_ready());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
