mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::Router;
use common::{app, app_state, publish_model};
use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

const BOUNDARY: &str = "crudepriceboundary";

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

fn multipart_body(field: &str, file_name: &str, content: &str) -> Body {
    Body::from(format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n--{b}--\r\n",
        b = BOUNDARY,
    ))
}

async fn upload(app: &Router, body: Body) -> bool {
    let request = Request::post("/api/fileuploader")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(body)
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_read_endpoints_serve_published_artifacts() {
    let dir = tempdir().unwrap();
    publish_model(dir.path());
    let app = app(app_state(dir.path()));

    let (status, body) = get(&app, "/api/stockprice/getpredictions/5").await;
    assert_eq!(status, StatusCode::OK);
    let last = json(&body);
    assert_eq!(last.as_array().unwrap().len(), 5);
    assert!(last[0].get("predictedClose").is_some());
    assert!(last[0]["year"].is_i64());

    let (_, body) = get(&app, "/api/stockprice/getpredictions/-1").await;
    assert_eq!(json(&body).as_array().unwrap().len(), 260);

    let (status, body) = get(&app, "/api/stockprice/getmetrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json(&body)["rSquared"].as_f64().unwrap() > 0.8);

    let (status, body) = get(&app, "/api/stockprice/getcorrelate").await;
    assert_eq!(status, StatusCode::OK);
    let points = json(&body);
    assert_eq!(points.as_array().unwrap().len(), 260);
    assert!(points[0].get("predictedPrice").is_some());
}

#[tokio::test]
async fn test_prediction_endpoint() {
    let dir = tempdir().unwrap();
    publish_model(dir.path());
    let app = app(app_state(dir.path()));

    let (status, body) = post_json(&app, "/api/stockprice/prediction", r#"{"date":"2018-06-12"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let result = json(&body);
    assert_eq!(result["date"], "2018-06-12");
    let predicted = result["predictedClose"].as_f64().unwrap();
    assert!(predicted > 40.0 && predicted < 50.0);

    let (status, body) = post_json(&app, "/api/stockprice/prediction", r#"{"date":"12/06/2018"}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json(&body)["error"].as_str().unwrap().contains("12/06/2018"));

    let (status, body) = post_json(&app, "/api/stockprice/prediction", r#"{"date":"2018-6-12"}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json(&body)["error"].as_str().unwrap().contains("2018-6-12"));
}

#[tokio::test]
async fn test_malformed_prediction_body_is_json_error() {
    let dir = tempdir().unwrap();
    publish_model(dir.path());
    let app = app(app_state(dir.path()));

    for body in [r#"{"close":1.0}"#, "not json", r#"{"date":42}"#] {
        let (status, body) = post_json(&app, "/api/stockprice/prediction", body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json(&body)["error"].is_string());
    }

    let request = Request::post("/api/stockprice/prediction")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"date":"2018-06-12"}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json(&body)["error"].is_string());
}

#[tokio::test]
async fn test_routes_ignore_path_case() {
    let dir = tempdir().unwrap();
    publish_model(dir.path());
    let app = app(app_state(dir.path()));

    let (status, body) = get(&app, "/api/StockPrice/GetPredictions/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().unwrap().len(), 3);

    let (status, _) = get(&app, "/api/StockPrice/GetMetrics").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_json(&app, "/api/StockPrice/Prediction", r#"{"date":"2018-06-12"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, "/api/StockPrice/ReloadModel").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let request = Request::post("/api/FileUploader")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(multipart_body("file", "Notes.txt", "hello"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), Value::Bool(true));
    assert_eq!(fs::read_to_string(dir.path().join("Notes.txt")).unwrap(), "hello");

    let (status, _) = get(&app, "/api/StockPrice/Unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unloaded_server() {
    let dir = tempdir().unwrap();
    let app = app(app_state(dir.path()));

    let (status, body) = post_json(&app, "/api/stockprice/prediction", r#"{"date":"2018-06-12"}"#).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json(&body)["error"].as_str().unwrap().contains("not ready"));

    let (status, _) = get(&app, "/api/stockprice/getmetrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/api/stockprice/getpredictions/10").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/api/stockprice/reloadmodel").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body).get("error").is_some());

    let (_, body) = get(&app, "/api/stockprice/status").await;
    assert_eq!(json(&body)["loaded"], false);
}

#[tokio::test]
async fn test_reload_picks_up_new_model() {
    let dir = tempdir().unwrap();
    let app = app(app_state(dir.path()));

    publish_model(dir.path());
    let (status, body) = get(&app, "/api/stockprice/reloadmodel").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = post_json(&app, "/api/stockprice/prediction", r#"{"date":"2018-02-01"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = get(&app, "/api/stockprice/status").await;
    assert_eq!(json(&body)["loaded"], true);
    assert_eq!(json(&body)["schema"]["label"], "close");
}

#[tokio::test]
async fn test_failed_reload_keeps_serving_previous_model() {
    let dir = tempdir().unwrap();
    let artifacts = publish_model(dir.path());
    let app = app(app_state(dir.path()));

    let model_path = artifacts.last().unwrap();
    fs::write(model_path, b"corrupted").unwrap();

    let (status, _) = get(&app, "/api/stockprice/reloadmodel").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let (status, _) = post_json(&app, "/api/stockprice/prediction", r#"{"date":"2018-02-01"}"#).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_upload_overwrites_named_file() {
    let dir = tempdir().unwrap();
    let app = app(app_state(dir.path()));
    let target = dir.path().join("crudeoil-price-model.zip");
    fs::write(&target, "old").unwrap();

    assert!(upload(&app, multipart_body("file", "crudeoil-price-model.zip", "new model")).await);
    assert_eq!(fs::read_to_string(&target).unwrap(), "new model");

    assert!(upload(&app, multipart_body("file", "../../crudeoil-price-model.zip", "newer")).await);
    assert_eq!(fs::read_to_string(&target).unwrap(), "newer");
}

#[tokio::test]
async fn test_upload_without_file_has_no_side_effects() {
    let dir = tempdir().unwrap();
    let app = app(app_state(dir.path()));

    assert!(!upload(&app, multipart_body("other", "stray.bin", "data")).await);
    let empty = Body::from(format!("--{}--\r\n", BOUNDARY));
    assert!(!upload(&app, empty).await);

    let (status, body) = post_json(&app, "/api/fileuploader", "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), Value::Bool(false));

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let dir = tempdir().unwrap();
    let app = app(app_state(dir.path()));

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");

    post_json(&app, "/api/stockprice/prediction", r#"{"date":"2018-02-01"}"#).await;
    let (status, body) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("crudeprice_model_loaded 0"));
    assert!(text.contains("crudeprice_predictions_total{outcome=\"not_ready\"} 1"));
}
