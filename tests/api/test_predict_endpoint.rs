// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Predict endpoint tests for POST /predict
//!
//! The router is driven with `tower::ServiceExt::oneshot` against an
//! in-memory detection backend, so no network or model is required.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use fabstir_meter_reader::{
    api::{create_app, AppState},
    config::PipelineConfig,
    detection::{Detection, MockDetectionClient, MockOutcome},
    pipeline::ReadingPipeline,
};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "meter-test-boundary";
const REGION_MODEL: &str = "counter_detection/1";
const GLYPH_MODEL: &str = "digits_segmentation/1";

/// Helper: 100x100 grey PNG
fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(100, 100, image::Rgb([128, 128, 128]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// Helper: multipart body with a single file part
fn multipart_body(field: &str, file_name: Option<&str>, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match file_name {
        Some(name) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, name
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", field).as_bytes(),
        ),
    }
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn predict_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Helper: router backed by the given mock, uploads in a temp dir
fn app_with(client: MockDetectionClient, dir: &TempDir) -> Router {
    let config = PipelineConfig {
        uploads_dir: dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };
    let pipeline = ReadingPipeline::new(Arc::new(client), config).unwrap();
    create_app(AppState::new(Arc::new(pipeline), 1024 * 1024))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Glyph with the label for `class_id` (0 is ".", n+1 is digit n)
fn glyph(x: f32, class_id: i64) -> Detection {
    Detection::new(x, 10.0, 4.0, 8.0).with_class_id(class_id)
}

fn counter() -> Detection {
    Detection::new(50.0, 50.0, 60.0, 30.0).with_confidence(0.9)
}

#[tokio::test]
async fn test_reads_meter_with_two_groups() {
    let dir = TempDir::new().unwrap();
    // "123" then ".4"
    let client = MockDetectionClient::new(REGION_MODEL, vec![counter()]).with_glyphs(
        0,
        vec![
            glyph(40.0, 0),
            glyph(12.0, 4),
            glyph(5.0, 2),
            glyph(43.0, 5),
            glyph(8.0, 3),
        ],
    );
    let app = app_with(client, &dir);

    let (status, json) = send(
        app,
        predict_request(multipart_body("image", Some("meter.png"), &png_bytes())),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["Reading_0"]["top_left_reading"], "123");
    assert_eq!(json["Reading_0"]["main_reading"], ".4");
}

#[tokio::test]
async fn test_single_group_fills_top_left_only() {
    let dir = TempDir::new().unwrap();
    let client = MockDetectionClient::new(REGION_MODEL, vec![counter()])
        .with_glyphs(0, vec![glyph(5.0, 1), glyph(10.0, 8), glyph(15.0, 10)]);
    let app = app_with(client, &dir);

    let (status, json) = send(
        app,
        predict_request(multipart_body("image", Some("meter.png"), &png_bytes())),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["Reading_0"]["top_left_reading"], "079");
    assert_eq!(json["Reading_0"]["main_reading"], "");
}

#[tokio::test]
async fn test_region_without_glyphs_is_omitted() {
    let dir = TempDir::new().unwrap();
    let second = Detection::new(30.0, 30.0, 20.0, 20.0);
    let client = MockDetectionClient::new(REGION_MODEL, vec![counter(), second])
        .with_glyphs(0, vec![glyph(5.0, 2)]);
    let app = app_with(client, &dir);

    let (status, json) = send(
        app,
        predict_request(multipart_body("image", Some("meter.png"), &png_bytes())),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(json["Reading_0"]["top_left_reading"], "1");
    assert_eq!(json["Reading_0"]["main_reading"], "");
    assert!(object.get("Reading_1").is_none());
}

#[tokio::test]
async fn test_missing_image_field() {
    let dir = TempDir::new().unwrap();
    let app = app_with(MockDetectionClient::new(REGION_MODEL, vec![]), &dir);

    let (status, json) = send(
        app,
        predict_request(multipart_body("photo", Some("meter.png"), &png_bytes())),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No image uploaded");
}

#[tokio::test]
async fn test_image_field_without_filename() {
    let dir = TempDir::new().unwrap();
    let app = app_with(MockDetectionClient::new(REGION_MODEL, vec![]), &dir);

    let (status, json) = send(app, predict_request(multipart_body("image", None, b"abc"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No image uploaded");
}

#[tokio::test]
async fn test_empty_filename() {
    let dir = TempDir::new().unwrap();
    let app = app_with(MockDetectionClient::new(REGION_MODEL, vec![]), &dir);

    let (status, json) = send(
        app,
        predict_request(multipart_body("image", Some(""), &png_bytes())),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No selected file");
}

#[tokio::test]
async fn test_not_multipart() {
    let dir = TempDir::new().unwrap();
    let app = app_with(MockDetectionClient::new(REGION_MODEL, vec![]), &dir);

    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No image uploaded");
}

#[tokio::test]
async fn test_undecodable_image() {
    let dir = TempDir::new().unwrap();
    let client = MockDetectionClient::new(REGION_MODEL, vec![counter()]);
    let app = app_with(client.clone(), &dir);

    let (status, json) = send(
        app,
        predict_request(multipart_body("image", Some("meter.png"), b"not an image")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid image"));
    assert!(client.calls().await.is_empty());
}

#[tokio::test]
async fn test_no_regions_detected() {
    let dir = TempDir::new().unwrap();
    let app = app_with(MockDetectionClient::new(REGION_MODEL, vec![]), &dir);

    let (status, json) = send(
        app,
        predict_request(multipart_body("image", Some("meter.png"), &png_bytes())),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "No predictions found");
}

#[tokio::test]
async fn test_backend_timeout() {
    let dir = TempDir::new().unwrap();
    let client = MockDetectionClient::new(REGION_MODEL, vec![])
        .with_region_outcome(MockOutcome::Timeout);
    let app = app_with(client, &dir);

    let (status, json) = send(
        app,
        predict_request(multipart_body("image", Some("meter.png"), &png_bytes())),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_backend_failure_on_every_glyph_pass() {
    let dir = TempDir::new().unwrap();
    let client = MockDetectionClient::new(REGION_MODEL, vec![counter()])
        .with_glyph_outcome(0, MockOutcome::Transport("connection refused".to_string()));
    let app = app_with(client, &dir);

    let (status, json) = send(
        app,
        predict_request(multipart_body("image", Some("meter.png"), &png_bytes())),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Detection backend error"));
}

#[tokio::test]
async fn test_glyph_failure_keeps_other_readings() {
    let dir = TempDir::new().unwrap();
    let second = Detection::new(30.0, 30.0, 20.0, 20.0);
    let client = MockDetectionClient::new(REGION_MODEL, vec![counter(), second])
        .with_glyphs(0, vec![glyph(5.0, 8)])
        .with_glyph_outcome(1, MockOutcome::Transport("refused".to_string()));
    let app = app_with(client, &dir);

    let (status, json) = send(
        app,
        predict_request(multipart_body("image", Some("meter.png"), &png_bytes())),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["Reading_0"]["top_left_reading"], "7");
    assert!(json.get("Reading_1").is_none());
}

#[tokio::test]
async fn test_upload_and_models_used() {
    let dir = TempDir::new().unwrap();
    let client = MockDetectionClient::new(REGION_MODEL, vec![counter()])
        .with_glyphs(0, vec![glyph(5.0, 2)]);
    let app = app_with(client.clone(), &dir);

    let (status, _) = send(
        app,
        predict_request(multipart_body("image", Some("../meter.png"), &png_bytes())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let calls = client.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].model_id, REGION_MODEL);
    assert!(calls[0].file_name.ends_with("meter.png"));
    assert_eq!(calls[1].model_id, GLYPH_MODEL);
    assert!(calls[1].file_name.starts_with("crop_0_"));

    // Upload kept inside the uploads dir, crops cleaned up
    let remaining: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].ends_with("meter.png"));
}

#[tokio::test]
async fn test_upload_over_limit() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig {
        uploads_dir: dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };
    let pipeline = ReadingPipeline::new(
        Arc::new(MockDetectionClient::new(REGION_MODEL, vec![])),
        config,
    )
    .unwrap();
    let app = create_app(AppState::new(Arc::new(pipeline), 16));

    let (status, json) = send(
        app,
        predict_request(multipart_body("image", Some("meter.png"), &png_bytes())),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].is_string());
}
