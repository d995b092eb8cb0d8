use std::net::SocketAddr;
use std::time::Duration;

use agent::LocalAgent;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use perception::{BoundingBox, MockDetector, ObjectDetector, PerceptionConfig, PerceptionError, RawDetection};
use serde_json::{json, Value};
use speech::{DisabledRecognizer, SilentTts};
use tower::ServiceExt;

use super::*;

fn test_state(detections: Vec<RawDetection>) -> SharedState {
    let perception = PerceptionModule::new(
        PerceptionConfig::default(),
        Box::new(MockDetector::scripted(detections)),
    );
    let state = AppState::new(
        AppSettings::default(),
        perception,
        Box::new(LocalAgent::templates_only()),
        Arc::new(SilentTts),
        Arc::new(DisabledRecognizer),
    );
    Arc::new(RwLock::new(state))
}

fn chair_scene() -> SharedState {
    // 544px chair in a 480p frame -> 0.79m, left
    test_state(vec![RawDetection::new(
        "chair",
        0.91,
        BoundingBox::new(0.0, 0.0, 100.0, 544.0),
    )])
}

fn app(state: SharedState) -> Router {
    create_router(state, &RateLimitConfig::default(), None)
}

fn request(method: &str, uri: &str, body: Body) -> Request<Body> {
    let mut request = Request::builder().method(method).uri(uri).body(body).unwrap();
    // Peer address for the per-IP rate limiter
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4242))));
    request
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    let mut request = request(method, uri, Body::from(body.to_string()));
    request.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("application/json"),
    );
    request
}

fn jpeg_frame() -> Vec<u8> {
    VideoFrame::solid(640, 480, [90, 90, 90]).encode_jpeg(85).unwrap()
}

async fn send(state: &SharedState, request: Request<Body>) -> (StatusCode, Value) {
    let response = app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn upload(state: &SharedState) -> (StatusCode, Value) {
    send(state, request("POST", "/api/v1/frames", Body::from(jpeg_frame()))).await
}

#[tokio::test]
async fn test_health() {
    let state = test_state(vec![]);
    let (status, body) = send(&state, request("GET", "/api/v1/health", Body::empty())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["detector"], "mock");
    assert_eq!(body["components"]["agent_type"], "local");
    assert_eq!(body["components"]["vlm"], false);
    assert_eq!(body["components"]["has_frame"], false);
    assert_eq!(body["features"]["gemini_api"], false);
}

#[tokio::test]
async fn test_frame_upload_publishes_scene() {
    let state = chair_scene();

    let (status, _) = send(&state, request("GET", "/api/v1/scene", Body::empty())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, scene) = upload(&state).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scene["num_objects"], 1);
    assert_eq!(scene["safety_status"], "DANGER - Immediate obstacles detected");
    assert_eq!(scene["objects"][0]["class"], "chair");
    assert_eq!(scene["objects"][0]["position"], "left");
    assert_eq!(scene["objects"][0]["bbox"], json!([0.0, 0.0, 100.0, 544.0]));
    assert_eq!(scene["objects"][0]["distance_m"], 0.79);
    assert_eq!(scene["critical_alerts"].as_array().unwrap().len(), 1);

    let (status, latest) = send(&state, request("GET", "/api/v1/scene", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest, scene);

    // The danger was announced once
    assert_eq!(state.read().await.announcer.announced_count(), 1);
}

#[tokio::test]
async fn test_invalid_frame_rejected() {
    let state = test_state(vec![]);
    let (status, body) = send(&state, request("POST", "/api/v1/frames", Body::from("not an image"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
    assert!(state.read().await.latest.is_none());
}

#[tokio::test]
async fn test_query_before_frame_conflicts() {
    let state = test_state(vec![]);
    let (status, _) = send(
        &state,
        json_request("POST", "/api/v1/query", json!({ "query": "Is it safe?" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_query_answers_from_templates() {
    let state = chair_scene();
    upload(&state).await;

    let (status, body) = send(
        &state,
        json_request("POST", "/api/v1/query", json!({ "query": "Is it safe to walk?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["text_response"],
        "Caution! There is a chair only 0.8 meters away on your left. Please move carefully."
    );
    assert_eq!(body["used_vlm"], false);
    assert_eq!(body["haptic_feedback"]["enabled"], true);
    assert_eq!(body["cv_summary"]["critical_count"], 1);

    let (status, history) = send(&state, request("GET", "/api/v1/history", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["agent_type"], "local");
    assert_eq!(history["exchanges"].as_array().unwrap().len(), 1);
    assert_eq!(history["exchanges"][0]["query"], "Is it safe to walk?");

    let (status, _) = send(&state, request("DELETE", "/api/v1/history", Body::empty())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, history) = send(&state, request("GET", "/api/v1/history", Body::empty())).await;
    assert!(history["exchanges"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_query_rejected() {
    let state = chair_scene();
    upload(&state).await;
    let (status, _) = send(&state, json_request("POST", "/api/v1/query", json!({ "query": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_voice_without_recognizer() {
    let state = chair_scene();
    upload(&state).await;
    let (status, body) = send(&state, request("POST", "/api/v1/voice", Body::from(vec![0u8; 64]))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "Unprocessable: no speech recognized");
}

#[tokio::test]
async fn test_calibrate() {
    let state = test_state(vec![]);
    let calibration = json!({
        "bbox": [0.0, 40.0, 100.0, 440.0],
        "class_name": "person",
        "known_distance_m": 4.08
    });

    let (status, _) = send(&state, json_request("POST", "/api/v1/calibrate", calibration.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    upload(&state).await;
    let (status, body) = send(&state, json_request("POST", "/api/v1/calibrate", calibration)).await;
    assert_eq!(status, StatusCode::OK);
    // 480p frame -> 480px focal length; 4.08 * 400 / (1.7 * 480)
    assert_eq!(body["focal_length_px"], 480.0);
    let factor = body["calibration_factor"].as_f64().unwrap();
    assert!((factor - 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_rate_limit_on_query() {
    let state = chair_scene();
    upload(&state).await;
    let router = create_router(
        state,
        &RateLimitConfig {
            per_second: 60,
            burst_size: 1,
        },
        None,
    );

    let query = || json_request("POST", "/api/v1/query", json!({ "query": "hello" }));
    let first = router.clone().oneshot(query()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let second = router.oneshot(query()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_metrics_route_only_with_handle() {
    let state = test_state(vec![]);
    let (status, _) = send(&state, request("GET", "/metrics", Body::empty())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle();
    let router = create_router(state, &RateLimitConfig::default(), Some(handle));
    let response = router.oneshot(request("GET", "/metrics", Body::empty())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_overlay_colors() {
    let state = chair_scene();
    let (status, _) = send(&state, request("GET", "/api/v1/scene/overlay", Body::empty())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    upload(&state).await;
    let (status, bands) = send(&state, request("GET", "/api/v1/scene/overlay", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bands[0]["class_name"], "chair");
    assert_eq!(bands[0]["safety_level"], "critical");
    assert_eq!(bands[0]["color_bgr"], json!([0, 0, 255]));
    assert_eq!(bands[0]["bounding_box"], json!([0.0, 0.0, 100.0, 544.0]));
}

#[tokio::test]
async fn test_navigation_placeholders() {
    let state = test_state(vec![]);
    let (status, location) = send(&state, request("GET", "/api/v1/navigation/location", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(location["mode"], "simulated");

    let (status, plan) = send(
        &state,
        json_request("POST", "/api/v1/navigation/route", json!({ "destination": "kitchen" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["status"], "not_implemented");
    assert_eq!(plan["start"], "current location");
    assert_eq!(plan["destination"], "kitchen");

    let (status, _) = send(
        &state,
        json_request("POST", "/api/v1/navigation/route", json!({ "destination": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_navigation_memory() {
    let state = chair_scene();
    let (status, memory) = send(&state, request("GET", "/api/v1/navigation/memory", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(memory["stored_objects"], 0);

    upload(&state).await;
    let (_, memory) = send(&state, request("GET", "/api/v1/navigation/memory", Body::empty())).await;
    assert_eq!(memory["stored_objects"], 1);
    assert_eq!(memory["storage_type"], "in_memory");
}

/// Detector that takes a while, like a model on a slow CPU
struct SlowDetector;

impl ObjectDetector for SlowDetector {
    fn detect(&self, _frame: &VideoFrame) -> Result<Vec<RawDetection>, PerceptionError> {
        std::thread::sleep(Duration::from_millis(300));
        Ok(vec![])
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_health_responds_during_detection() {
    let perception = PerceptionModule::new(PerceptionConfig::default(), Box::new(SlowDetector));
    let state: SharedState = Arc::new(RwLock::new(AppState::new(
        AppSettings::default(),
        perception,
        Box::new(LocalAgent::templates_only()),
        Arc::new(SilentTts),
        Arc::new(DisabledRecognizer),
    )));

    let pending = tokio::spawn({
        let state = state.clone();
        async move { upload(&state).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (status, health) = tokio::time::timeout(
        Duration::from_millis(150),
        send(&state, request("GET", "/api/v1/health", Body::empty())),
    )
    .await
    .expect("health blocked behind detection");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["components"]["detector"], "slow");
    assert!(!pending.is_finished());

    let (status, scene) = pending.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scene["num_objects"], 0);
    assert_eq!(state.read().await.perception.stats().frames_processed, 1);
}
