//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! every endpoint using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use gem_advisor::api::{create_app, ApiState};
use gem_advisor::optimization::RuleBasedOptimizer;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_state() -> ApiState {
    ApiState::new(Arc::new(RuleBasedOptimizer::builtin()))
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("response should be valid JSON")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// All GET endpoints should return 200.
#[tokio::test]
async fn test_get_endpoints_return_200() {
    let endpoints = [
        "/health",
        "/api/v1/vehicles",
        "/api/v1/vehicles/e4",
        "/api/v1/strategies",
    ];

    for endpoint in &endpoints {
        let app = create_app(create_test_state());
        let resp = app.oneshot(get(endpoint)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "GET {endpoint}");
    }
}

#[tokio::test]
async fn test_health_is_plain_status() {
    let app = create_app(create_test_state());
    let resp = app.oneshot(get("/health")).await.unwrap();
    let v = body_json(resp).await;
    assert_eq!(v, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_vehicle_list_is_sorted_with_fallback() {
    let app = create_app(create_test_state());
    let resp = app.oneshot(get("/api/v1/vehicles")).await.unwrap();
    let v = body_json(resp).await;
    assert_eq!(
        v["data"]["models"],
        serde_json::json!(["e2", "e4", "e6", "el-xd", "elss"])
    );
    assert_eq!(v["data"]["fallback"], "e4");
    assert!(v["meta"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_vehicle_lookup_normalizes_and_404s() {
    let app = create_app(create_test_state());
    let resp = app.oneshot(get("/api/v1/vehicles/GEM-e6")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["data"]["model"], "e6");
    assert_eq!(v["data"]["motor"]["type"], "shunt");

    let app = create_app(create_test_state());
    let resp = app.oneshot(get("/api/v1/vehicles/e99")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], "NOT_FOUND");
    assert!(v["error"]["message"].as_str().unwrap().contains("e99"));
}

#[tokio::test]
async fn test_strategies_lists_all_five() {
    let app = create_app(create_test_state());
    let resp = app.oneshot(get("/api/v1/strategies")).await.unwrap();
    let v = body_json(resp).await;
    let names: Vec<&str> = v["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["strategy"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 5);
    for expected in ["speed", "range", "balanced", "efficiency", "hills"] {
        assert!(names.contains(&expected), "missing {expected}");
    }
}

#[tokio::test]
async fn test_optimize_returns_camel_case_result() {
    let app = create_app(create_test_state());
    let body = r#"{
        "vehicleData": { "model": "e4", "year": 2019 },
        "priorities": { "speed": 9, "range": 2, "acceleration": 5, "efficiency": 2, "hills": 0 },
        "currentSettings": [22, null, null, 245],
        "conditions": { "temperature": 72, "surface": "paved" }
    }"#;
    let resp = app.oneshot(post_json("/api/v1/optimize", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = body_json(resp).await;
    let data = &v["data"];
    assert_eq!(data["success"], true);
    assert_eq!(data["strategy"], "speed");
    assert_eq!(data["method"], "rule_based");
    assert_eq!(data["source"], "rule_based_optimizer");
    assert_eq!(data["vehicleModel"], "e4");
    assert_eq!(data["exactMatch"], true);
    assert_eq!(data["optimizedSettings"].as_array().unwrap().len(), 25);
    assert!(data["performance"]["speed"].is_number());
    assert!(data["baselinePerformance"].is_object());
    assert!(data["confidence"].as_f64().unwrap() <= 0.95);
}

#[tokio::test]
async fn test_optimize_empty_object_uses_defaults() {
    let app = create_app(create_test_state());
    let resp = app.oneshot(post_json("/api/v1/optimize", "{}")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["data"]["success"], true);
    assert_eq!(v["data"]["vehicleModel"], "e4");
    assert_eq!(v["data"]["exactMatch"], false);
}

#[tokio::test]
async fn test_optimize_malformed_json_is_bad_request() {
    let app = create_app(create_test_state());
    let resp = app
        .oneshot(post_json("/api/v1/optimize", "{not json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_batch_preserves_order() {
    let app = create_app(create_test_state());
    let body = r#"[
        { "vehicleData": { "model": "e2" } },
        { "vehicleData": { "model": "elss" }, "conditions": { "temperature": 30 } },
        { "vehicleData": { "model": "unknown cart" } }
    ]"#;
    let resp = app
        .oneshot(post_json("/api/v1/optimize/batch", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = body_json(resp).await;
    let results = v["data"].as_array().unwrap();
    let models: Vec<&str> = results
        .iter()
        .map(|r| r["vehicleModel"].as_str().unwrap())
        .collect();
    assert_eq!(models, ["e2", "elss", "e4"]);
    assert_eq!(results[1]["environmentalOverrides"][0], "cold_weather");
}

#[tokio::test]
async fn test_batch_over_limit_is_rejected() {
    let app = create_app(create_test_state());
    let requests = vec![serde_json::json!({}); gem_advisor::api::handlers::MAX_BATCH_SIZE + 1];
    let body = serde_json::to_string(&requests).unwrap();
    let resp = app
        .oneshot(post_json("/api/v1/optimize/batch", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = create_app(create_test_state());
    let resp = app.oneshot(get("/api/v1/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
