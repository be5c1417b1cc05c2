//! Integration tests for health, admin and middleware behaviour.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{ScriptedEncoder, TestHarness};
use http_body_util::BodyExt;
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_ok() {
    let h = TestHarness::new();
    let response = h
        .app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_slice(
        &response.into_body().collect().await.unwrap().to_bytes(),
    )
    .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["inflight"], 0);
}

#[tokio::test]
async fn request_id_is_generated_or_echoed() {
    let (_h, addr) = TestHarness::with_server(ScriptedEncoder::new(1)).await;
    let client = reqwest::Client::new();

    let response = client.get(format!("http://{addr}/health")).send().await.unwrap();
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let response = client
        .get(format!("http://{addr}/stream/abc/master.m3u8"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(response.headers()["x-request-id"], "trace-me");
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["request_id"], "trace-me");
}

#[tokio::test]
async fn admin_tools_lists_known_tools() {
    let h = TestHarness::new();
    let response = h
        .app()
        .oneshot(
            Request::builder()
                .uri("/admin/tools")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_slice(
        &response.into_body().collect().await.unwrap().to_bytes(),
    )
    .unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["ffmpeg", "ffprobe"]);
}
