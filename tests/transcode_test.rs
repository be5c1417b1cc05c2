//! Integration tests for whole-file transcodes.

mod common;

use std::sync::atomic::Ordering;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{ScriptedEncoder, TestHarness};
use http_body_util::BodyExt;
use tc_core::TranscodeQuality;
use tower::ServiceExt;

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn transcode_is_generated_once_and_signature_recorded() {
    let h = TestHarness::new();
    let id = h.register(21);

    let response = h
        .app()
        .oneshot(request("GET", &format!("/transcode/{id}/low")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/ogg");
    assert_eq!(response.headers()["accept-ranges"], "bytes");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OggS low transcode payload");

    let row = tc_db::queries::assets::get_asset(&h.conn(), id)
        .unwrap()
        .unwrap();
    assert_eq!(row.sig_low.as_deref(), Some(row.file_signature.as_str()));
    assert!(row.sig_medium.is_none());

    let response = h
        .app()
        .oneshot(request("GET", &format!("/transcode/{id}/low")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.encoder.transcode_runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn changed_source_regenerates() {
    let h = TestHarness::new();
    let id = h.register(22);

    h.ctx
        .engine
        .ensure_transcoded(id, TranscodeQuality::High)
        .await
        .unwrap();
    tc_db::queries::assets::upsert_asset(&h.conn(), id, "/music/new.flac", "new-signature")
        .unwrap();

    let response = h
        .app()
        .oneshot(request("GET", &format!("/transcode/{id}/high")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.encoder.transcode_runs.load(Ordering::SeqCst), 2);

    let row = tc_db::queries::assets::get_asset(&h.conn(), id)
        .unwrap()
        .unwrap();
    assert_eq!(row.sig_high.as_deref(), Some("new-signature"));
}

#[tokio::test]
async fn range_requests_are_partial() {
    let (h, addr) = TestHarness::with_server(ScriptedEncoder::new(1)).await;
    let id = h.register(23);

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/transcode/{id}/medium"))
        .header("range", "bytes=0-3")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 206);
    assert_eq!(response.headers()["content-range"], "bytes 0-3/29");
    assert_eq!(&response.bytes().await.unwrap()[..], b"OggS");
}

#[tokio::test]
async fn prefetch_is_accepted_and_runs_in_background() {
    let h = TestHarness::new();
    let id = h.register(24);

    let response = h
        .app()
        .oneshot(request("POST", &format!("/transcode/{id}/high")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: serde_json::Value = serde_json::from_slice(
        &response.into_body().collect().await.unwrap().to_bytes(),
    )
    .unwrap();
    assert_eq!(body["quality"], "high");
    assert_eq!(body["status"], "queued");

    h.wait_for(&h.layout().transcode_output(id, TranscodeQuality::High))
        .await;
}

#[tokio::test]
async fn hard_failure_is_reported() {
    let h = TestHarness::with_encoder(ScriptedEncoder {
        fail_code: Some(2),
        ..ScriptedEncoder::new(1)
    });
    let id = h.register(25);

    let response = h
        .app()
        .oneshot(request("GET", &format!("/transcode/{id}/low")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let row = tc_db::queries::assets::get_asset(&h.conn(), id)
        .unwrap()
        .unwrap();
    assert!(row.sig_low.is_none());
}

#[tokio::test]
async fn invalid_requests() {
    let h = TestHarness::new();
    let id = h.register(26);

    let response = h
        .app()
        .oneshot(request("GET", &format!("/transcode/{id}/lossless")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = h
        .app()
        .oneshot(request("POST", "/transcode/404/low"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(h.encoder.transcode_runs.load(Ordering::SeqCst), 0);
}
