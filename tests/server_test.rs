//! Integration tests for health, OpenAPI and request ids.

mod common;

use common::TestHarness;

#[tokio::test]
async fn health_reports_storage_backend() {
    let h = TestHarness::start().await;
    let resp = reqwest::get(h.url("/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let h = TestHarness::start().await;
    let body: serde_json::Value = reqwest::get(h.url("/api-docs/openapi.json"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["paths"]["/api/video_upload/{id}"].is_object());
}

#[tokio::test]
async fn request_id_is_echoed() {
    let h = TestHarness::start().await;
    let resp = h
        .client
        .get(h.url("/health"))
        .header("x-request-id", "req-abc")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers().get("x-request-id").unwrap().to_str().unwrap(),
        "req-abc"
    );

    let resp = reqwest::get(h.url("/health")).await.unwrap();
    assert!(resp.headers().contains_key("x-request-id"));
}
