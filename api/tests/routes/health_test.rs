use crate::helpers::{TestApp, empty_request};
use axum::http::StatusCode;

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let (status, json) = app.send(empty_request("GET", "/api/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], "OK");
}
