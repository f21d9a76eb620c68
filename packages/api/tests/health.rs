mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn health_and_database_round_trip() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.get("/api/v1/health/db", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["rtt"].is_u64());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Shutterlink API");
    assert!(body["paths"]["/checkout"]["post"].is_object());
}
