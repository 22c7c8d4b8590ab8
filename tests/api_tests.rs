//! Ops API routing, auth guard and manual task triggers.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use yardman::config::Config;
use yardman::state::AppState;

async fn spawn_app(api_key: &str) -> Router {
    let db_path =
        std::env::temp_dir().join(format!("yardman-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.api_key = api_key.to_string();
    config.mail.enabled = false;
    config.gateway.enabled = false;

    let state = Arc::new(AppState::new(config).await.expect("failed to build app state"));
    yardman::api::router(state)
}

#[tokio::test]
async fn liveness_endpoint_is_open() {
    let app = spawn_app("secret").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_reports_database_state() {
    let app = spawn_app("secret").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ready"], true);
    assert_eq!(json["database"], true);
}

#[tokio::test]
async fn status_requires_api_key_when_configured() {
    let app = spawn_app("secret").await;

    let unauthorized = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

    let authorized = app
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .header("x-api-key", "secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(authorized.status(), StatusCode::OK);

    let body = authorized.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["database_ok"], true);
}

#[tokio::test]
async fn empty_api_key_leaves_ops_endpoints_open() {
    let app = spawn_app("").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn manual_task_trigger_returns_a_summary() {
    let app = spawn_app("secret").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/tasks/force-logout")
                .header("x-api-key", "secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["sessions_closed"], 0);
}

#[tokio::test]
async fn wrong_api_key_is_rejected_on_task_triggers() {
    let app = spawn_app("secret").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/tasks/token-sweep")
                .header("x-api-key", "not-the-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
