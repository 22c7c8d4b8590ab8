use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub database_ok: bool,
    pub scheduler_enabled: bool,
    pub sweep_interval_minutes: u32,
    pub daily_interval_hours: u32,
    pub pending_notifications: usize,
}

pub async fn health_live() -> Json<HealthLiveResponse> {
    Json(HealthLiveResponse { status: "ok" })
}

pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store.ping().await.is_ok();

    let body = HealthReadyResponse {
        ready: database,
        database,
    };

    let status = if body.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body)).into_response()
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let database_ok = state.store.ping().await.is_ok();
    let pending = state
        .store
        .due_notifications(
            &chrono::Utc::now().to_rfc3339(),
            state.config.jobs.notification_max_retries,
            state.config.jobs.notification_batch_size,
        )
        .await
        .map(|rows| rows.len())
        .unwrap_or(0);

    let status = SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database_ok,
        scheduler_enabled: state.config.scheduler.enabled,
        sweep_interval_minutes: state.config.scheduler.sweep_interval_minutes,
        daily_interval_hours: state.config.scheduler.daily_interval_hours,
        pending_notifications: pending,
    };

    Ok(Json(ApiResponse::success(status)))
}
