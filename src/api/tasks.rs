use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ForceLogoutResult {
    pub users_checked: usize,
    pub users_logged_out: usize,
    pub sessions_closed: u64,
}

#[derive(Debug, Serialize)]
pub struct TokenSweepResult {
    pub users_processed: usize,
    pub tokens_revoked: u64,
}

#[derive(Debug, Serialize)]
pub struct DispatchResult {
    pub processed: usize,
    pub delivered: usize,
    pub retried: usize,
    pub permanently_failed: usize,
}

#[derive(Debug, Serialize)]
pub struct BookingExpiryResult {
    pub scanned: usize,
    pub notified: usize,
    pub expired: usize,
}

pub async fn trigger_force_logout(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ForceLogoutResult>>, ApiError> {
    let summary = state.force_logout.run().await?;
    Ok(Json(ApiResponse::success(ForceLogoutResult {
        users_checked: summary.users_checked,
        users_logged_out: summary.users_logged_out,
        sessions_closed: summary.sessions_closed,
    })))
}

pub async fn trigger_token_sweep(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<TokenSweepResult>>, ApiError> {
    let summary = state.token_sweep.run().await?;
    Ok(Json(ApiResponse::success(TokenSweepResult {
        users_processed: summary.users_processed,
        tokens_revoked: summary.tokens_revoked,
    })))
}

pub async fn trigger_dispatch(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DispatchResult>>, ApiError> {
    let summary = state.dispatcher.run().await?;
    Ok(Json(ApiResponse::success(DispatchResult {
        processed: summary.processed,
        delivered: summary.delivered,
        retried: summary.retried,
        permanently_failed: summary.permanently_failed,
    })))
}

pub async fn trigger_booking_expiry(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<BookingExpiryResult>>, ApiError> {
    let summary = state.booking_expiry.run().await?;
    Ok(Json(ApiResponse::success(BookingExpiryResult {
        scanned: summary.scanned,
        notified: summary.notified,
        expired: summary.expired,
    })))
}
