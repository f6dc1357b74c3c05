//! Health check endpoints

use axum::{Json, extract::State};

use crate::actors::messages::MonitorStatus;
use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
};
use crate::health::SystemHealthSnapshot;

/// GET /api/v1/health
///
/// Probes every backing service live. Always 200; degraded and down services
/// are reported in the body.
pub async fn health_check(State(state): State<ApiState>) -> Json<SystemHealthSnapshot> {
    Json(state.aggregator.snapshot().await)
}

/// GET /api/v1/health/connection
///
/// Returns the connection monitor's current view of the document store
pub async fn connection_status(State(state): State<ApiState>) -> ApiResult<Json<MonitorStatus>> {
    let status = state
        .monitor
        .status()
        .await
        .map_err(|e| ApiError::Unavailable(format!("connection monitor unavailable: {e}")))?;

    Ok(Json(status))
}
