//! Lifecycle callback handlers for devices and profiles

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use devsvc_core::{Device, DeviceProfile};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/v1/callback/device
pub async fn add_device(
    State(state): State<AppState>,
    Json(device): Json<Device>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let added = state.service().add_device(device)?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// PUT /api/v1/callback/device
pub async fn update_device(
    State(state): State<AppState>,
    Json(device): Json<Device>,
) -> Result<StatusCode, ApiError> {
    state.service().update_device(device)?;
    Ok(StatusCode::OK)
}

/// DELETE /api/v1/callback/device/{id}
pub async fn remove_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Device>, ApiError> {
    let removed = state.service().remove_device(&id).await?;
    Ok(Json(removed))
}

/// POST /api/v1/callback/profile
pub async fn add_profile(
    State(state): State<AppState>,
    Json(profile): Json<DeviceProfile>,
) -> Result<(StatusCode, Json<DeviceProfile>), ApiError> {
    let added = state.service().add_profile(profile)?;
    Ok((StatusCode::CREATED, Json(added)))
}

/// PUT /api/v1/callback/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Json(profile): Json<DeviceProfile>,
) -> Result<StatusCode, ApiError> {
    state.service().update_profile(profile)?;
    Ok(StatusCode::OK)
}

/// DELETE /api/v1/callback/profile/{id}
pub async fn remove_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeviceProfile>, ApiError> {
    let removed = state.service().remove_profile(&id)?;
    Ok(Json(removed))
}
