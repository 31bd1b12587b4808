//! Liveness and debug toggles

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TransformStatus {
    pub data_transform: bool,
}

/// GET /api/v1/ping
pub async fn ping() -> &'static str {
    "pong"
}

/// GET /api/v1/debug/transformData/{enabled}
pub async fn transform_data(
    State(state): State<AppState>,
    Path(enabled): Path<String>,
) -> Result<Json<TransformStatus>, ApiError> {
    let enabled: bool = enabled
        .to_lowercase()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid boolean: {enabled}")))?;
    state.service().set_data_transform(enabled);
    Ok(Json(TransformStatus {
        data_transform: state.service().settings().data_transform(),
    }))
}
