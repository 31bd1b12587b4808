//! Command handlers
//!
//! Reads answer with the produced event. A read whose values hit a
//! transform or assertion failure still answers 200, with the failure
//! reported next to the event.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use devsvc_core::{Direction, Event};
use devsvc_runtime::CommandOutcome;

use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

// =============================================================================
// Response Types
// =============================================================================

/// Body of a read that completed with non-fatal failures
#[derive(Debug, Serialize)]
pub struct PartialReadResponse {
    pub event: Event,
    pub error: ErrorResponse,
}

fn read_response(outcome: CommandOutcome) -> Response {
    match outcome.failure {
        None => Json(outcome.event).into_response(),
        Some(failure) => Json(PartialReadResponse {
            event: outcome.event,
            error: ErrorResponse::from(&failure),
        })
        .into_response(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/v1/device/{id}/{command}
pub async fn read_command(
    State(state): State<AppState>,
    Path((device_id, command)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let outcome = state
        .service()
        .dispatch(&device_id, &command, Direction::Get, "")
        .await?
        .ok_or_else(|| ApiError::Internal(format!("read of {command} produced no event")))?;
    Ok(read_response(outcome))
}

/// PUT /api/v1/device/{id}/{command}
///
/// Body: `[{"param": "value"}, ...]`
pub async fn write_command(
    State(state): State<AppState>,
    Path((device_id, command)): Path<(String, String)>,
    body: String,
) -> Result<StatusCode, ApiError> {
    state
        .service()
        .dispatch(&device_id, &command, Direction::Set, &body)
        .await?;
    Ok(StatusCode::OK)
}

/// GET /api/v1/device/all/{command}
pub async fn read_command_all(
    State(state): State<AppState>,
    Path(command): Path<String>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let events = state
        .service()
        .dispatch_all(&command, Direction::Get, "")
        .await?;
    Ok(Json(events))
}

/// PUT /api/v1/device/all/{command}
pub async fn write_command_all(
    State(state): State<AppState>,
    Path(command): Path<String>,
    body: String,
) -> Result<StatusCode, ApiError> {
    state
        .service()
        .dispatch_all(&command, Direction::Set, &body)
        .await?;
    Ok(StatusCode::OK)
}
