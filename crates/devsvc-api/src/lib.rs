//! devsvc-api - REST surface for the device service
//!
//! A thin axum router over [`DeviceService`](devsvc_runtime::DeviceService):
//! command dispatch, lifecycle callbacks, liveness and the transform toggle.
//!
//! # Usage
//!
//! ```ignore
//! use devsvc_api::{create_router, AppState};
//!
//! let service = Arc::new(DeviceService::new(name, caches, driver, sink, metadata, settings));
//! service.start().await?;
//! let router = create_router(AppState::new(service));
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the REST router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Liveness
        .route("/api/v1/ping", get(handlers::debug::ping))
        // Commands; the static "all" segment wins over a device id
        .route(
            "/api/v1/device/all/{command}",
            get(handlers::command::read_command_all).put(handlers::command::write_command_all),
        )
        .route(
            "/api/v1/device/{id}/{command}",
            get(handlers::command::read_command).put(handlers::command::write_command),
        )
        // Lifecycle callbacks
        .route(
            "/api/v1/callback/device",
            post(handlers::callback::add_device).put(handlers::callback::update_device),
        )
        .route(
            "/api/v1/callback/device/{id}",
            delete(handlers::callback::remove_device),
        )
        .route(
            "/api/v1/callback/profile",
            post(handlers::callback::add_profile).put(handlers::callback::update_profile),
        )
        .route(
            "/api/v1/callback/profile/{id}",
            delete(handlers::callback::remove_profile),
        )
        // Debug
        .route(
            "/api/v1/debug/transformData/{enabled}",
            get(handlers::debug::transform_data),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
