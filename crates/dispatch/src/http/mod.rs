// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport for the dispatch service.

pub mod rides;
pub mod users;
pub mod ws;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the axum `Router` with all dispatch routes.
///
/// No auth middleware layer is added: authorization beyond the opaque
/// `user_id`/`driver_id` supplied by callers is out of scope.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ride/request", post(rides::request_ride))
        .route("/rides", get(rides::list_rides))
        .route("/rides/{id}", get(rides::get_ride))
        .route("/rides/{id}/accept", put(rides::accept_ride))
        .route("/rides/{id}/decline", put(rides::decline_ride))
        .route("/rides/{id}/cancel", put(rides::cancel_ride))
        .route("/rides/{id}/start", put(rides::start_ride))
        .route("/rides/{id}/complete", put(rides::complete_ride))
        .route("/users/{id}/location", put(users::update_location))
        .route("/users/{id}/availability", put(users::update_availability))
        .route("/ws/{user_id}", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
