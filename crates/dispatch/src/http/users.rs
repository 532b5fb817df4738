// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for driver location and availability updates.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::DispatchError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LocationBody {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityBody {
    pub availability: bool,
}

/// `PUT /users/{id}/location`
pub async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<LocationBody>,
) -> Result<impl IntoResponse, DispatchError> {
    if !(-90.0..=90.0).contains(&body.latitude) {
        return Err(DispatchError::Validation("invalid latitude (must be between -90 and 90)".into()));
    }
    if !(-180.0..=180.0).contains(&body.longitude) {
        return Err(DispatchError::Validation("invalid longitude (must be between -180 and 180)".into()));
    }
    state.store.get_user(id).await?.ok_or_else(|| DispatchError::NotFound("user not found".into()))?;
    state.store.set_location(id, body.latitude, body.longitude).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// `PUT /users/{id}/availability`
pub async fn update_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<AvailabilityBody>,
) -> Result<impl IntoResponse, DispatchError> {
    let user = state.store.get_user(id).await?.ok_or_else(|| DispatchError::NotFound("user not found".into()))?;
    if !user.is_driver {
        return Err(DispatchError::Validation("only drivers have availability".into()));
    }
    state.store.set_availability(id, body.availability).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
