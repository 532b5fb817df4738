// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for ride requests, the driver action handler, and ride
//! lifecycle transitions (start/complete/cancel).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::intake::{self, RideRequestInput};
use crate::model::{DriverSummary, NotificationEnvelope, Ride, RideDetail, RiderSummary};
use crate::offer;
use crate::state::AppState;
use crate::store::RideFilter;

#[derive(Debug, Deserialize)]
pub struct RideRequestBody {
    pub user_id: i64,
    pub source_location: String,
    pub dest_location: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    #[serde(default)]
    pub dest_lat: Option<f64>,
    #[serde(default)]
    pub dest_lng: Option<f64>,
}

impl From<RideRequestBody> for RideRequestInput {
    fn from(b: RideRequestBody) -> Self {
        Self {
            user_id: b.user_id,
            source_location: b.source_location,
            dest_location: b.dest_location,
            pickup_lat: b.pickup_lat,
            pickup_lng: b.pickup_lng,
            dest_lat: b.dest_lat,
            dest_lng: b.dest_lng,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DriverActionBody {
    pub driver_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelBody {}

#[derive(Debug, Deserialize)]
pub struct CompleteQuery {
    #[serde(default)]
    pub fare: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListRidesQuery {
    pub status: Option<String>,
    pub rider_id: Option<i64>,
    pub driver_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ride: Option<Ride>,
}

/// `POST /ride/request`
pub async fn request_ride(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RideRequestBody>,
) -> Result<impl IntoResponse, DispatchError> {
    let input: RideRequestInput = body.into();
    let (lat, lng) = intake::validate_coordinates(&input)?;

    let mut tx = state.store.begin().await?;

    let user = state.store.locked_user(&mut tx, input.user_id).await?;
    intake::validate_rider(user.as_ref())?;

    if state.store.rider_has_active_ride(&mut tx, input.user_id).await? {
        return Err(DispatchError::Validation("you already have a pending ride".into()));
    }

    state.store.set_location_tx(&mut tx, input.user_id, lat, lng).await?;
    let ride = state.store.insert_ride(&mut tx, intake::to_new_ride(&input, lat, lng)).await?;
    tx.commit().await?;

    Ok(Json(ride))
}

/// `GET /rides/{id}`
pub async fn get_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, DispatchError> {
    let ride = state.store.get_ride(id).await?.ok_or_else(|| DispatchError::NotFound("ride not found".into()))?;
    Ok(Json(ride_detail(&state, ride).await?))
}

/// `GET /rides`
pub async fn list_rides(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRidesQuery>,
) -> Result<impl IntoResponse, DispatchError> {
    let filter = RideFilter { status: query.status, rider_id: query.rider_id, driver_id: query.driver_id };
    let rides = state.store.list_rides(filter).await?;
    Ok(Json(rides))
}

/// `PUT /rides/{id}/accept`
pub async fn accept_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<DriverActionBody>,
) -> Result<impl IntoResponse, DispatchError> {
    let mut tx = state.store.begin().await?;
    let ride = state.store.locked_get(&mut tx, id).await?.ok_or_else(|| DispatchError::NotFound("ride not found".into()))?;

    let next = offer::accept(&ride, body.driver_id, Utc::now())?;
    state.store.update_ride(&mut tx, &next).await?;
    state.store.set_availability_tx(&mut tx, body.driver_id, false).await?;
    tx.commit().await?;

    let detail = ride_detail(&state, next.clone()).await?;
    state
        .notifications
        .deliver(
            next.rider_id,
            NotificationEnvelope::DriverAssigned {
                ride_id: next.id,
                driver_id: body.driver_id,
                driver_name: detail.driver.as_ref().map(|d| d.name.clone()).unwrap_or_default(),
                driver_vehicle: detail.driver.as_ref().and_then(|d| d.vehicle.clone()),
                driver_rating: detail.driver.as_ref().and_then(|d| d.rating),
            },
        )
        .await;

    Ok(Json(ActionResponse { success: true, message: "ride accepted successfully".into(), ride: Some(next) }))
}

/// `PUT /rides/{id}/decline`
pub async fn decline_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<DriverActionBody>,
) -> Result<impl IntoResponse, DispatchError> {
    let mut tx = state.store.begin().await?;
    let ride = state.store.locked_get(&mut tx, id).await?.ok_or_else(|| DispatchError::NotFound("ride not found".into()))?;

    let declined = offer::decline(&ride, body.driver_id)?;
    let now = Utc::now();
    let eligible = state.store.count_eligible_drivers(&mut tx, &declined.declined_driver_ids, now).await?;

    let (final_ride, message) = if eligible == 0 {
        let cancelled = offer::cancel_exhausted(&declined, now);
        state.store.update_ride(&mut tx, &cancelled).await?;
        (cancelled, "ride cancelled - no drivers available")
    } else {
        state.store.update_ride(&mut tx, &declined).await?;
        (declined, "ride declined, will try another driver")
    };
    tx.commit().await?;

    if final_ride.status() == crate::model::RideStatus::Cancelled {
        state
            .notifications
            .deliver(
                final_ride.rider_id,
                NotificationEnvelope::RideCancelled {
                    ride_id: final_ride.id,
                    reason: "no_drivers_available".into(),
                    message: "no eligible drivers remain for this ride".into(),
                },
            )
            .await;
    }

    Ok(Json(ActionResponse { success: true, message: message.into(), ride: None }))
}

/// `PUT /rides/{id}/cancel`
pub async fn cancel_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(_body): Json<CancelBody>,
) -> Result<impl IntoResponse, DispatchError> {
    let mut tx = state.store.begin().await?;
    let ride = state.store.locked_get(&mut tx, id).await?.ok_or_else(|| DispatchError::NotFound("ride not found".into()))?;

    let (next, freed_driver) = offer::cancel_by_rider(&ride, Utc::now())?;
    state.store.update_ride(&mut tx, &next).await?;
    if let Some(driver_id) = freed_driver {
        state.store.set_availability_tx(&mut tx, driver_id, true).await?;
    }
    tx.commit().await?;

    Ok(Json(ActionResponse { success: true, message: "ride cancelled successfully".into(), ride: Some(next) }))
}

/// `PUT /rides/{id}/start`
pub async fn start_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, DispatchError> {
    let mut tx = state.store.begin().await?;
    let ride = state.store.locked_get(&mut tx, id).await?.ok_or_else(|| DispatchError::NotFound("ride not found".into()))?;
    let next = offer::start(&ride)?;
    state.store.update_ride(&mut tx, &next).await?;
    tx.commit().await?;
    Ok(Json(next))
}

/// `PUT /rides/{id}/complete`
pub async fn complete_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<CompleteQuery>,
) -> Result<impl IntoResponse, DispatchError> {
    let mut tx = state.store.begin().await?;
    let ride = state.store.locked_get(&mut tx, id).await?.ok_or_else(|| DispatchError::NotFound("ride not found".into()))?;
    let next = offer::complete(&ride, query.fare, Utc::now())?;
    state.store.update_ride(&mut tx, &next).await?;
    if let Some(driver_id) = next.driver_id {
        state.store.set_availability_tx(&mut tx, driver_id, true).await?;
    }
    tx.commit().await?;
    Ok(Json(next))
}

async fn ride_detail(state: &AppState, ride: Ride) -> Result<RideDetail, DispatchError> {
    let rider = state
        .store
        .get_user(ride.rider_id)
        .await?
        .ok_or_else(|| DispatchError::StoreFailure("ride references a missing rider".into()))?;
    let driver = match ride.driver_id {
        Some(driver_id) => state.store.get_user(driver_id).await?.as_ref().map(DriverSummary::from),
        None => None,
    };
    Ok(RideDetail { rider: RiderSummary::from(&rider), driver, ride })
}
