// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request Intake: validates a rider's new-ride input before it ever
//! touches the store, then inserts the ride transactionally alongside the
//! rider's location update.

use crate::error::DispatchError;
use crate::model::User;
use crate::store::NewRide;

#[derive(Debug, Clone)]
pub struct RideRequestInput {
    pub user_id: i64,
    pub source_location: String,
    pub dest_location: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dest_lat: Option<f64>,
    pub dest_lng: Option<f64>,
}

/// Checks that don't require a store round-trip: coordinate bounds and
/// non-empty location text. Role and duplicate-request checks need a
/// lock-held read and are performed by the caller against the store.
pub fn validate_coordinates(input: &RideRequestInput) -> Result<(f64, f64), DispatchError> {
    let (Some(lat), Some(lng)) = (input.pickup_lat, input.pickup_lng) else {
        return Err(DispatchError::Validation("pickup coordinates are required".into()));
    };
    if !(-90.0..=90.0).contains(&lat) {
        return Err(DispatchError::Validation(
            "invalid pickup latitude (must be between -90 and 90)".into(),
        ));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(DispatchError::Validation(
            "invalid pickup longitude (must be between -180 and 180)".into(),
        ));
    }
    Ok((lat, lng))
}

/// Role check: the requesting user must exist and must not be a driver.
pub fn validate_rider(user: Option<&User>) -> Result<(), DispatchError> {
    let Some(user) = user else {
        return Err(DispatchError::NotFound("user not found".into()));
    };
    if user.is_driver {
        return Err(DispatchError::Validation("drivers cannot request rides".into()));
    }
    Ok(())
}

pub fn to_new_ride(input: &RideRequestInput, pickup_lat: f64, pickup_lng: f64) -> NewRide {
    NewRide {
        rider_id: input.user_id,
        start_location: input.source_location.clone(),
        end_location: input.dest_location.clone(),
        start_lat: Some(pickup_lat),
        start_lng: Some(pickup_lng),
        end_lat: input.dest_lat,
        end_lng: input.dest_lng,
    }
}
