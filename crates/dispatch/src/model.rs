// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core domain types: users, rides, and the status enum driving the offer
//! state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Requested,
    Offering,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Offering => "offering",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal states are absorbing: `completed` and `cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_driver: bool,
    pub availability: bool,
    pub vehicle: Option<String>,
    pub rating: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Ride {
    pub id: i64,
    pub rider_id: i64,
    pub driver_id: Option<i64>,
    pub start_location: String,
    pub end_location: String,
    pub start_lat: Option<f64>,
    pub start_lng: Option<f64>,
    pub end_lat: Option<f64>,
    pub end_lng: Option<f64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub offered_to_driver_id: Option<i64>,
    pub offered_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub offer_attempts: i32,
    pub declined_driver_ids: Vec<i64>,
    pub fare: Option<f64>,
}

impl Ride {
    pub fn status(&self) -> RideStatus {
        match self.status.as_str() {
            "requested" => RideStatus::Requested,
            "offering" => RideStatus::Offering,
            "accepted" => RideStatus::Accepted,
            "in_progress" => RideStatus::InProgress,
            "completed" => RideStatus::Completed,
            _ => RideStatus::Cancelled,
        }
    }
}

/// Driver-facing summary embedded in `driver_assigned` notifications and
/// `GET /rides/{id}` responses.
#[derive(Debug, Clone, Serialize)]
pub struct DriverSummary {
    pub id: i64,
    pub name: String,
    pub vehicle: Option<String>,
    pub rating: Option<f64>,
}

impl From<&User> for DriverSummary {
    fn from(u: &User) -> Self {
        Self { id: u.id, name: u.username.clone(), vehicle: u.vehicle.clone(), rating: u.rating }
    }
}

/// Rider-facing summary embedded in `GET /rides/{id}` responses.
#[derive(Debug, Clone, Serialize)]
pub struct RiderSummary {
    pub id: i64,
    pub name: String,
}

impl From<&User> for RiderSummary {
    fn from(u: &User) -> Self {
        Self { id: u.id, name: u.username.clone() }
    }
}

/// A ride with its rider and (if assigned) driver embedded, for
/// `GET /rides/{id}` and the accept response.
#[derive(Debug, Clone, Serialize)]
pub struct RideDetail {
    #[serde(flatten)]
    pub ride: Ride,
    pub rider: RiderSummary,
    pub driver: Option<DriverSummary>,
}

/// Typed push-notification envelopes delivered over the Notification Bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEnvelope {
    RideOfferReceived { ride: RideOfferSummary },
    OfferExpired { ride_id: i64 },
    DriverAssigned {
        ride_id: i64,
        driver_id: i64,
        driver_name: String,
        driver_vehicle: Option<String>,
        driver_rating: Option<f64>,
    },
    RideCancelled { ride_id: i64, reason: String, message: String },
    RequestTimeout { ride_id: i64, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RideOfferSummary {
    pub id: i64,
    pub rider_id: i64,
    pub start_location: String,
    pub start_lat: Option<f64>,
    pub start_lng: Option<f64>,
    pub end_location: String,
    pub end_lat: Option<f64>,
    pub end_lng: Option<f64>,
    pub fare: Option<f64>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Ride> for RideOfferSummary {
    fn from(r: &Ride) -> Self {
        Self {
            id: r.id,
            rider_id: r.rider_id,
            start_location: r.start_location.clone(),
            start_lat: r.start_lat,
            start_lng: r.start_lng,
            end_location: r.end_location.clone(),
            end_lat: r.end_lat,
            end_lng: r.end_lng,
            fare: r.fare,
            expires_at: r.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_absorbing() {
        assert!(RideStatus::Completed.is_terminal());
        assert!(RideStatus::Cancelled.is_terminal());
        assert!(!RideStatus::Requested.is_terminal());
        assert!(!RideStatus::Offering.is_terminal());
        assert!(!RideStatus::Accepted.is_terminal());
        assert!(!RideStatus::InProgress.is_terminal());
    }

    #[test]
    fn envelope_serializes_with_tag() {
        let env = NotificationEnvelope::OfferExpired { ride_id: 7 };
        let json = serde_json::to_value(&env).expect("serialize");
        assert_eq!(json["type"], "offer_expired");
        assert_eq!(json["ride_id"], 7);
    }
}