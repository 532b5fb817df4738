// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ride-table access: FIFO row-locking, the geo-selector candidate snapshot,
//! and the plain (lock-free) reads used by the HTTP API.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};

use crate::error::DispatchError;
use crate::model::{Ride, User};

use super::RideStore;

pub struct NewRide {
    pub rider_id: i64,
    pub start_location: String,
    pub end_location: String,
    pub start_lat: Option<f64>,
    pub start_lng: Option<f64>,
    pub end_lat: Option<f64>,
    pub end_lng: Option<f64>,
}

#[derive(Debug, Default)]
pub struct RideFilter {
    pub status: Option<String>,
    pub rider_id: Option<i64>,
    pub driver_id: Option<i64>,
}

impl RideStore {
    /// Oldest `requested` ride with no outstanding offer, row-locked until
    /// the transaction ends. Ties broken by lowest id — see [`crate::geo`].
    pub async fn find_oldest_unoffered_requested(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Option<Ride>, DispatchError> {
        let ride = sqlx::query_as::<_, Ride>(
            "SELECT * FROM rides
             WHERE status = 'requested'
             ORDER BY created_at ASC, id ASC
             FOR UPDATE SKIP LOCKED
             LIMIT 1",
        )
        .fetch_optional(&mut **tx)
        .await?;
        Ok(ride)
    }

    /// Fetch and row-lock a single ride by id.
    pub async fn locked_get(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ride_id: i64,
    ) -> Result<Option<Ride>, DispatchError> {
        let ride = sqlx::query_as::<_, Ride>("SELECT * FROM rides WHERE id = $1 FOR UPDATE")
            .bind(ride_id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(ride)
    }

    /// Every ride with a live, expired offer, row-locked for the expiry
    /// worker's batch.
    pub async fn expiring_offers(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ride>, DispatchError> {
        let rides = sqlx::query_as::<_, Ride>(
            "SELECT * FROM rides
             WHERE status = 'offering' AND expires_at <= $1
             FOR UPDATE SKIP LOCKED",
        )
        .bind(now)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rides)
    }

    /// Every `requested` ride older than `threshold_at`, row-locked for the
    /// cleanup worker's batch.
    pub async fn stale_requested(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        threshold_at: DateTime<Utc>,
    ) -> Result<Vec<Ride>, DispatchError> {
        let rides = sqlx::query_as::<_, Ride>(
            "SELECT * FROM rides
             WHERE status = 'requested' AND created_at < $1
             FOR UPDATE SKIP LOCKED",
        )
        .bind(threshold_at)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rides)
    }

    /// Whether `rider_id` already has a ride in a non-terminal status.
    pub async fn rider_has_active_ride(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rider_id: i64,
    ) -> Result<bool, DispatchError> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM rides
                WHERE rider_id = $1
                  AND status NOT IN ('completed', 'cancelled')
            )",
        )
        .bind(rider_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row.0)
    }

    /// Candidate drivers for the geo selector: eligible, excluding declined
    /// ids and anyone currently holding a live offer.
    pub async fn geo_candidates(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        excluded: &[i64],
        now: DateTime<Utc>,
    ) -> Result<Vec<User>, DispatchError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u
             WHERE u.is_driver = TRUE
               AND u.availability = TRUE
               AND u.latitude IS NOT NULL
               AND u.longitude IS NOT NULL
               AND NOT (u.id = ANY($1))
               AND NOT EXISTS (
                   SELECT 1 FROM rides r
                   WHERE r.offered_to_driver_id = u.id
                     AND r.status = 'offering'
                     AND r.expires_at > $2
               )",
        )
        .bind(excluded)
        .bind(now)
        .fetch_all(&mut **tx)
        .await?;
        Ok(users)
    }

    /// Count of eligible drivers, ignoring radius — used by the exhaustion
    /// check in the expiry and decline paths.
    pub async fn count_eligible_drivers(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        excluded: &[i64],
        now: DateTime<Utc>,
    ) -> Result<i64, DispatchError> {
        Ok(self.geo_candidates(tx, excluded, now).await?.len() as i64)
    }

    /// Insert a new ride in `requested` status with zero offer attempts.
    pub async fn insert_ride(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        new: NewRide,
    ) -> Result<Ride, DispatchError> {
        let ride = sqlx::query_as::<_, Ride>(
            "INSERT INTO rides
                (rider_id, start_location, end_location, start_lat, start_lng, end_lat, end_lng, status, offer_attempts)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'requested', 0)
             RETURNING *",
        )
        .bind(new.rider_id)
        .bind(new.start_location)
        .bind(new.end_location)
        .bind(new.start_lat)
        .bind(new.start_lng)
        .bind(new.end_lat)
        .bind(new.end_lng)
        .fetch_one(&mut **tx)
        .await?;
        Ok(ride)
    }

    /// Persist the full mutable surface of a ride after a state-machine
    /// transition. The caller computes the next value in Rust; this writes
    /// it back in one statement.
    pub async fn update_ride(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ride: &Ride,
    ) -> Result<(), DispatchError> {
        sqlx::query(
            "UPDATE rides SET
                status = $2,
                driver_id = $3,
                completed_at = $4,
                cancelled_at = $5,
                offered_to_driver_id = $6,
                offered_at = $7,
                expires_at = $8,
                offer_attempts = $9,
                declined_driver_ids = $10,
                fare = $11
             WHERE id = $1",
        )
        .bind(ride.id)
        .bind(&ride.status)
        .bind(ride.driver_id)
        .bind(ride.completed_at)
        .bind(ride.cancelled_at)
        .bind(ride.offered_to_driver_id)
        .bind(ride.offered_at)
        .bind(ride.expires_at)
        .bind(ride.offer_attempts)
        .bind(&ride.declined_driver_ids)
        .bind(ride.fare)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Lock-free single-ride lookup for the HTTP API.
    pub async fn get_ride(&self, ride_id: i64) -> Result<Option<Ride>, DispatchError> {
        let ride = sqlx::query_as::<_, Ride>("SELECT * FROM rides WHERE id = $1")
            .bind(ride_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(ride)
    }

    /// Lock-free filtered listing for `GET /rides`.
    pub async fn list_rides(&self, filter: RideFilter) -> Result<Vec<Ride>, DispatchError> {
        let rides = sqlx::query_as::<_, Ride>(
            "SELECT * FROM rides
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::BIGINT IS NULL OR rider_id = $2)
               AND ($3::BIGINT IS NULL OR driver_id = $3)
             ORDER BY created_at DESC",
        )
        .bind(filter.status)
        .bind(filter.rider_id)
        .bind(filter.driver_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rides)
    }
}