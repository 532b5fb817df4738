// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end dispatch scenarios.
//!
//! Rather than spawning the compiled binary as a subprocess and driving it
//! over wall-clock sleeps, this harness constructs the real `AppState`
//! in-process with shrunk tunables and the background workers spawned
//! directly against a paused `tokio` clock. Timing here is config-driven
//! rather than fixed, so there is no externally observable binary to spawn
//! — the equivalent fidelity comes from running the actual worker loops and
//! `offer` state machine against a real Postgres instance.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use ride_dispatch::config::DispatchConfig;
use ride_dispatch::state::AppState;
use ride_dispatch::store::RideStore;
use ride_dispatch::workers;

/// Tunables shrunk for fast, deterministic scenario tests: 1s offer
/// timeout, sub-second worker ticks, so a handful of `tokio::time::advance`
/// calls cover a full offer/expiry/cleanup cycle.
pub fn scenario_config() -> DispatchConfig {
    DispatchConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: String::new(),
        offer_timeout_secs: 1,
        dispatch_interval_secs: 1,
        expiry_interval_secs: 1,
        cleanup_interval_secs: 1,
        stale_threshold_secs: 5,
        base_radius_km: 10.0,
        radius_increment_km: 5.0,
    }
}

/// Build an `AppState` and spawn all three background workers against it.
/// Returns the state and the `CancellationToken` used to stop them.
pub fn start_dispatch_core(pool: PgPool, config: DispatchConfig) -> (Arc<AppState>, CancellationToken) {
    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState::new(RideStore::new(pool), config, shutdown.clone()));
    workers::spawn_dispatch_worker(Arc::clone(&state));
    workers::spawn_expiry_worker(Arc::clone(&state));
    workers::spawn_cleanup_worker(Arc::clone(&state));
    (state, shutdown)
}

pub async fn seed_user(pool: &PgPool, username: &str, is_driver: bool, lat: Option<f64>, lng: Option<f64>) -> i64 {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO users (username, email, is_driver, availability, latitude, longitude)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(username)
    .bind(format!("{username}@example.com"))
    .bind(is_driver)
    .bind(is_driver)
    .bind(lat)
    .bind(lng)
    .fetch_one(pool)
    .await
    .expect("seed user");
    row.0
}

pub async fn request_ride(pool: &PgPool, rider_id: i64, lat: f64, lng: f64) -> i64 {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO rides (rider_id, start_location, end_location, start_lat, start_lng, status, offer_attempts)
         VALUES ($1, 'A', 'B', $2, $3, 'requested', 0)
         RETURNING id",
    )
    .bind(rider_id)
    .bind(lat)
    .bind(lng)
    .fetch_one(pool)
    .await
    .expect("insert ride");
    row.0
}

/// Advance the paused clock by `secs` seconds, yielding after each second so
/// spawned worker tasks observe their `interval.tick()` firing.
pub async fn advance_seconds(secs: u64) {
    for _ in 0..secs {
        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
    }
}

pub async fn ride_status(pool: &PgPool, ride_id: i64) -> String {
    let row: (String,) = sqlx::query_as("SELECT status FROM rides WHERE id = $1").bind(ride_id).fetch_one(pool).await.expect("ride row");
    row.0
}

pub async fn ride_offered_to(pool: &PgPool, ride_id: i64) -> Option<i64> {
    let row: (Option<i64>,) =
        sqlx::query_as("SELECT offered_to_driver_id FROM rides WHERE id = $1").bind(ride_id).fetch_one(pool).await.expect("ride row");
    row.0
}

pub async fn driver_availability(pool: &PgPool, driver_id: i64) -> bool {
    let row: (bool,) =
        sqlx::query_as("SELECT availability FROM users WHERE id = $1").bind(driver_id).fetch_one(pool).await.expect("user row");
    row.0
}
