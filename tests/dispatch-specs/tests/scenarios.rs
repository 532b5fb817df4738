// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The six literal end-to-end scenarios.
//!
//! Each test pauses the `tokio` clock, runs the real background workers
//! against a disposable Postgres database, and advances virtual time to
//! drive the dispatch/expiry/cleanup cycle deterministically.

use sqlx::PgPool;

use dispatch_specs::{
    advance_seconds, driver_availability, request_ride, ride_offered_to, ride_status, scenario_config, seed_user,
    start_dispatch_core,
};
use ride_dispatch::offer;

#[sqlx::test(migrations = "../../crates/dispatch/migrations")]
async fn happy_path_offer_then_accept(pool: PgPool) {
    tokio::time::pause();

    let driver = seed_user(&pool, "d1", true, Some(37.78), Some(-122.41)).await;
    let rider = seed_user(&pool, "r1", false, None, None).await;
    let ride_id = request_ride(&pool, rider, 37.78, -122.41).await;

    let (state, shutdown) = start_dispatch_core(pool.clone(), scenario_config());

    advance_seconds(1).await;
    assert_eq!(ride_offered_to(&pool, ride_id).await, Some(driver));
    assert_eq!(ride_status(&pool, ride_id).await, "offering");

    let mut tx = state.store.begin().await.expect("begin");
    let ride = state.store.locked_get(&mut tx, ride_id).await.expect("locked get").expect("ride exists");
    let accepted = offer::accept(&ride, driver, chrono::Utc::now()).expect("accept");
    state.store.update_ride(&mut tx, &accepted).await.expect("update");
    tx.commit().await.expect("commit");

    assert_eq!(ride_status(&pool, ride_id).await, "accepted");

    shutdown.cancel();
}

#[sqlx::test(migrations = "../../crates/dispatch/migrations")]
async fn decline_cascade_skips_declined_driver(pool: PgPool) {
    tokio::time::pause();

    let d1 = seed_user(&pool, "d1", true, Some(37.78), Some(-122.41)).await;
    let d2 = seed_user(&pool, "d2", true, Some(37.781), Some(-122.411)).await;
    let rider = seed_user(&pool, "r1", false, None, None).await;
    let ride_id = request_ride(&pool, rider, 37.78, -122.41).await;

    let (state, shutdown) = start_dispatch_core(pool.clone(), scenario_config());

    advance_seconds(1).await;
    let first_offer = ride_offered_to(&pool, ride_id).await.expect("offered to a driver");
    assert!(first_offer == d1 || first_offer == d2);

    let mut tx = state.store.begin().await.expect("begin");
    let ride = state.store.locked_get(&mut tx, ride_id).await.expect("locked get").expect("ride exists");
    let declined = offer::decline(&ride, first_offer).expect("decline");
    state.store.update_ride(&mut tx, &declined).await.expect("update");
    tx.commit().await.expect("commit");

    advance_seconds(1).await;
    let second_offer = ride_offered_to(&pool, ride_id).await.expect("offered again");
    assert_ne!(second_offer, first_offer, "declined driver must not be re-offered");

    shutdown.cancel();
}

#[sqlx::test(migrations = "../../crates/dispatch/migrations")]
async fn ignored_offer_times_out_and_cancels_when_exhausted(pool: PgPool) {
    tokio::time::pause();

    let driver = seed_user(&pool, "d1", true, Some(37.78), Some(-122.41)).await;
    let rider = seed_user(&pool, "r1", false, None, None).await;
    let ride_id = request_ride(&pool, rider, 37.78, -122.41).await;

    let (_state, shutdown) = start_dispatch_core(pool.clone(), scenario_config());

    advance_seconds(1).await;
    assert_eq!(ride_offered_to(&pool, ride_id).await, Some(driver));

    // Offer timeout is 1s; let two more ticks pass so the expiry worker
    // converts the stale offer.
    advance_seconds(2).await;

    assert_eq!(ride_status(&pool, ride_id).await, "cancelled");

    shutdown.cancel();
}

#[sqlx::test(migrations = "../../crates/dispatch/migrations")]
async fn concurrent_rides_are_offered_fifo(pool: PgPool) {
    tokio::time::pause();

    let driver = seed_user(&pool, "d1", true, Some(37.78), Some(-122.41)).await;
    let rider1 = seed_user(&pool, "r1", false, None, None).await;
    let rider2 = seed_user(&pool, "r2", false, None, None).await;

    let first_ride = request_ride(&pool, rider1, 37.78, -122.41).await;
    tokio::time::advance(std::time::Duration::from_millis(500)).await;
    let second_ride = request_ride(&pool, rider2, 37.78, -122.41).await;

    let (_state, shutdown) = start_dispatch_core(pool.clone(), scenario_config());

    advance_seconds(1).await;
    assert_eq!(ride_offered_to(&pool, first_ride).await, Some(driver), "the older ride must be offered first");
    assert_eq!(ride_offered_to(&pool, second_ride).await, None, "only one driver exists, the newer ride waits");

    shutdown.cancel();
}

#[sqlx::test(migrations = "../../crates/dispatch/migrations")]
async fn rider_cancel_during_offering_frees_the_offer(pool: PgPool) {
    tokio::time::pause();

    let driver = seed_user(&pool, "d1", true, Some(37.78), Some(-122.41)).await;
    let rider = seed_user(&pool, "r1", false, None, None).await;
    let ride_id = request_ride(&pool, rider, 37.78, -122.41).await;

    let (state, shutdown) = start_dispatch_core(pool.clone(), scenario_config());

    advance_seconds(1).await;
    assert_eq!(ride_offered_to(&pool, ride_id).await, Some(driver));

    let mut tx = state.store.begin().await.expect("begin");
    let ride = state.store.locked_get(&mut tx, ride_id).await.expect("locked get").expect("ride exists");
    let (cancelled, freed) = offer::cancel_by_rider(&ride, chrono::Utc::now()).expect("cancel");
    state.store.update_ride(&mut tx, &cancelled).await.expect("update");
    tx.commit().await.expect("commit");
    assert_eq!(freed, None, "no driver was confirmed yet, only offered");

    assert_eq!(ride_status(&pool, ride_id).await, "cancelled");
    assert!(driver_availability(&pool, driver).await, "driver was never confirmed, so stays available");

    // A late accept by the driver now fails: the ride already left `offering`.
    let mut tx = state.store.begin().await.expect("begin");
    let ride = state.store.locked_get(&mut tx, ride_id).await.expect("locked get").expect("ride exists");
    let err = offer::accept(&ride, driver, chrono::Utc::now()).unwrap_err();
    assert_eq!(err.as_str(), "state_conflict");
    tx.commit().await.expect("commit");

    shutdown.cancel();
}

#[sqlx::test(migrations = "../../crates/dispatch/migrations")]
async fn duplicate_request_is_rejected_while_a_ride_is_active(pool: PgPool) {
    tokio::time::pause();

    let rider = seed_user(&pool, "r1", false, None, None).await;
    let _first = request_ride(&pool, rider, 37.78, -122.41).await;

    let (state, shutdown) = start_dispatch_core(pool.clone(), scenario_config());

    let mut tx = state.store.begin().await.expect("begin");
    let has_active = state.store.rider_has_active_ride(&mut tx, rider).await.expect("check active");
    tx.commit().await.expect("commit");
    assert!(has_active, "rider already has a non-terminal ride");

    let count_before: (i64,) = sqlx::query_as("SELECT count(*) FROM rides").fetch_one(&pool).await.expect("count");
    assert_eq!(count_before.0, 1, "request intake rejects the duplicate before inserting a second ride");

    shutdown.cancel();
}
