// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch Worker: FIFO loop that picks the oldest unoffered `requested`
//! ride and offers it to the nearest eligible driver.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::geo;
use crate::model::NotificationEnvelope;
use crate::offer;
use crate::state::AppState;

pub fn spawn_dispatch_worker(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(state.config.dispatch_interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = state.shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            if let Err(err) = run_once(&state).await {
                error!(error = %err, "dispatch worker iteration failed");
            }
        }
    });
}

async fn run_once(state: &AppState) -> Result<(), crate::error::DispatchError> {
    let mut tx = state.store.begin().await?;

    let Some(ride) = state.store.find_oldest_unoffered_requested(&mut tx).await? else {
        tx.commit().await?;
        return Ok(());
    };

    let excluded = ride.declined_driver_ids.clone();
    let radius = state.config.radius_for_attempt(ride.offer_attempts);
    let now = Utc::now();

    let candidates = state.store.geo_candidates(&mut tx, &excluded, now).await?;
    let Some(driver) = geo::nearest_within_radius(
        ride.start_lat.unwrap_or_default(),
        ride.start_lng.unwrap_or_default(),
        &candidates,
        radius,
    ) else {
        // No eligible driver at this radius; commit with no state change and
        // retry next tick. Radius only grows when offer_attempts increments,
        // which only happens on an actual offer.
        tx.commit().await?;
        return Ok(());
    };
    let driver_id = driver.id;

    // Re-verify availability under lock before committing the offer.
    let Some(driver_row) = state.store.locked_user(&mut tx, driver_id).await? else {
        tx.commit().await?;
        return Ok(());
    };
    if !driver_row.availability {
        tx.commit().await?;
        return Ok(());
    }

    let next_ride = offer::begin_offer(&ride, driver_id, now, state.config.offer_timeout_chrono());
    state.store.update_ride(&mut tx, &next_ride).await?;
    tx.commit().await?;

    info!(ride_id = ride.id, driver_id, "ride offered");
    state
        .notifications
        .deliver(driver_id, NotificationEnvelope::RideOfferReceived { ride: (&next_ride).into() })
        .await;

    Ok(())
}