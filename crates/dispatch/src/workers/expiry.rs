// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expiry Worker: converts offers past their deadline into auto-declines,
//! cancelling terminally if no eligible driver remains.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::model::NotificationEnvelope;
use crate::offer;
use crate::state::AppState;

pub fn spawn_expiry_worker(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(state.config.expiry_interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = state.shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            if let Err(err) = run_once(&state).await {
                error!(error = %err, "expiry worker iteration failed");
            }
        }
    });
}

async fn run_once(state: &AppState) -> Result<(), crate::error::DispatchError> {
    let now = Utc::now();
    let mut tx = state.store.begin().await?;
    let expired = state.store.expiring_offers(&mut tx, now).await?;

    let mut notifications = Vec::new();

    for ride in &expired {
        let Some(expired_driver) = ride.offered_to_driver_id else { continue };

        let reverted = offer::expire(ride, expired_driver);
        let eligible = state
            .store
            .count_eligible_drivers(&mut tx, &reverted.declined_driver_ids, now)
            .await?;

        let final_ride = if eligible == 0 {
            let cancelled = offer::cancel_exhausted(&reverted, now);
            state.store.update_ride(&mut tx, &cancelled).await?;
            notifications.push((
                cancelled.rider_id,
                NotificationEnvelope::RideCancelled {
                    ride_id: cancelled.id,
                    reason: "no_drivers_available".into(),
                    message: "no eligible drivers remain for this ride".into(),
                },
            ));
            cancelled
        } else {
            state.store.update_ride(&mut tx, &reverted).await?;
            reverted
        };

        notifications.push((expired_driver, NotificationEnvelope::OfferExpired { ride_id: final_ride.id }));
        info!(ride_id = final_ride.id, driver_id = expired_driver, "offer expired");
    }

    tx.commit().await?;

    for (user_id, envelope) in notifications {
        state.notifications.deliver(user_id, envelope).await;
    }

    Ok(())
}