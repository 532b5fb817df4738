// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cleanup Worker: cancels requests that have sat unoffered for too long.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::model::NotificationEnvelope;
use crate::offer;
use crate::state::AppState;

pub fn spawn_cleanup_worker(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(state.config.cleanup_interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = state.shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            if let Err(err) = run_once(&state).await {
                error!(error = %err, "cleanup worker iteration failed");
            }
        }
    });
}

async fn run_once(state: &AppState) -> Result<(), crate::error::DispatchError> {
    let now = Utc::now();
    let threshold_at = now - state.config.stale_threshold();

    let mut tx = state.store.begin().await?;
    let stale = state.store.stale_requested(&mut tx, threshold_at).await?;

    let mut notifications = Vec::new();
    for ride in &stale {
        let cancelled = offer::cancel_stale(ride, now);
        state.store.update_ride(&mut tx, &cancelled).await?;
        notifications.push((
            cancelled.rider_id,
            NotificationEnvelope::RequestTimeout {
                ride_id: cancelled.id,
                message: "your request went unanswered for too long and was cancelled".into(),
            },
        ));
        info!(ride_id = cancelled.id, "stale request cancelled");
    }

    tx.commit().await?;

    for (user_id, envelope) in notifications {
        state.notifications.deliver(user_id, envelope).await;
    }

    Ok(())
}