// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-ride offer state machine.
//!
//! Each function here is a pure transform: given the current `Ride` value
//! (already row-locked by the caller) it returns the next value, or a
//! [`DispatchError`] if the transition's precondition fails. Callers are
//! responsible for persisting the result via `RideStore::update_ride`
//! inside the same transaction, for flipping driver availability alongside
//! it, and for emitting notifications only *after* the transaction commits.

use chrono::{DateTime, Utc};

use crate::error::DispatchError;
use crate::model::{Ride, RideStatus};

/// Append `driver_id` to `declined_driver_ids`, deduplicated, preserving order.
fn append_declined(declined: &[i64], driver_id: i64) -> Vec<i64> {
    let mut next = declined.to_vec();
    if !next.contains(&driver_id) {
        next.push(driver_id);
    }
    next
}

/// `requested` -> `offering`. Increments `offer_attempts` and sets the
/// offer fields; the radius for the *next* attempt is derived by the
/// caller from the returned `offer_attempts`.
pub fn begin_offer(ride: &Ride, driver_id: i64, now: DateTime<Utc>, timeout: chrono::Duration) -> Ride {
    let mut next = ride.clone();
    next.status = RideStatus::Offering.as_str().to_owned();
    next.offered_to_driver_id = Some(driver_id);
    next.offered_at = Some(now);
    next.expires_at = Some(now + timeout);
    next.offer_attempts += 1;
    next
}

/// `offering` -> `accepted`, invoked by the Driver Action Handler.
pub fn accept(ride: &Ride, driver_id: i64, now: DateTime<Utc>) -> Result<Ride, DispatchError> {
    if ride.status() != RideStatus::Offering {
        return Err(DispatchError::StateConflict("ride is not offering".into()));
    }
    if ride.offered_to_driver_id != Some(driver_id) {
        return Err(DispatchError::StateConflict("ride was not offered to this driver".into()));
    }
    let Some(expires_at) = ride.expires_at else {
        return Err(DispatchError::StateConflict("offer has no expiry".into()));
    };
    if now > expires_at {
        return Err(DispatchError::StateConflict("offer has expired".into()));
    }

    let mut next = ride.clone();
    next.status = RideStatus::Accepted.as_str().to_owned();
    next.driver_id = Some(driver_id);
    next.offered_to_driver_id = None;
    next.offered_at = None;
    next.expires_at = None;
    Ok(next)
}

/// `offering` -> `requested`, invoked by the Driver Action Handler. Unlike
/// [`accept`], the expiry check is waived: a late decline still succeeds.
pub fn decline(ride: &Ride, driver_id: i64) -> Result<Ride, DispatchError> {
    if ride.status() != RideStatus::Offering {
        return Err(DispatchError::StateConflict("ride is not offering".into()));
    }
    if ride.offered_to_driver_id != Some(driver_id) {
        return Err(DispatchError::StateConflict("ride was not offered to this driver".into()));
    }
    Ok(revert_to_requested(ride, driver_id))
}

/// `offering` -> `requested`, invoked by the Expiry Worker on a timed-out
/// offer. Timeout is semantically equivalent to a decline, so this shares
/// the same field transform as [`decline`]. The caller supplies
/// `driver_id` (read from `ride.offered_to_driver_id` before calling),
/// since an expiring ride is only ever selected because that field is set.
pub fn expire(ride: &Ride, driver_id: i64) -> Ride {
    revert_to_requested(ride, driver_id)
}

fn revert_to_requested(ride: &Ride, declined_driver_id: i64) -> Ride {
    let mut next = ride.clone();
    next.status = RideStatus::Requested.as_str().to_owned();
    next.declined_driver_ids = append_declined(&ride.declined_driver_ids, declined_driver_id);
    next.offered_to_driver_id = None;
    next.offered_at = None;
    next.expires_at = None;
    next
}

/// `requested` -> `cancelled`, triggered by exhaustion (zero eligible
/// drivers remain) from either the Expiry Worker or the Driver Action
/// Handler's decline path.
pub fn cancel_exhausted(ride: &Ride, now: DateTime<Utc>) -> Ride {
    let mut next = ride.clone();
    next.status = RideStatus::Cancelled.as_str().to_owned();
    next.cancelled_at = Some(now);
    next
}

/// `requested` -> `cancelled`, triggered by the Cleanup Worker's stale
/// threshold.
pub fn cancel_stale(ride: &Ride, now: DateTime<Utc>) -> Ride {
    cancel_exhausted(ride, now)
}

/// Rider-initiated cancellation, permitted in `requested`, `offering`,
/// `accepted`; rejected otherwise. Returns the driver id to re-free, if any.
pub fn cancel_by_rider(ride: &Ride, now: DateTime<Utc>) -> Result<(Ride, Option<i64>), DispatchError> {
    match ride.status() {
        RideStatus::Requested | RideStatus::Offering | RideStatus::Accepted => {}
        _ => return Err(DispatchError::StateConflict("ride cannot be cancelled in its current state".into())),
    }

    let freed_driver = match ride.status() {
        RideStatus::Accepted => ride.driver_id,
        _ => None,
    };

    let mut next = ride.clone();
    next.status = RideStatus::Cancelled.as_str().to_owned();
    next.cancelled_at = Some(now);
    next.offered_to_driver_id = None;
    next.offered_at = None;
    next.expires_at = None;
    Ok((next, freed_driver))
}

/// `accepted` -> `in_progress`.
pub fn start(ride: &Ride) -> Result<Ride, DispatchError> {
    if ride.status() != RideStatus::Accepted {
        return Err(DispatchError::StateConflict("ride is not accepted".into()));
    }
    let mut next = ride.clone();
    next.status = RideStatus::InProgress.as_str().to_owned();
    Ok(next)
}

/// `accepted | in_progress` -> `completed`.
pub fn complete(ride: &Ride, fare: Option<f64>, now: DateTime<Utc>) -> Result<Ride, DispatchError> {
    match ride.status() {
        RideStatus::Accepted | RideStatus::InProgress => {}
        _ => return Err(DispatchError::StateConflict("ride is not accepted or in progress".into())),
    }
    let mut next = ride.clone();
    next.status = RideStatus::Completed.as_str().to_owned();
    next.completed_at = Some(now);
    next.fare = fare;
    Ok(next)
}
