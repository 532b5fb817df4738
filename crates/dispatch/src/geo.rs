// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure haversine distance and nearest-eligible-driver selection.
//!
//! The store does the SQL-side filtering (`is_driver`, `availability`,
//! non-null location, excluded ids, busy-with-live-offer); this module only
//! computes distance and breaks ties, so it is unit-testable without a
//! database.

use crate::model::User;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two WGS-84 points, in kilometres.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
    let dlat = lat2 - lat1;
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Return the nearest candidate within `radius_km` of `(pickup_lat, pickup_lng)`,
/// breaking ties by lowest driver id. `candidates` is assumed to already be
/// filtered down to eligible drivers (availability, location, exclusions).
pub fn nearest_within_radius(
    pickup_lat: f64,
    pickup_lng: f64,
    candidates: &[User],
    radius_km: f64,
) -> Option<&User> {
    candidates
        .iter()
        .filter_map(|u| {
            let (lat, lng) = (u.latitude?, u.longitude?);
            let distance = haversine_km(pickup_lat, pickup_lng, lat, lng);
            (distance <= radius_km).then_some((distance, u))
        })
        .min_by(|(d1, u1), (d2, u2)| {
            d1.partial_cmp(d2).unwrap_or(std::cmp::Ordering::Equal).then(u1.id.cmp(&u2.id))
        })
        .map(|(_, u)| u)
}
