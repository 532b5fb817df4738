// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-table access: lock-free reads for the HTTP API, row-locked reads
//! and availability flips inside offer-state-machine transactions.

use sqlx::{Postgres, Transaction};

use crate::error::DispatchError;
use crate::model::User;

use super::RideStore;

impl RideStore {
    /// Lock-free single-user lookup.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, DispatchError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    /// Row-locked user read, for use inside a ride transaction (e.g. to
    /// re-verify availability before confirming an offer).
    pub async fn locked_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
    ) -> Result<Option<User>, DispatchError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(user)
    }

    pub async fn set_location(&self, user_id: i64, lat: f64, lng: f64) -> Result<(), DispatchError> {
        sqlx::query("UPDATE users SET latitude = $2, longitude = $3 WHERE id = $1")
            .bind(user_id)
            .bind(lat)
            .bind(lng)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Same as [`Self::set_location`], but inside an existing transaction
    /// (used by Request Intake, which both validates and moves the rider).
    pub async fn set_location_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        lat: f64,
        lng: f64,
    ) -> Result<(), DispatchError> {
        sqlx::query("UPDATE users SET latitude = $2, longitude = $3 WHERE id = $1")
            .bind(user_id)
            .bind(lat)
            .bind(lng)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn set_availability(&self, user_id: i64, available: bool) -> Result<(), DispatchError> {
        sqlx::query("UPDATE users SET availability = $2 WHERE id = $1 AND is_driver = TRUE")
            .bind(user_id)
            .bind(available)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Same as [`Self::set_availability`], but inside an existing
    /// transaction (used by the offer state machine on accept/cancel/complete).
    pub async fn set_availability_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        available: bool,
    ) -> Result<(), DispatchError> {
        sqlx::query("UPDATE users SET availability = $2 WHERE id = $1")
            .bind(user_id)
            .bind(available)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}