// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Postgres-backed ride and user store.
//!
//! All mutation that must be observed atomically by concurrent workers goes
//! through a `sqlx::Transaction` obtained from [`RideStore::begin`]; reads
//! that don't need a lock (listing, single-ride lookup for the HTTP API) go
//! straight against the pool.

mod rides;
mod users;

pub use rides::{NewRide, RideFilter};

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::DispatchError;

#[derive(Clone)]
pub struct RideStore {
    pool: PgPool,
}

impl RideStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Postgres>, DispatchError> {
        Ok(self.pool.begin().await?)
    }
}