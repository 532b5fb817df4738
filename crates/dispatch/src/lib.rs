// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ride-dispatch: the matching core of a ride-hailing dispatch service.
//!
//! Three background workers ([`workers::spawn_dispatch_worker`],
//! [`workers::spawn_expiry_worker`], [`workers::spawn_cleanup_worker`])
//! cooperate over a Postgres-backed [`store::RideStore`] to run the offer
//! state machine in [`offer`]; an Axum HTTP/WebSocket transport in [`http`]
//! exposes the ride and user surface to riders and drivers.

pub mod config;
pub mod error;
pub mod geo;
pub mod http;
pub mod intake;
pub mod model;
pub mod notify;
pub mod offer;
pub mod state;
pub mod store;
pub mod workers;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::DispatchConfig;
use crate::http::build_router;
use crate::state::AppState;
use crate::store::RideStore;

/// Run the dispatch service until shutdown.
pub async fn run(config: DispatchConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let pool = PgPoolOptions::new().connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let store = RideStore::new(pool);
    let state = Arc::new(AppState::new(store, config, shutdown.clone()));

    workers::spawn_dispatch_worker(Arc::clone(&state));
    workers::spawn_expiry_worker(Arc::clone(&state));
    workers::spawn_cleanup_worker(Arc::clone(&state));

    let router = build_router(Arc::clone(&state));
    let listener = TcpListener::bind(&addr).await?;
    info!("ride-dispatch listening on {addr}");

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal(shutdown)).await?;

    Ok(())
}

/// Resolves on Ctrl-C, cancelling `shutdown` so workers and the HTTP
/// server wind down together.
async fn shutdown_signal(shutdown: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
    shutdown.cancel();
}
