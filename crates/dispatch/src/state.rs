// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state, injected into every handler and worker.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::DispatchConfig;
use crate::notify::NotificationBus;
use crate::store::RideStore;

pub struct AppState {
    pub store: RideStore,
    pub notifications: Arc<NotificationBus>,
    pub config: DispatchConfig,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(store: RideStore, config: DispatchConfig, shutdown: CancellationToken) -> Self {
        Self { store, notifications: Arc::new(NotificationBus::new()), config, shutdown }
    }
}