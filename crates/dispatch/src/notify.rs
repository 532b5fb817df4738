// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide map from user id to an active bidirectional session.
//!
//! Generalizes the pack's per-session WS bridge pattern from terminal
//! multiplexing to per-user notification fan-out: one `mpsc` channel per
//! attached user, fire-and-forget delivery, silent drop when no session is
//! attached.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::warn;

use crate::model::NotificationEnvelope;

#[derive(Default)]
pub struct NotificationBus {
    sessions: RwLock<HashMap<i64, mpsc::UnboundedSender<NotificationEnvelope>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a session for `user_id`, replacing any existing one.
    pub async fn attach(&self, user_id: i64) -> mpsc::UnboundedReceiver<NotificationEnvelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.write().await.insert(user_id, tx);
        rx
    }

    /// Detach the session for `user_id`. Idempotent.
    pub async fn detach(&self, user_id: i64) {
        self.sessions.write().await.remove(&user_id);
    }

    /// Best-effort delivery: never blocks, never retries. On failure, detach
    /// the stale session and log; callers never see a delivery error.
    pub async fn deliver(&self, user_id: i64, message: NotificationEnvelope) {
        let sender = self.sessions.read().await.get(&user_id).cloned();
        let Some(sender) = sender else {
            return;
        };
        if sender.send(message).is_err() {
            warn!(user_id, "notification session closed, detaching");
            self.detach(user_id).await;
        }
    }

    pub async fn is_attached(&self, user_id: i64) -> bool {
        self.sessions.read().await.contains_key(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deliver_without_session_is_silent() {
        let bus = NotificationBus::new();
        bus.deliver(42, NotificationEnvelope::OfferExpired { ride_id: 1 }).await;
    }

    #[tokio::test]
    async fn attach_then_deliver_reaches_receiver() {
        let bus = NotificationBus::new();
        let mut rx = bus.attach(1).await;
        bus.deliver(1, NotificationEnvelope::OfferExpired { ride_id: 9 }).await;
        let msg = rx.recv().await.expect("message");
        match msg {
            NotificationEnvelope::OfferExpired { ride_id } => assert_eq!(ride_id, 9),
            other => panic!("unexpected envelope: {other:?}"),
        }
    }

    #[tokio::test]
    async fn detach_is_idempotent() {
        let bus = NotificationBus::new();
        bus.detach(1).await;
        bus.detach(1).await;
        assert!(!bus.is_attached(1).await);
    }

    #[tokio::test]
    async fn attach_replaces_existing_session() {
        let bus = NotificationBus::new();
        let _rx1 = bus.attach(1).await;
        let mut rx2 = bus.attach(1).await;
        bus.deliver(1, NotificationEnvelope::OfferExpired { ride_id: 3 }).await;
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn deliver_to_dropped_receiver_detaches() {
        let bus = NotificationBus::new();
        let rx = bus.attach(5).await;
        drop(rx);
        bus.deliver(5, NotificationEnvelope::OfferExpired { ride_id: 1 }).await;
        assert!(!bus.is_attached(5).await);
    }
}