// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background workers: dispatch, expiry, and cleanup. Each is spawned as an
//! independent `tokio` task driven by its own interval and the shared
//! shutdown `CancellationToken`, following the same loop shape as the rest
//! of the pack's periodic pollers.

mod cleanup;
mod dispatch;
mod expiry;

pub use cleanup::spawn_cleanup_worker;
pub use dispatch::spawn_dispatch_worker;
pub use expiry::spawn_expiry_worker;