// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration for the dispatch service.
//!
//! Every tunable has a `clap` default and an `env` fallback, following the
//! same shape as the rest of the pack's `Args`-derived config structs.

use std::time::Duration;

#[derive(Debug, Clone, clap::Args)]
pub struct DispatchConfig {
    /// Interface to bind the HTTP/WS listener to.
    #[arg(long, default_value = "127.0.0.1", env = "DISPATCH_HOST")]
    pub host: String,

    /// Port to bind the HTTP/WS listener to.
    #[arg(long, default_value_t = 8080, env = "DISPATCH_PORT")]
    pub port: u16,

    /// Postgres connection string for the ride store.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Seconds a driver has to act on an offer before it expires.
    #[arg(long, default_value_t = 20, env = "DISPATCH_OFFER_TIMEOUT_SECS")]
    pub offer_timeout_secs: u64,

    /// Dispatch worker tick period, in seconds.
    #[arg(long, default_value_t = 1, env = "DISPATCH_INTERVAL_SECS")]
    pub dispatch_interval_secs: u64,

    /// Expiry worker tick period, in seconds.
    #[arg(long, default_value_t = 2, env = "DISPATCH_EXPIRY_INTERVAL_SECS")]
    pub expiry_interval_secs: u64,

    /// Cleanup worker tick period, in seconds.
    #[arg(long, default_value_t = 60, env = "DISPATCH_CLEANUP_INTERVAL_SECS")]
    pub cleanup_interval_secs: u64,

    /// Age, in seconds, after which an unoffered `requested` ride is cancelled as stale.
    #[arg(long, default_value_t = 600, env = "DISPATCH_STALE_THRESHOLD_SECS")]
    pub stale_threshold_secs: u64,

    /// Base search radius, in kilometres, for the first offer attempt.
    #[arg(long, default_value_t = 10.0, env = "DISPATCH_BASE_RADIUS_KM")]
    pub base_radius_km: f64,

    /// Radius growth, in kilometres, per additional offer attempt.
    #[arg(long, default_value_t = 5.0, env = "DISPATCH_RADIUS_INCREMENT_KM")]
    pub radius_increment_km: f64,
}

impl DispatchConfig {
    pub fn offer_timeout(&self) -> Duration {
        Duration::from_secs(self.offer_timeout_secs)
    }

    pub fn offer_timeout_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.offer_timeout_secs as i64)
    }

    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_secs(self.dispatch_interval_secs)
    }

    pub fn expiry_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_interval_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn stale_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stale_threshold_secs as i64)
    }

    /// Effective search radius for the k-th offer attempt. Never shrinks.
    pub fn radius_for_attempt(&self, offer_attempts: i32) -> f64 {
        self.base_radius_km + (offer_attempts as f64) * self.radius_increment_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> DispatchConfig {
        DispatchConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: "postgres://localhost/test".into(),
            offer_timeout_secs: 20,
            dispatch_interval_secs: 1,
            expiry_interval_secs: 2,
            cleanup_interval_secs: 60,
            stale_threshold_secs: 600,
            base_radius_km: 10.0,
            radius_increment_km: 5.0,
        }
    }

    #[test]
    fn radius_grows_with_attempts_only() {
        let cfg = test_config();
        assert_eq!(cfg.radius_for_attempt(0), 10.0);
        assert_eq!(cfg.radius_for_attempt(1), 15.0);
        assert_eq!(cfg.radius_for_attempt(3), 25.0);
    }

    #[test]
    fn durations_convert_from_seconds() {
        let cfg = test_config();
        assert_eq!(cfg.offer_timeout(), Duration::from_secs(20));
        assert_eq!(cfg.dispatch_interval(), Duration::from_secs(1));
        assert_eq!(cfg.stale_threshold(), chrono::Duration::seconds(600));
    }
}