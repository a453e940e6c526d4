//! Client factory statistics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters kept by a [`ClientFactory`](crate::factory::ClientFactory)
#[derive(Debug)]
pub struct FactoryStats {
    /// Pipelines built, first builds and rebuilds alike
    pub pipelines_built: AtomicU64,
    /// Pipeline builds that returned an error
    pub build_failures: AtomicU64,
    /// Client handles handed out
    pub clients_created: AtomicU64,
    /// Cached pipelines dropped because their lifetime ran out or they were expired by hand
    pub expirations: AtomicU64,
    /// Requests sent through client handles
    pub requests_total: AtomicU64,
    /// Requests that ended in an error rather than a response
    pub requests_failed: AtomicU64,
    pub created_at: Instant,
}

impl Default for FactoryStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FactoryStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipelines_built: AtomicU64::new(0),
            build_failures: AtomicU64::new(0),
            clients_created: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            requests_total: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            created_at: Instant::now(),
        }
    }

    pub fn record_build(&self) {
        self.pipelines_built.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_build_failure(&self) {
        self.build_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_client(&self) {
        self.clients_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Create a snapshot of current statistics
    #[must_use]
    pub fn snapshot(&self) -> FactoryStatsSnapshot {
        FactoryStatsSnapshot {
            pipelines_built: self.pipelines_built.load(Ordering::Relaxed),
            build_failures: self.build_failures.load(Ordering::Relaxed),
            clients_created: self.clients_created.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            age: self.age(),
        }
    }
}

/// Point-in-time copy of [`FactoryStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryStatsSnapshot {
    pub pipelines_built: u64,
    pub build_failures: u64,
    pub clients_created: u64,
    pub expirations: u64,
    pub requests_total: u64,
    pub requests_failed: u64,
    pub age: Duration,
}

impl FactoryStatsSnapshot {
    /// Fraction of requests that failed, 0.0 when none were sent
    #[must_use]
    pub fn failure_ratio(&self) -> f64 {
        if self.requests_total == 0 {
            0.0
        } else {
            // Precision loss acceptable for ratios
            #[allow(clippy::cast_precision_loss)]
            {
                self.requests_failed as f64 / self.requests_total as f64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let stats = FactoryStats::new();
        stats.record_build();
        stats.record_build();
        stats.record_build_failure();
        stats.record_client();
        stats.record_request();
        stats.record_request();
        stats.record_request_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.pipelines_built, 2);
        assert_eq!(snapshot.build_failures, 1);
        assert_eq!(snapshot.clients_created, 1);
        assert_eq!(snapshot.expirations, 0);
        assert!((snapshot.failure_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
