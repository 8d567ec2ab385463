//! Dispatch metrics for observability
//!
//! Counters for monitoring routing health: records dispatched, per-sink
//! writes and per-sink failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics of one logger's dispatcher
///
/// # Example
///
/// ```
/// use log_router::core::DispatchMetrics;
///
/// let metrics = DispatchMetrics::new();
/// metrics.record_dispatched();
/// metrics.record_sink_write();
/// metrics.record_sink_failure();
///
/// assert_eq!(metrics.dispatched(), 1);
/// assert_eq!(metrics.sink_failures(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Records handed to the dispatcher
    dispatched: AtomicU64,

    /// Records that matched no binding
    unrouted: AtomicU64,

    /// Successful sink writes
    sink_writes: AtomicU64,

    /// Failed or panicked sink writes
    sink_failures: AtomicU64,
}

impl DispatchMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            dispatched: AtomicU64::new(0),
            unrouted: AtomicU64::new(0),
            sink_writes: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn unrouted(&self) -> u64 {
        self.unrouted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_writes(&self) -> u64 {
        self.sink_writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_unrouted(&self) -> u64 {
        self.unrouted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_write(&self) -> u64 {
        self.sink_writes.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a sink failure, returning the previous count
    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of sink writes that failed (0.0 - 100.0)
    pub fn failure_rate(&self) -> f64 {
        let failures = self.sink_failures();
        let total = failures + self.sink_writes();
        if total == 0 {
            0.0
        } else {
            (failures as f64 / total as f64) * 100.0
        }
    }

    pub fn reset(&self) {
        self.dispatched.store(0, Ordering::Relaxed);
        self.unrouted.store(0, Ordering::Relaxed);
        self.sink_writes.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_rate() {
        let metrics = DispatchMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..3 {
            metrics.record_sink_write();
        }
        metrics.record_sink_failure();
        assert!((metrics.failure_rate() - 25.0).abs() < f64::EPSILON);

        metrics.reset();
        assert_eq!(metrics.sink_writes(), 0);
        assert_eq!(metrics.sink_failures(), 0);
    }
}
