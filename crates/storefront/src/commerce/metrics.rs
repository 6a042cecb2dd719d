//! Per-call latency and cache metrics for Shop API requests.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Measurements for a single gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryMetrics {
    /// Wall time from the start of the call until it was recorded.
    pub query_time: Duration,
    /// Whether the response came from the response cache.
    pub cache_hit: bool,
    /// Size of the response payload in bytes (0 when unknown).
    pub query_size: usize,
}

/// Records call metrics and flags slow calls.
///
/// Recording never fails and never blocks; it only emits `tracing` events.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceTracker {
    slow_threshold: Duration,
    verbose: bool,
}

impl PerformanceTracker {
    /// Create a tracker. Slow-call warnings are only emitted when `verbose`.
    #[must_use]
    pub const fn new(slow_threshold: Duration, verbose: bool) -> Self {
        Self {
            slow_threshold,
            verbose,
        }
    }

    /// Threshold above which a call is considered slow.
    #[must_use]
    pub const fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }

    /// Record a finished call that started at `start`.
    pub fn record(
        &self,
        name: &str,
        start: Instant,
        cache_hit: bool,
        payload_size: usize,
    ) -> QueryMetrics {
        let metrics = QueryMetrics {
            query_time: start.elapsed(),
            cache_hit,
            query_size: payload_size,
        };

        let elapsed_ms = u64::try_from(metrics.query_time.as_millis()).unwrap_or(u64::MAX);

        if self.verbose && self.is_slow(&metrics) {
            warn!(
                operation = %name,
                elapsed_ms,
                cache_hit,
                payload_size,
                threshold_ms = u64::try_from(self.slow_threshold.as_millis()).unwrap_or(u64::MAX),
                "Slow Shop API call"
            );
        }

        debug!(
            operation = %name,
            elapsed_ms,
            cache_hit,
            payload_size,
            "Shop API call finished"
        );

        metrics
    }

    /// Whether the recorded call exceeded the slow threshold.
    #[must_use]
    pub fn is_slow(&self, metrics: &QueryMetrics) -> bool {
        metrics.query_time > self.slow_threshold
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_carries_inputs() {
        let tracker = PerformanceTracker::default();
        let start = Instant::now();

        let metrics = tracker.record("GetProduct", start, true, 512);
        assert!(metrics.cache_hit);
        assert_eq!(metrics.query_size, 512);
        assert!(metrics.query_time <= start.elapsed());
    }

    #[test]
    fn test_slow_call_detection() {
        let tracker = PerformanceTracker::new(Duration::from_millis(5), true);
        let start = Instant::now();
        std::thread::sleep(Duration::from_millis(10));

        let metrics = tracker.record("Search", start, false, 0);
        assert!(metrics.query_time >= Duration::from_millis(10));
        assert!(tracker.is_slow(&metrics));
    }

    #[test]
    fn test_fast_call_is_not_slow() {
        let tracker = PerformanceTracker::new(Duration::from_secs(60), true);
        let metrics = tracker.record("ActiveOrder", Instant::now(), false, 64);
        assert!(!tracker.is_slow(&metrics));
    }
}
