//! Packet rate limiting for UDP telemetry sources.
//!
//! Simulators can emit far faster than a dashboard can render, and a flood of
//! duplicate datagrams would otherwise fan out to every viewer. Packets that
//! arrive sooner than the minimum interval after the last accepted one are
//! dropped before decoding.

use std::time::{Duration, Instant};

/// Minimum spacing between accepted packets from one source.
pub const DEFAULT_MIN_PACKET_INTERVAL: Duration = Duration::from_millis(15);

/// Minimum-interval gate with drop accounting. One limiter per source.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_processed: Option<Instant>,
    dropped_count: u64,
    processed_count: u64,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_min_interval(DEFAULT_MIN_PACKET_INTERVAL)
    }
}

impl RateLimiter {
    /// Create a limiter allowing at most `max_rate_hz` packets per second.
    pub fn new(max_rate_hz: u32) -> Self {
        let divisor = u64::from(max_rate_hz.max(1));
        Self::with_min_interval(Duration::from_nanos(1_000_000_000 / divisor))
    }

    pub fn with_min_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_processed: None,
            dropped_count: 0,
            processed_count: 0,
        }
    }

    /// Returns true if a packet arriving now should be processed.
    pub fn should_process(&mut self) -> bool {
        self.should_process_at(Instant::now())
    }

    /// Returns true if a packet arriving at `now` should be processed.
    pub fn should_process_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_processed {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.min_interval {
                self.dropped_count = self.dropped_count.saturating_add(1);
                return false;
            }
        }

        self.last_processed = Some(now);
        self.processed_count = self.processed_count.saturating_add(1);
        true
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Number of packets dropped for rate limiting.
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// Number of packets let through.
    pub fn processed_count(&self) -> u64 {
        self.processed_count
    }

    /// Current drop rate in percent.
    pub fn drop_rate_percent(&self) -> f32 {
        let total = self.dropped_count.saturating_add(self.processed_count);
        if total == 0 {
            0.0
        } else {
            (self.dropped_count as f32 / total as f32) * 100.0
        }
    }

    /// Reset collected statistics.
    pub fn reset_stats(&mut self) {
        self.dropped_count = 0;
        self.processed_count = 0;
    }
}

/// Rate limiter statistics for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiterStats {
    pub min_interval: Duration,
    pub processed_count: u64,
    pub dropped_count: u64,
    pub drop_rate_percent: f32,
}

impl From<&RateLimiter> for RateLimiterStats {
    fn from(limiter: &RateLimiter) -> Self {
        Self {
            min_interval: limiter.min_interval,
            processed_count: limiter.processed_count,
            dropped_count: limiter.dropped_count,
            drop_rate_percent: limiter.drop_rate_percent(),
        }
    }
}
