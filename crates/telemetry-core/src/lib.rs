//! Dashboard state for rally telemetry.
//!
//! This crate owns everything between a decoded packet and a published status:
//!
//! ## Modules
//! - `status` - The [`Status`] value viewers receive
//! - `aggregator` - [`StatusAggregator`], the single writer of the shared status
//! - `handbrake` - Auxiliary handbrake axis mapping
//! - `liveness` - Dead-man detection ([`LivenessMonitor`]) and renewal policies
//! - `rate_limiter` - Minimum-interval packet gate for UDP sources

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod aggregator;
pub mod handbrake;
pub mod liveness;
pub mod rate_limiter;
pub mod status;

pub use aggregator::{HandbrakeSource, StatusAggregator};
pub use handbrake::HandbrakeAxis;
pub use liveness::{
    DEFAULT_LIVENESS_WINDOW, LivenessMonitor, LivenessPolicy, LivenessSample, LivenessTimer,
    LivenessTracker, TimerEvent,
};
pub use rate_limiter::{DEFAULT_MIN_PACKET_INTERVAL, RateLimiter, RateLimiterStats};
pub use status::Status;

use thiserror::Error;

/// A textual setting did not name a known variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {setting} {value:?}, expected one of: {expected}")]
pub struct ParseSettingError {
    pub setting: &'static str,
    pub value: String,
    pub expected: &'static str,
}
