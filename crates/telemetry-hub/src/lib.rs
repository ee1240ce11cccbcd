//! Publish/subscribe fan-out for live dashboard viewers.
//!
//! A single hub task owns the subscriber table. Every operation, including
//! subscribing, travels through one FIFO command queue, so a subscription that
//! completed before a publish was issued always sees that publish, and nothing
//! else ever touches the table.
//!
//! ```no_run
//! use rallydash_telemetry_hub::BroadcastHub;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), rallydash_telemetry_hub::HubError> {
//! let (hub, _task) = BroadcastHub::<u32>::spawn(CancellationToken::new());
//! let mut viewer = hub.subscribe().await?;
//! hub.publish(7).await?;
//! assert_eq!(viewer.recv().await, Some(7));
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod hub;
pub mod subscription;

pub use hub::{BroadcastHub, DEFAULT_SUBSCRIBER_CAPACITY, HubHandle};
pub use subscription::{SubscriberId, Subscription};

use thiserror::Error;

/// Errors returned by [`HubHandle`] operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubError {
    /// The hub task has stopped (cancelled or every handle dropped).
    #[error("broadcast hub is not running")]
    Closed,
}

pub type HubResult<T> = Result<T, HubError>;
