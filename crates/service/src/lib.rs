//! rallydash daemon library.
//!
//! Wires the telemetry crates into a running service:
//! - `udp` - supervised UDP listener feeding the [`StatusAggregator`]
//! - `http` - `/sse` event stream, `/status` snapshot and `/health`
//! - `config` - flags and environment variables
//! - `error` - [`ServiceError`]
//!
//! Every long-running task shares one [`CancellationToken`]; cancelling it stops
//! the listener, closes every viewer stream and shuts the HTTP server down.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod http;
pub mod udp;

use std::sync::Arc;

use rallydash_telemetry_core::{Status, StatusAggregator};
use rallydash_telemetry_hub::{BroadcastHub, HubHandle};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use config::{RuntimeConfig, ServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use udp::{ListenerSettings, TelemetryListener};

/// Shared handles passed to request handlers and the listener.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub aggregator: Arc<StatusAggregator>,
    pub hub: HubHandle<Status>,
}

/// Run the daemon until `cancel` fires.
///
/// The HTTP address is bound before anything else starts so a port clash
/// fails fast. UDP socket failures never end the daemon; the listener is
/// restarted after `restart_backoff`.
///
/// # Errors
///
/// [`ServiceError::Http`] if the HTTP address cannot be bound or the server
/// fails.
pub async fn run(config: RuntimeConfig, cancel: CancellationToken) -> ServiceResult<()> {
    let http_listener = TcpListener::bind(config.http_addr)
        .await
        .map_err(ServiceError::Http)?;

    let (hub, hub_task) = BroadcastHub::<Status>::spawn(cancel.clone());
    let ctx = AppContext {
        aggregator: Arc::new(StatusAggregator::new(config.handbrake_source)),
        hub,
    };

    let listener = TelemetryListener::new(
        config.listener,
        Arc::clone(&ctx.aggregator),
        ctx.hub.clone(),
        cancel.clone(),
    );
    let udp_task = tokio::spawn(udp::supervise(
        listener,
        config.udp_addr,
        config.restart_backoff,
    ));

    info!(
        udp = %config.udp_addr,
        http = %config.http_addr,
        handbrake = %config.handbrake_source,
        "rallydash started"
    );

    let served = http::serve(http_listener, ctx, cancel.clone()).await;

    // The server can only stop early on error; make sure everything else follows.
    cancel.cancel();
    if let Err(error) = udp_task.await {
        warn!(error = %error, "telemetry listener task panicked");
    }
    if let Err(error) = hub_task.await {
        warn!(error = %error, "status hub task panicked");
    }

    served
}
