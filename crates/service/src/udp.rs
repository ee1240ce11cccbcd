//! UDP telemetry ingest.
//!
//! One [`TelemetryListener`] owns the receive loop for the configured address:
//! rate limit, decode, update the shared status, renew liveness, publish. The
//! listener state (rate limiter, liveness monitor) survives socket restarts so a
//! session that goes quiet while the socket is being rebound still ends.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rallydash_telemetry_codemasters::decode;
use rallydash_telemetry_core::{
    DEFAULT_LIVENESS_WINDOW, DEFAULT_MIN_PACKET_INTERVAL, LivenessMonitor, LivenessPolicy,
    RateLimiter, RateLimiterStats, Status, StatusAggregator, TimerEvent,
};
use rallydash_telemetry_hub::HubHandle;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::{ServiceError, ServiceResult};

/// Receive buffer size; larger datagrams are truncated and then rejected.
pub const RECV_BUFFER_LEN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerSettings {
    pub liveness_policy: LivenessPolicy,
    pub liveness_window: Duration,
    pub min_packet_interval: Duration,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            liveness_policy: LivenessPolicy::default(),
            liveness_window: DEFAULT_LIVENESS_WINDOW,
            min_packet_interval: DEFAULT_MIN_PACKET_INTERVAL,
        }
    }
}

pub struct TelemetryListener {
    aggregator: Arc<StatusAggregator>,
    hub: HubHandle<Status>,
    limiter: RateLimiter,
    monitor: LivenessMonitor,
    cancel: CancellationToken,
}

impl TelemetryListener {
    pub fn new(
        settings: ListenerSettings,
        aggregator: Arc<StatusAggregator>,
        hub: HubHandle<Status>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            aggregator,
            hub,
            limiter: RateLimiter::with_min_interval(settings.min_packet_interval),
            monitor: LivenessMonitor::new(
                settings.liveness_policy,
                settings.liveness_window,
                cancel.clone(),
            ),
            cancel,
        }
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats::from(&self.limiter)
    }

    /// Bind `addr` and serve until cancelled (`Ok`) or the socket fails.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Socket`] if binding or receiving fails, and
    /// [`ServiceError::Hub`] if the hub stopped underneath the listener.
    pub async fn run(&mut self, addr: SocketAddr) -> ServiceResult<()> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| ServiceError::Socket { addr, source })?;
        self.serve(socket).await
    }

    /// Serve an already bound socket. The socket is dropped on every return path.
    ///
    /// # Errors
    ///
    /// See [`TelemetryListener::run`].
    pub async fn serve(&mut self, socket: UdpSocket) -> ServiceResult<()> {
        let addr = socket
            .local_addr()
            .map_err(|source| ServiceError::Socket {
                addr: SocketAddr::from(([0, 0, 0, 0], 0)),
                source,
            })?;
        info!(addr = %addr, policy = %self.monitor.policy(), "listening for telemetry");

        let mut buf = vec![0u8; RECV_BUFFER_LEN];
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!(addr = %addr, "telemetry listener cancelled");
                    return Ok(());
                }
                event = self.monitor.expired() => {
                    if event == TimerEvent::Cancelled {
                        return Ok(());
                    }
                    self.publish(self.aggregator.deactivate()).await?;
                }
                received = socket.recv_from(&mut buf) => {
                    let (len, peer) = received
                        .map_err(|source| ServiceError::Socket { addr, source })?;
                    let Some(datagram) = buf.get(..len) else {
                        continue;
                    };
                    trace!(peer = %peer, len, "datagram received");
                    if let Some(status) = self.ingest(datagram) {
                        self.publish(status).await?;
                    }
                }
            }
        }
    }

    /// Apply one datagram to the shared status. Returns the status to publish,
    /// or `None` if the datagram was rate limited or could not be decoded.
    pub fn ingest(&mut self, datagram: &[u8]) -> Option<Status> {
        if !self.limiter.should_process() {
            trace!(len = datagram.len(), "datagram rate limited");
            return None;
        }

        let packet = match decode(datagram) {
            Ok(packet) => packet,
            Err(error) => {
                warn!(error = %error, len = datagram.len(), "dropping undecodable datagram");
                return None;
            }
        };

        let status = self.aggregator.update(&packet);
        if self.monitor.observe(&packet) {
            Some(self.aggregator.activate())
        } else {
            Some(status)
        }
    }

    /// Wait out a restart delay while still ending the session on silence.
    /// Returns `false` if cancellation arrived first.
    async fn backoff(&mut self, delay: Duration) -> ServiceResult<bool> {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Ok(false),
                event = self.monitor.expired() => {
                    if event == TimerEvent::Cancelled {
                        return Ok(false);
                    }
                    self.publish(self.aggregator.deactivate()).await?;
                }
                () = &mut sleep => return Ok(true),
            }
        }
    }

    async fn publish(&self, status: Status) -> ServiceResult<()> {
        self.hub.publish(status).await?;
        Ok(())
    }
}

/// Keep a listener on `addr` running until cancellation, rebinding after
/// `restart_backoff` whenever the socket fails.
pub async fn supervise(
    mut listener: TelemetryListener,
    addr: SocketAddr,
    restart_backoff: Duration,
) {
    loop {
        match listener.run(addr).await {
            Ok(()) => break,
            Err(error) if error.is_restartable() => {
                error!(
                    error = %error,
                    backoff = ?restart_backoff,
                    "telemetry listener failed, restarting"
                );
            }
            Err(error) => {
                error!(error = %error, "telemetry listener stopped");
                break;
            }
        }

        match listener.backoff(restart_backoff).await {
            Ok(true) => info!(addr = %addr, "restarting telemetry listener"),
            Ok(false) => break,
            Err(error) => {
                error!(error = %error, "telemetry listener stopped");
                break;
            }
        }
    }

    let stats = listener.stats();
    info!(
        processed = stats.processed_count,
        dropped = stats.dropped_count,
        drop_rate_percent = stats.drop_rate_percent,
        "telemetry listener finished"
    );
}
