//! Daemon configuration from command-line flags and environment variables.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use clap::Parser;
use rallydash_telemetry_core::{HandbrakeSource, LivenessPolicy};

use crate::error::{ServiceError, ServiceResult};
use crate::udp::ListenerSettings;

pub const DEFAULT_LISTEN_UDP: &str = "127.0.0.1:20777";
pub const DEFAULT_LISTEN_HTTP: &str = "127.0.0.1:8123";

/// Raw daemon settings. Every flag can also be set through the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "rallydashd")]
#[command(about = "Rally telemetry dashboard daemon")]
#[command(version)]
pub struct ServiceConfig {
    /// UDP address the simulator sends telemetry to
    #[arg(long, env = "LISTEN_UDP", default_value = DEFAULT_LISTEN_UDP)]
    pub listen_udp: String,

    /// HTTP address serving the dashboard event stream
    #[arg(long, env = "LISTEN_HTTP", default_value = DEFAULT_LISTEN_HTTP)]
    pub listen_http: String,

    /// Silence after which the session is reported inactive
    #[arg(long, env = "LIVENESS_WINDOW_MS", default_value_t = 5_000)]
    pub liveness_window_ms: u64,

    /// Datagrams closer together than this are dropped (0 disables)
    #[arg(long, env = "MIN_PACKET_INTERVAL_MS", default_value_t = 15)]
    pub min_packet_interval_ms: u64,

    /// What counts as activity: field-diff or motion
    #[arg(long, env = "LIVENESS_POLICY", default_value_t = LivenessPolicy::default())]
    pub liveness_policy: LivenessPolicy,

    /// Handbrake value source: packet or axis
    #[arg(long, env = "HANDBRAKE_SOURCE", default_value_t = HandbrakeSource::default())]
    pub handbrake_source: HandbrakeSource,

    /// Delay before restarting a failed UDP listener
    #[arg(long, env = "RESTART_BACKOFF_MS", default_value_t = 5_000)]
    pub restart_backoff_ms: u64,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Settings after address resolution and range checks.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub udp_addr: SocketAddr,
    pub http_addr: SocketAddr,
    pub handbrake_source: HandbrakeSource,
    pub listener: ListenerSettings,
    pub restart_backoff: Duration,
}

impl ServiceConfig {
    /// Resolve addresses and reject settings the daemon cannot run with.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Configuration`] naming the offending setting.
    pub fn validate(&self) -> ServiceResult<RuntimeConfig> {
        if self.liveness_window_ms == 0 {
            return Err(ServiceError::Configuration(
                "liveness window must be greater than zero".to_string(),
            ));
        }
        if self.restart_backoff_ms == 0 {
            return Err(ServiceError::Configuration(
                "restart backoff must be greater than zero".to_string(),
            ));
        }

        Ok(RuntimeConfig {
            udp_addr: resolve("LISTEN_UDP", &self.listen_udp)?,
            http_addr: resolve("LISTEN_HTTP", &self.listen_http)?,
            handbrake_source: self.handbrake_source,
            listener: ListenerSettings {
                liveness_policy: self.liveness_policy,
                liveness_window: Duration::from_millis(self.liveness_window_ms),
                min_packet_interval: Duration::from_millis(self.min_packet_interval_ms),
            },
            restart_backoff: Duration::from_millis(self.restart_backoff_ms),
        })
    }

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "rallydash=info",
            1 => "rallydash=debug",
            _ => "rallydash=trace",
        }
    }
}

fn resolve(setting: &str, value: &str) -> ServiceResult<SocketAddr> {
    value
        .to_socket_addrs()
        .map_err(|e| ServiceError::Configuration(format!("{setting} {value:?}: {e}")))?
        .next()
        .ok_or_else(|| {
            ServiceError::Configuration(format!("{setting} {value:?} resolved to no address"))
        })
}
