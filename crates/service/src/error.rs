//! Error types for the rallydash daemon

use std::net::SocketAddr;

use rallydash_telemetry_hub::HubError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("UDP socket error on {addr}: {source}")]
    Socket {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Http(#[source] std::io::Error),

    #[error("Status hub error: {0}")]
    Hub(#[from] HubError),
}

impl ServiceError {
    /// Whether the UDP supervisor should start a new listener after this error.
    pub fn is_restartable(&self) -> bool {
        matches!(self, Self::Socket { .. })
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
