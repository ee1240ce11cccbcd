//! Codemasters rally UDP telemetry decoding.
//!
//! Two fixed binary layouts are supported, both little-endian:
//!
//! | Layout | Games | Packet size |
//! |--------|-------|-------------|
//! | [`DirtSeriesPacket`] | DiRT Rally / DiRT Rally 2.0 / WRC Generations (Mode 1 legacy) | 263 bytes (264 with `extradata=3`) |
//! | [`EaWrcPacket`] | EA SPORTS WRC | 237 bytes |
//!
//! The layout is chosen from the datagram length alone; see [`decode`].
//! Both layouts expose the same [`Telemetry`] capability set so downstream code
//! never needs to know which simulator is sending.
//!
//! ```
//! use rallydash_telemetry_codemasters::{decode, PacketFormat, Telemetry, EA_WRC_PACKET_LEN};
//!
//! let mut raw = vec![0u8; EA_WRC_PACKET_LEN];
//! raw[209..213].copy_from_slice(&0.25f32.to_le_bytes());
//! let packet = decode(&raw)?;
//! assert_eq!(packet.format(), PacketFormat::EaWrc);
//! assert!((packet.steering() - 0.25).abs() < f32::EPSILON);
//! # Ok::<(), rallydash_telemetry_codemasters::DecodeError>(())
//! ```

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod dirt_series;
pub mod ea_wrc;
pub mod packet;
mod reader;
pub mod telemetry;

pub use dirt_series::{DIRT_SERIES_EXTENDED_PACKET_LEN, DIRT_SERIES_PACKET_LEN, DirtSeriesPacket};
pub use ea_wrc::{EA_WRC_PACKET_LEN, EaWrcPacket};
pub use packet::{CodemastersPacket, PacketFormat, decode};
pub use telemetry::Telemetry;

use thiserror::Error;

/// Errors produced while decoding a telemetry datagram.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer too short: got {got} bytes, want at least {want}")]
    ShortBuffer { got: usize, want: usize },

    #[error("unrecognized packet format: {len} bytes matches no known layout")]
    UnrecognizedFormat { len: usize },
}

pub type DecodeResult<T> = Result<T, DecodeError>;
