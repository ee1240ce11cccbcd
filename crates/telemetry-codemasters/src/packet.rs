//! Length-based layout selection and the closed packet variant.

use crate::dirt_series::{DIRT_SERIES_EXTENDED_PACKET_LEN, DIRT_SERIES_PACKET_LEN, DirtSeriesPacket};
use crate::ea_wrc::{EA_WRC_PACKET_LEN, EaWrcPacket};
use crate::telemetry::Telemetry;
use crate::{DecodeError, DecodeResult};

/// Known datagram layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketFormat {
    /// Mode 1 legacy layout (DiRT Rally, DiRT Rally 2.0, WRC Generations).
    DirtSeries,
    /// EA SPORTS WRC layout.
    EaWrc,
}

impl PacketFormat {
    /// Identify a layout from an exact datagram length.
    pub fn detect(len: usize) -> Option<Self> {
        match len {
            EA_WRC_PACKET_LEN => Some(Self::EaWrc),
            DIRT_SERIES_PACKET_LEN | DIRT_SERIES_EXTENDED_PACKET_LEN => Some(Self::DirtSeries),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DirtSeries => "dirt_series",
            Self::EaWrc => "ea_wrc",
        }
    }

    /// Canonical datagram size for this layout.
    pub fn packet_len(self) -> usize {
        match self {
            Self::DirtSeries => DIRT_SERIES_PACKET_LEN,
            Self::EaWrc => EA_WRC_PACKET_LEN,
        }
    }
}

impl std::fmt::Display for PacketFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded datagram of either layout.
#[derive(Debug, Clone, PartialEq)]
pub enum CodemastersPacket {
    DirtSeries(DirtSeriesPacket),
    EaWrc(EaWrcPacket),
}

impl CodemastersPacket {
    pub fn format(&self) -> PacketFormat {
        match self {
            Self::DirtSeries(_) => PacketFormat::DirtSeries,
            Self::EaWrc(_) => PacketFormat::EaWrc,
        }
    }

    fn as_telemetry(&self) -> &dyn Telemetry {
        match self {
            Self::DirtSeries(packet) => packet,
            Self::EaWrc(packet) => packet,
        }
    }
}

/// Decode a datagram, choosing the layout from its length.
///
/// A 237-byte datagram is an EA SPORTS WRC packet and 263 or 264 bytes is the
/// Mode 1 layout. Any other length shorter than the Mode 1 layout is reported as
/// [`DecodeError::ShortBuffer`] against that layout, and anything longer as
/// [`DecodeError::UnrecognizedFormat`].
///
/// # Errors
///
/// See above. On error no packet is produced.
pub fn decode(raw: &[u8]) -> DecodeResult<CodemastersPacket> {
    match PacketFormat::detect(raw.len()) {
        Some(PacketFormat::EaWrc) => EaWrcPacket::decode(raw).map(CodemastersPacket::EaWrc),
        Some(PacketFormat::DirtSeries) => {
            DirtSeriesPacket::decode(raw).map(CodemastersPacket::DirtSeries)
        }
        None if raw.len() < DIRT_SERIES_PACKET_LEN => Err(DecodeError::ShortBuffer {
            got: raw.len(),
            want: DIRT_SERIES_PACKET_LEN,
        }),
        None => Err(DecodeError::UnrecognizedFormat { len: raw.len() }),
    }
}

impl Telemetry for CodemastersPacket {
    fn steering(&self) -> f32 {
        self.as_telemetry().steering()
    }

    fn throttle(&self) -> f32 {
        self.as_telemetry().throttle()
    }

    fn brake(&self) -> f32 {
        self.as_telemetry().brake()
    }

    fn clutch(&self) -> f32 {
        self.as_telemetry().clutch()
    }

    fn handbrake(&self) -> f32 {
        self.as_telemetry().handbrake()
    }

    fn gear(&self) -> i32 {
        self.as_telemetry().gear()
    }

    fn rpm(&self) -> f32 {
        self.as_telemetry().rpm()
    }

    fn max_rpm(&self) -> f32 {
        self.as_telemetry().max_rpm()
    }

    fn speed(&self) -> f32 {
        self.as_telemetry().speed()
    }

    fn stage_distance(&self) -> f32 {
        self.as_telemetry().stage_distance()
    }

    fn lap_time(&self) -> f32 {
        self.as_telemetry().lap_time()
    }

    fn lap_distance(&self) -> f32 {
        self.as_telemetry().lap_distance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn detect_by_exact_length() {
        assert_eq!(PacketFormat::detect(237), Some(PacketFormat::EaWrc));
        assert_eq!(PacketFormat::detect(263), Some(PacketFormat::DirtSeries));
        assert_eq!(PacketFormat::detect(264), Some(PacketFormat::DirtSeries));
        assert_eq!(PacketFormat::detect(236), None);
        assert_eq!(PacketFormat::detect(4096), None);
    }

    #[test]
    fn undersized_buffer_is_short_against_fallback_layout() {
        assert_eq!(
            decode(&[0u8; 64]),
            Err(DecodeError::ShortBuffer {
                got: 64,
                want: DIRT_SERIES_PACKET_LEN
            })
        );
        assert_eq!(
            decode(&[]),
            Err(DecodeError::ShortBuffer {
                got: 0,
                want: DIRT_SERIES_PACKET_LEN
            })
        );
    }

    #[test]
    fn oversized_buffer_is_unrecognized() {
        assert_eq!(
            decode(&[0u8; 300]),
            Err(DecodeError::UnrecognizedFormat { len: 300 })
        );
    }

    #[test]
    fn variant_matches_length() -> TestResult {
        assert_eq!(decode(&[0u8; 237])?.format(), PacketFormat::EaWrc);
        assert_eq!(decode(&[0u8; 263])?.format(), PacketFormat::DirtSeries);
        Ok(())
    }

    #[test]
    fn format_display_uses_name() {
        assert_eq!(PacketFormat::EaWrc.to_string(), "ea_wrc");
        assert_eq!(PacketFormat::DirtSeries.packet_len(), 263);
    }
}
