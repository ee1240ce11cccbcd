//! The single writer of the shared dashboard [`Status`].

use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use rallydash_telemetry_codemasters::Telemetry;
use tracing::{debug, info};

use crate::ParseSettingError;
use crate::handbrake::HandbrakeAxis;
use crate::status::Status;

/// Where the status handbrake value comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HandbrakeSource {
    /// Use the handbrake channel of each packet.
    #[default]
    Packet,
    /// Ignore the packet channel; only the auxiliary axis writes the handbrake.
    Axis,
}

impl HandbrakeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Packet => "packet",
            Self::Axis => "axis",
        }
    }
}

impl fmt::Display for HandbrakeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandbrakeSource {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "packet" => Ok(Self::Packet),
            "axis" | "joystick" => Ok(Self::Axis),
            _ => Err(ParseSettingError {
                setting: "handbrake source",
                value: s.to_string(),
                expected: "packet, axis",
            }),
        }
    }
}

/// Owns the current [`Status`] behind a reader/writer lock.
///
/// Every method takes `&self`, so one aggregator can be shared through an `Arc`
/// between the UDP listener, an auxiliary input reader and any number of
/// readers. Mutators return the status as it was right after the change, taken
/// under the same write lock.
#[derive(Debug, Default)]
pub struct StatusAggregator {
    status: RwLock<Status>,
    handbrake_source: HandbrakeSource,
    axis: HandbrakeAxis,
}

impl StatusAggregator {
    pub fn new(handbrake_source: HandbrakeSource) -> Self {
        Self {
            status: RwLock::new(Status::default()),
            handbrake_source,
            axis: HandbrakeAxis::default(),
        }
    }

    pub fn with_axis(mut self, axis: HandbrakeAxis) -> Self {
        self.axis = axis;
        self
    }

    pub fn handbrake_source(&self) -> HandbrakeSource {
        self.handbrake_source
    }

    /// Copy decoded driver inputs into the status.
    ///
    /// Steering is negated when the packet reports no stage length. WRC
    /// Generations speaks the Mode 1 layout with inverted steering and never
    /// fills in the stage length, so a zero length is the only hint that the
    /// polarity is flipped. This is a heuristic, not a protocol guarantee.
    pub fn update<T: Telemetry + ?Sized>(&self, telemetry: &T) -> Status {
        let polarity = if telemetry.stage_distance() == 0.0 {
            -1.0
        } else {
            1.0
        };

        let mut status = self.status.write();
        status.steer = polarity * telemetry.steering();
        status.clutch = telemetry.clutch();
        status.brake = telemetry.brake();
        status.throttle = telemetry.throttle();
        status.gear = telemetry.gear();
        if self.handbrake_source == HandbrakeSource::Packet {
            status.handbrake = Some(telemetry.handbrake());
        }
        *status
    }

    /// Apply a raw auxiliary handbrake axis reading in `-1.0..=1.0`.
    pub fn set_handbrake_axis(&self, raw: f32) -> Status {
        let position = self.axis.map(raw);
        let mut status = self.status.write();
        status.handbrake = Some(position);
        *status
    }

    pub fn activate(&self) -> Status {
        let mut status = self.status.write();
        if !status.active {
            info!("telemetry session active");
        }
        status.active = true;
        *status
    }

    pub fn deactivate(&self) -> Status {
        let mut status = self.status.write();
        if status.active {
            info!("telemetry session inactive");
        } else {
            debug!("deactivate on already inactive session");
        }
        status.active = false;
        *status
    }

    /// Value copy of the current status.
    pub fn snapshot(&self) -> Status {
        *self.status.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rallydash_telemetry_codemasters::{DIRT_SERIES_PACKET_LEN, EA_WRC_PACKET_LEN, decode};
    use std::sync::Arc;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn ea_wrc_packet(steering: f32, stage_length: f64) -> Vec<u8> {
        let mut raw = vec![0u8; EA_WRC_PACKET_LEN];
        raw[209..213].copy_from_slice(&steering.to_le_bytes());
        raw[213..217].copy_from_slice(&0.5f32.to_le_bytes());
        raw[229..237].copy_from_slice(&stage_length.to_le_bytes());
        raw
    }

    fn dirt_series_packet(steering: f32, track_size: f32, gear: f32) -> Vec<u8> {
        let mut raw = vec![0u8; DIRT_SERIES_PACKET_LEN];
        raw[120..124].copy_from_slice(&steering.to_le_bytes());
        raw[132..136].copy_from_slice(&gear.to_le_bytes());
        raw[244..248].copy_from_slice(&track_size.to_le_bytes());
        raw
    }

    #[test]
    fn steering_kept_when_stage_length_known() -> TestResult {
        let aggregator = StatusAggregator::default();
        let packet = decode(&ea_wrc_packet(0.25, 10_000.0))?;
        let status = aggregator.update(&packet);
        assert!((status.steer - 0.25).abs() < f32::EPSILON);
        Ok(())
    }

    #[test]
    fn steering_flipped_without_stage_length() -> TestResult {
        let aggregator = StatusAggregator::default();
        let packet = decode(&dirt_series_packet(0.3, 0.0, 2.0))?;
        let status = aggregator.update(&packet);
        assert!((status.steer + 0.3).abs() < f32::EPSILON);
        assert_eq!(status.gear, 2);
        Ok(())
    }

    #[test]
    fn update_does_not_touch_activity() -> TestResult {
        let aggregator = StatusAggregator::default();
        let packet = decode(&dirt_series_packet(0.1, 5.0, 1.0))?;
        assert!(!aggregator.update(&packet).active);
        aggregator.activate();
        assert!(aggregator.update(&packet).active);
        Ok(())
    }

    #[test]
    fn packet_handbrake_used_by_default() -> TestResult {
        let aggregator = StatusAggregator::new(HandbrakeSource::Packet);
        let status = aggregator.update(&decode(&ea_wrc_packet(0.0, 1.0))?);
        assert_eq!(status.handbrake, Some(0.5));
        Ok(())
    }

    #[test]
    fn axis_handbrake_survives_packet_updates() -> TestResult {
        let aggregator = StatusAggregator::new(HandbrakeSource::Axis);
        assert_eq!(aggregator.update(&decode(&ea_wrc_packet(0.0, 1.0))?).handbrake, None);

        let status = aggregator.set_handbrake_axis(1.0);
        assert_eq!(status.handbrake, Some(1.0));

        let status = aggregator.update(&decode(&ea_wrc_packet(0.0, 1.0))?);
        assert_eq!(status.handbrake, Some(1.0));
        Ok(())
    }

    #[test]
    fn activate_and_deactivate_toggle_flag() {
        let aggregator = StatusAggregator::default();
        assert!(aggregator.activate().active);
        assert!(aggregator.snapshot().active);
        assert!(!aggregator.deactivate().active);
        assert!(!aggregator.snapshot().active);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let aggregator = StatusAggregator::default();
        let before = aggregator.snapshot();
        aggregator.activate();
        assert!(!before.active);
    }

    #[test]
    fn handbrake_source_parses() {
        assert_eq!("axis".parse(), Ok(HandbrakeSource::Axis));
        assert_eq!("Packet".parse(), Ok(HandbrakeSource::Packet));
        assert!("lever".parse::<HandbrakeSource>().is_err());
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let aggregator = Arc::new(StatusAggregator::new(HandbrakeSource::Axis));
        let mut handles = Vec::new();
        for i in 0..4 {
            let aggregator = Arc::clone(&aggregator);
            handles.push(std::thread::spawn(move || {
                for step in 0..500 {
                    if (i + step) % 2 == 0 {
                        aggregator.set_handbrake_axis(1.0);
                    } else {
                        let status = aggregator.snapshot();
                        if let Some(h) = status.handbrake {
                            assert!((0.0..=1.0).contains(&h));
                        }
                    }
                }
            }));
        }
        for handle in handles {
            assert!(handle.join().is_ok());
        }
        assert_eq!(aggregator.snapshot().handbrake, Some(1.0));
    }
}
