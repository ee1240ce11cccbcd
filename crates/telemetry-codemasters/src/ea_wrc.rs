//! EA SPORTS WRC `wrc` telemetry packet.
//!
//! Mixed-width layout: `u64` counters, `f32` channels, `u8` gear indices, a
//! single-byte boolean and `f64` stage distances. The stock `wrc.json` packet
//! definition produces 237-byte datagrams.

use crate::reader::PacketReader;
use crate::telemetry::Telemetry;
use crate::{DecodeError, DecodeResult};

/// Size of an EA SPORTS WRC datagram.
pub const EA_WRC_PACKET_LEN: usize = 237;

/// Decoded EA SPORTS WRC packet.
///
/// Four-wheel arrays are ordered rear-left, rear-right, front-left, front-right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EaWrcPacket {
    pub packet_uid: u64,
    pub game_total_time: f32,
    pub game_delta_time: f32,
    pub game_frame_count: u64,
    pub shiftlights_fraction: f32,
    pub shiftlights_rpm_start: f32,
    pub shiftlights_rpm_end: f32,
    pub shiftlights_rpm_valid: bool,
    pub gear_index: u8,
    pub gear_index_neutral: u8,
    pub gear_index_reverse: u8,
    pub gear_maximum: u8,
    pub speed: f32,
    pub transmission_speed: f32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub acceleration: [f32; 3],
    pub left_direction: [f32; 3],
    pub forward_direction: [f32; 3],
    pub up_direction: [f32; 3],
    pub hub_position: [f32; 4],
    pub hub_velocity: [f32; 4],
    pub cp_forward_speed: [f32; 4],
    pub brake_temperature: [f32; 4],
    pub engine_rpm_max: f32,
    pub engine_rpm_idle: f32,
    pub engine_rpm_current: f32,
    pub throttle: f32,
    pub brake: f32,
    pub clutch: f32,
    pub steering: f32,
    pub handbrake: f32,
    pub stage_current_time: f32,
    pub stage_current_distance: f64,
    pub stage_length: f64,
}

impl EaWrcPacket {
    /// Decode an EA SPORTS WRC datagram.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ShortBuffer`] if `raw` is shorter than
    /// [`EA_WRC_PACKET_LEN`]; no field is read in that case.
    pub fn decode(raw: &[u8]) -> DecodeResult<Self> {
        if raw.len() < EA_WRC_PACKET_LEN {
            return Err(DecodeError::ShortBuffer {
                got: raw.len(),
                want: EA_WRC_PACKET_LEN,
            });
        }

        let mut r = PacketReader::new(raw);
        Ok(Self {
            packet_uid: r.u64()?,
            game_total_time: r.f32()?,
            game_delta_time: r.f32()?,
            game_frame_count: r.u64()?,
            shiftlights_fraction: r.f32()?,
            shiftlights_rpm_start: r.f32()?,
            shiftlights_rpm_end: r.f32()?,
            shiftlights_rpm_valid: r.bool()?,
            gear_index: r.u8()?,
            gear_index_neutral: r.u8()?,
            gear_index_reverse: r.u8()?,
            gear_maximum: r.u8()?,
            speed: r.f32()?,
            transmission_speed: r.f32()?,
            position: r.f32_array()?,
            velocity: r.f32_array()?,
            acceleration: r.f32_array()?,
            left_direction: r.f32_array()?,
            forward_direction: r.f32_array()?,
            up_direction: r.f32_array()?,
            hub_position: r.f32_array()?,
            hub_velocity: r.f32_array()?,
            cp_forward_speed: r.f32_array()?,
            brake_temperature: r.f32_array()?,
            engine_rpm_max: r.f32()?,
            engine_rpm_idle: r.f32()?,
            engine_rpm_current: r.f32()?,
            throttle: r.f32()?,
            brake: r.f32()?,
            clutch: r.f32()?,
            steering: r.f32()?,
            handbrake: r.f32()?,
            stage_current_time: r.f32()?,
            stage_current_distance: r.f64()?,
            stage_length: r.f64()?,
        })
    }

    pub fn is_reverse(&self) -> bool {
        self.gear_index == self.gear_index_reverse
    }

    pub fn is_neutral(&self) -> bool {
        self.gear_index == self.gear_index_neutral
    }
}

impl Telemetry for EaWrcPacket {
    fn steering(&self) -> f32 {
        self.steering
    }

    fn throttle(&self) -> f32 {
        self.throttle
    }

    fn brake(&self) -> f32 {
        self.brake
    }

    fn clutch(&self) -> f32 {
        self.clutch
    }

    fn handbrake(&self) -> f32 {
        self.handbrake
    }

    fn gear(&self) -> i32 {
        i32::from(self.gear_index)
    }

    fn rpm(&self) -> f32 {
        self.engine_rpm_current
    }

    fn max_rpm(&self) -> f32 {
        self.engine_rpm_max
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn stage_distance(&self) -> f32 {
        self.stage_length as f32
    }

    fn lap_time(&self) -> f32 {
        self.stage_current_time
    }

    fn lap_distance(&self) -> f32 {
        self.stage_current_distance as f32
    }
}
