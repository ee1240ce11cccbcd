//! Codemasters Mode 1 "legacy" layout used by the DiRT series and WRC Generations.
//!
//! Every field is a little-endian `f32`, including values that are integral in
//! practice (gear, lap, race position). Enable in-game under
//! Settings → Accessibility → UDP Telemetry; the default port is 20777.
//!
//! The block between offsets 152 and 236 is inherited from the F1 titles that
//! first used this layout (KERS, DRS, pit state, sector times...). Rally games
//! leave most of it zeroed or reuse it with undocumented meaning, so it is
//! decoded positionally but not interpreted.

use crate::reader::PacketReader;
use crate::telemetry::Telemetry;
use crate::{DecodeError, DecodeResult};

/// Size of a standard Mode 1 datagram.
pub const DIRT_SERIES_PACKET_LEN: usize = 263;

/// Size of the 66-float datagram sent by DiRT Rally 2.0 with `extradata="3"`.
pub const DIRT_SERIES_EXTENDED_PACKET_LEN: usize = 264;

/// Decoded Mode 1 packet.
///
/// Four-wheel arrays are ordered rear-left, rear-right, front-left, front-right,
/// matching the wire order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirtSeriesPacket {
    pub time: f32,
    pub lap_time: f32,
    pub lap_distance: f32,
    pub total_distance: f32,
    /// World space position.
    pub position: [f32; 3],
    pub speed: f32,
    /// Velocity in world space.
    pub velocity: [f32; 3],
    pub right_direction: [f32; 3],
    pub forward_direction: [f32; 3],
    pub suspension_position: [f32; 4],
    pub suspension_velocity: [f32; 4],
    pub wheel_speed: [f32; 4],
    pub throttle: f32,
    pub steering: f32,
    pub brake: f32,
    pub clutch: f32,
    pub gear: f32,
    pub g_force_lat: f32,
    pub g_force_lon: f32,
    pub lap: f32,
    /// Engine rate. Some titles send rpm / 10 here.
    pub engine_rate: f32,

    pub sli_pro_native_support: f32,
    pub car_position: f32,
    pub kers_level: f32,
    pub kers_max_level: f32,
    pub drs: f32,
    pub traction_control: f32,
    pub anti_lock_brakes: f32,
    pub fuel_in_tank: f32,
    pub fuel_capacity: f32,
    pub in_pits: f32,
    pub sector: f32,
    pub sector1_time: f32,
    pub sector2_time: f32,

    /// Brake temperatures in degrees Celsius.
    pub brake_temperature: [f32; 4],
    /// Tyre pressures in PSI.
    pub tyre_pressure: [f32; 4],
    pub team_info: f32,

    pub total_laps: f32,
    /// Stage length in metres; zero on WRC Generations.
    pub track_size: f32,
    pub last_lap_time: f32,
    pub max_rpm: f32,
    pub idle_rpm: f32,
    /// Only present in the 264-byte extended datagram.
    pub max_gears: Option<f32>,
}

impl DirtSeriesPacket {
    /// Decode a Mode 1 datagram.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ShortBuffer`] if `raw` is shorter than
    /// [`DIRT_SERIES_PACKET_LEN`]; no field is read in that case.
    pub fn decode(raw: &[u8]) -> DecodeResult<Self> {
        if raw.len() < DIRT_SERIES_PACKET_LEN {
            return Err(DecodeError::ShortBuffer {
                got: raw.len(),
                want: DIRT_SERIES_PACKET_LEN,
            });
        }

        let mut r = PacketReader::new(raw);
        let mut packet = Self {
            time: r.f32()?,
            lap_time: r.f32()?,
            lap_distance: r.f32()?,
            total_distance: r.f32()?,
            position: r.f32_array()?,
            speed: r.f32()?,
            velocity: r.f32_array()?,
            right_direction: r.f32_array()?,
            forward_direction: r.f32_array()?,
            suspension_position: r.f32_array()?,
            suspension_velocity: r.f32_array()?,
            wheel_speed: r.f32_array()?,
            throttle: r.f32()?,
            steering: r.f32()?,
            brake: r.f32()?,
            clutch: r.f32()?,
            gear: r.f32()?,
            g_force_lat: r.f32()?,
            g_force_lon: r.f32()?,
            lap: r.f32()?,
            engine_rate: r.f32()?,
            sli_pro_native_support: r.f32()?,
            car_position: r.f32()?,
            kers_level: r.f32()?,
            kers_max_level: r.f32()?,
            drs: r.f32()?,
            traction_control: r.f32()?,
            anti_lock_brakes: r.f32()?,
            fuel_in_tank: r.f32()?,
            fuel_capacity: r.f32()?,
            in_pits: r.f32()?,
            sector: r.f32()?,
            sector1_time: r.f32()?,
            sector2_time: r.f32()?,
            brake_temperature: r.f32_array()?,
            tyre_pressure: r.f32_array()?,
            team_info: r.f32()?,
            total_laps: r.f32()?,
            track_size: r.f32()?,
            last_lap_time: r.f32()?,
            max_rpm: r.f32()?,
            idle_rpm: r.f32()?,
            max_gears: None,
        };

        if raw.len() >= DIRT_SERIES_EXTENDED_PACKET_LEN {
            packet.max_gears = Some(r.f32()?);
        }

        Ok(packet)
    }
}

impl Telemetry for DirtSeriesPacket {
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

    /// Mode 1 carries no handbrake channel.
    fn handbrake(&self) -> f32 {
        0.0
    }

    fn gear(&self) -> i32 {
        self.gear as i32
    }

    fn rpm(&self) -> f32 {
        self.engine_rate
    }

    fn max_rpm(&self) -> f32 {
        self.max_rpm
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn stage_distance(&self) -> f32 {
        self.track_size
    }

    fn lap_time(&self) -> f32 {
        self.lap_time
    }

    fn lap_distance(&self) -> f32 {
        self.lap_distance
    }
}
