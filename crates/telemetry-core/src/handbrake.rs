//! Auxiliary handbrake axis mapping.
//!
//! External handbrake levers are read as a joystick axis. Most levers do not
//! travel the full axis range, so the usable span is stretched and offset before
//! clamping into `0.0..=1.0`.

/// Fraction of the axis the lever actually travels.
pub const DEFAULT_AXIS_TRAVEL: f32 = 0.7;
/// Dead zone subtracted after stretching.
pub const DEFAULT_AXIS_OFFSET: f32 = 0.1;
/// Largest magnitude reported by a signed 16-bit joystick axis.
pub const MAX_RAW_AXIS: i16 = i16::MAX;

/// Maps a raw axis reading to a handbrake position in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandbrakeAxis {
    pub travel: f32,
    pub offset: f32,
}

impl Default for HandbrakeAxis {
    fn default() -> Self {
        Self {
            travel: DEFAULT_AXIS_TRAVEL,
            offset: DEFAULT_AXIS_OFFSET,
        }
    }
}

impl HandbrakeAxis {
    pub fn new(travel: f32, offset: f32) -> Self {
        Self { travel, offset }
    }

    /// Map an axis value in `-1.0..=1.0` to a clamped handbrake position.
    ///
    /// Non-finite input and a non-positive travel map to `0.0`.
    pub fn map(&self, raw: f32) -> f32 {
        if !raw.is_finite() || self.travel <= 0.0 {
            return 0.0;
        }
        let position = (raw.clamp(-1.0, 1.0) + 1.0) / 2.0;
        (position / self.travel - self.offset).clamp(0.0, 1.0)
    }

    /// Map a signed 16-bit joystick reading (`-32767..=32767`).
    pub fn map_raw_i16(&self, raw: i16) -> f32 {
        self.map(f32::from(raw) / f32::from(MAX_RAW_AXIS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lever_at_rest_maps_to_zero() {
        let axis = HandbrakeAxis::default();
        assert!(axis.map_raw_i16(-32767).abs() < f32::EPSILON);
        assert!(axis.map_raw_i16(i16::MIN).abs() < f32::EPSILON);
        assert!(axis.map(-1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn lever_fully_pulled_clamps_to_one() {
        let axis = HandbrakeAxis::default();
        assert!((axis.map_raw_i16(32767) - 1.0).abs() < f32::EPSILON);
        assert!((axis.map(1.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn centred_axis_is_stretched() {
        let axis = HandbrakeAxis::default();
        let expected = 0.5 / 0.7 - 0.1;
        assert!((axis.map_raw_i16(0) - expected).abs() < 1e-6);
        assert!((axis.map(0.0) - 0.614_285_7).abs() < 1e-5);
    }

    #[test]
    fn non_finite_input_is_released() {
        let axis = HandbrakeAxis::default();
        assert!(axis.map(f32::NAN).abs() < f32::EPSILON);
        assert!(axis.map(f32::INFINITY).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_travel_never_divides() {
        let axis = HandbrakeAxis::new(0.0, 0.1);
        assert!(axis.map(0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn output_stays_in_unit_range() {
        let axis = HandbrakeAxis::default();
        for raw in (-32767i32..=32767).step_by(97) {
            let Ok(raw) = i16::try_from(raw) else {
                continue;
            };
            let value = axis.map_raw_i16(raw);
            assert!((0.0..=1.0).contains(&value), "raw {raw} mapped to {value}");
        }
    }
}
