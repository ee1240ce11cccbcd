//! Format-independent telemetry capability set.

/// Values every supported packet layout can provide.
///
/// Inputs are reported in the simulator's native units: steering in `-1..=1`,
/// pedals in `0..=1`, speed in m/s, stage distance in metres. Accessors only read
/// already-decoded fields.
pub trait Telemetry {
    fn steering(&self) -> f32;
    fn throttle(&self) -> f32;
    fn brake(&self) -> f32;
    fn clutch(&self) -> f32;
    fn handbrake(&self) -> f32;

    /// Current gear, truncated toward zero. Zero or negative conventionally means
    /// neutral or reverse.
    fn gear(&self) -> i32;

    fn rpm(&self) -> f32;
    fn max_rpm(&self) -> f32;
    fn speed(&self) -> f32;

    /// Total stage length. Zero when the simulator does not report one.
    fn stage_distance(&self) -> f32;

    /// Elapsed time on the current lap or stage, in seconds.
    fn lap_time(&self) -> f32;

    /// Distance covered on the current lap or stage, in metres.
    fn lap_distance(&self) -> f32;
}
