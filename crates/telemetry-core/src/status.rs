use serde::{Deserialize, Serialize};

/// Last-known driver inputs plus session activity, as shown on the dashboard.
///
/// Field names serialize in PascalCase (`Steer`, `Gear`, `Active`...), the shape
/// the dashboard UI consumes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Status {
    pub steer: f32,
    pub clutch: f32,
    pub brake: f32,
    pub throttle: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handbrake: Option<f32>,
    pub gear: i32,
    pub active: bool,
}
