use alloc::string::String;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverResponse {
    /// Stable identifier derived from the device host.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Network address of the blind.
    pub host: String,
    /// Whether the last poll produced a position.
    pub available: bool,
    pub is_opening: bool,
    pub is_closing: bool,
    pub is_closed: bool,
    /// Tilt position percentage (0-100), 0 while unavailable
    pub current_tilt_position: u8,
    /// Raw actuator position
    pub current_steps: Option<u32>,
    /// Raw full travel calibration
    pub max_steps: Option<u32>,
    /// Time of the last successful position report
    pub last_updated: Option<OffsetDateTime>,
}

/// Target tilt. Range checked by the host so that out-of-range values get a
/// proper error instead of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTiltRequest {
    /// Target tilt percentage (0-100)
    pub tilt_position: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveStepsRequest {
    /// Relative steps, negative towards the zero end
    pub steps: i32,
}
