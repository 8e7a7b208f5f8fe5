//! Payloads exchanged with the blind firmware over HTTP.

use alloc::string::String;

use serde::{Deserialize, Serialize};

/// Body of `GET /status`.
///
/// The firmware either reports both step counters or a `msg` describing why
/// it cannot (e.g. the stepper is still moving).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_steps: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

/// Interpretation of a [`StatusReply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Raw counters as reported. Negative values mean the device is not calibrated.
    Position { current_steps: i64, max_steps: i64 },
    /// Soft error reported by the device.
    Message(String),
    /// Neither counters nor a message.
    Malformed,
}

impl From<StatusReply> for DeviceStatus {
    fn from(reply: StatusReply) -> Self {
        match reply {
            StatusReply {
                current_steps: Some(current_steps),
                max_steps: Some(max_steps),
                ..
            } => DeviceStatus::Position {
                current_steps,
                max_steps,
            },
            StatusReply { msg: Some(msg), .. } => DeviceStatus::Message(msg),
            _ => DeviceStatus::Malformed,
        }
    }
}

/// Body of `PUT /move`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveCommand {
    /// Target as a fraction of `max_steps`, in `[0, 1]`.
    pub fraction: f64,
}

impl MoveCommand {
    pub fn from_percent(percent: u8) -> Self {
        Self {
            fraction: f64::from(percent.min(100)) / 100.0,
        }
    }
}

/// Body of `PUT /unsafe_move`.
///
/// Relative move that bypasses the calibration check. The firmware grows
/// `max_steps` from these moves, so this is how an uncalibrated blind learns
/// its travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveStepsCommand {
    /// Steps to travel, negative towards zero.
    pub steps: i32,
}

/// Body the firmware answers to `PUT` commands with a 2xx status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

/// Interpretation of a [`CommandReply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAck {
    Accepted,
    /// The firmware dropped the command, usually because the stepper is
    /// still busy with the previous one.
    Dropped(String),
}

impl From<CommandReply> for CommandAck {
    fn from(reply: CommandReply) -> Self {
        match reply.msg {
            Some(msg) if msg != "OK" => CommandAck::Dropped(msg),
            _ => CommandAck::Accepted,
        }
    }
}

/// Body of `GET /system_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Firmware SDK version string
    pub version: String,
    /// Number of CPU cores
    pub cores: u32,
}
