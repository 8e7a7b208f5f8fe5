use std::sync::Arc;

use sha2::{Digest, Sha256};
use smartblinds_api::models::CoverResponse;
use smartblinds_api::protocol::{CommandAck, DeviceStatus, MoveCommand, MoveStepsCommand};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::errors::DeviceError;
use crate::services::device_client::BlindDevice;

/// Stable cover identifier: lower-case hex SHA-256 of the device host.
pub fn cover_id(host: &str) -> String {
    format!("{:x}", Sha256::digest(host.as_bytes()))
}

/// Last reported actuator counters. Both are known or neither is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPosition {
    pub current_steps: u32,
    pub max_steps: u32,
}

impl StepPosition {
    /// Accepts the raw counters only when both are non-negative.
    pub fn from_raw(current_steps: i64, max_steps: i64) -> Option<Self> {
        Some(Self {
            current_steps: u32::try_from(current_steps).ok()?,
            max_steps: u32::try_from(max_steps).ok()?,
        })
    }

    /// `floor(100 * current / max + 0.5)`, capped to 100.
    pub fn tilt_percent(&self) -> u8 {
        if self.max_steps == 0 {
            return 0;
        }

        let current = u64::from(self.current_steps);
        let max = u64::from(self.max_steps);
        ((200 * current + max) / (2 * max)).min(100) as u8
    }

    pub fn is_closed(&self) -> bool {
        self.current_steps == 0 || self.current_steps == self.max_steps
    }
}

/// In-memory view of one blind.
///
/// Every operation resolves device failures to an unavailable state plus a
/// log line; nothing is returned to the caller as an error.
pub struct BlindCover {
    host: String,
    name: String,
    unique_id: String,
    position: Option<StepPosition>,
    in_motion: bool,
    last_updated: Option<OffsetDateTime>,
    device: Arc<dyn BlindDevice>,
}

impl BlindCover {
    pub fn new(host: impl Into<String>, name: impl Into<String>, device: Arc<dyn BlindDevice>) -> Self {
        let host = host.into();

        Self {
            unique_id: cover_id(&host),
            host,
            name: name.into(),
            position: None,
            in_motion: false,
            last_updated: None,
            device,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn position(&self) -> Option<StepPosition> {
        self.position
    }

    /// Raw position, `-1` when unknown.
    pub fn current_steps(&self) -> i64 {
        self.position.map_or(-1, |p| i64::from(p.current_steps))
    }

    /// Raw full travel, `-1` when unknown.
    pub fn max_steps(&self) -> i64 {
        self.position.map_or(-1, |p| i64::from(p.max_steps))
    }

    pub fn available(&self) -> bool {
        self.position.is_some()
    }

    pub fn in_motion(&self) -> bool {
        self.in_motion
    }

    // The device does not report a direction, so opening and closing are the
    // same flag.
    pub fn is_opening(&self) -> bool {
        self.in_motion
    }

    pub fn is_closing(&self) -> bool {
        self.in_motion
    }

    /// Closed at either end of travel.
    pub fn is_closed(&self) -> bool {
        self.position.is_some_and(|p| p.is_closed())
    }

    pub fn tilt_position(&self) -> u8 {
        self.position.map_or(0, |p| p.tilt_percent())
    }

    pub fn last_updated(&self) -> Option<OffsetDateTime> {
        self.last_updated
    }

    pub fn snapshot(&self) -> CoverResponse {
        CoverResponse {
            id: self.unique_id.clone(),
            name: self.name.clone(),
            host: self.host.clone(),
            available: self.available(),
            is_opening: self.is_opening(),
            is_closing: self.is_closing(),
            is_closed: self.is_closed(),
            current_tilt_position: self.tilt_position(),
            current_steps: self.position.map(|p| p.current_steps),
            max_steps: self.position.map(|p| p.max_steps),
            last_updated: self.last_updated,
        }
    }

    /// Poll `/status` and replace the whole position with the result.
    pub async fn update(&mut self) {
        self.position = None;

        let status = match self.device.status().await {
            Ok(status) => status,
            Err(DeviceError::HttpStatus { status, .. }) => {
                warn!(cover = %self.name, host = %self.host, "HTTP response code {}", status);
                self.in_motion = false;
                return;
            }
            Err(DeviceError::Decode { source, .. }) => {
                warn!(cover = %self.name, host = %self.host, "Malformed status payload: {}", source);
                self.in_motion = false;
                return;
            }
            Err(e) => {
                error!(cover = %self.name, host = %self.host, "Status request failed: {}", e);
                self.in_motion = false;
                return;
            }
        };

        match status {
            DeviceStatus::Position {
                current_steps,
                max_steps,
            } => {
                self.in_motion = false;
                self.position = StepPosition::from_raw(current_steps, max_steps);

                if self.position.is_some() {
                    self.last_updated = Some(OffsetDateTime::now_utc());
                    info!(
                        cover = %self.name,
                        "position: {}, max_position: {}", current_steps, max_steps
                    );
                } else {
                    warn!(
                        cover = %self.name,
                        "Device is not calibrated (position: {}, max_position: {})",
                        current_steps, max_steps
                    );
                }
            }
            // The firmware answers with a message while the stepper is busy,
            // so motion is kept.
            DeviceStatus::Message(msg) => {
                warn!(cover = %self.name, host = %self.host, "{}", msg);
            }
            DeviceStatus::Malformed => {
                warn!(cover = %self.name, host = %self.host, "Status payload has no position");
                self.in_motion = false;
            }
        }
    }

    /// Ask the device to move to `percent` of its travel. The new position is
    /// only known after the next [`update`](Self::update).
    pub async fn set_tilt_position(&mut self, percent: u8) {
        let percent = percent.min(100);
        let command = MoveCommand::from_percent(percent);

        match self.device.move_to(&command).await {
            Ok(CommandAck::Accepted) => {
                self.in_motion = true;
                info!(cover = %self.name, "Move tilt position to {}", percent);
            }
            Ok(CommandAck::Dropped(msg)) => self.command_dropped("Move", &msg),
            Err(e) => self.command_failed("Move", e),
        }
    }

    /// Move by a relative number of steps, bypassing calibration. On an
    /// uncalibrated device the first such move starts a fresh calibration and
    /// later ones extend `max_steps`, so this is how the cover becomes
    /// available again after [`reset_calibration`](Self::reset_calibration).
    pub async fn move_steps(&mut self, steps: i32) {
        match self.device.move_steps(&MoveStepsCommand { steps }).await {
            Ok(CommandAck::Accepted) => {
                self.in_motion = true;
                info!(cover = %self.name, "Move {} steps", steps);
            }
            Ok(CommandAck::Dropped(msg)) => self.command_dropped("Step move", &msg),
            Err(e) => self.command_failed("Step move", e),
        }
    }

    /// Drop the device calibration. The cover stays unavailable until the
    /// device is calibrated again.
    pub async fn reset_calibration(&mut self) {
        match self.device.reset_state().await {
            Ok(CommandAck::Accepted) => {
                self.position = None;
                self.in_motion = false;
                info!(cover = %self.name, "Device calibration reset");
            }
            Ok(CommandAck::Dropped(msg)) => self.command_dropped("Reset", &msg),
            Err(e) => self.command_failed("Reset", e),
        }
    }

    /// Log the firmware version. Failures never affect the cover state.
    pub async fn log_firmware_info(&self) {
        match self.device.system_info().await {
            Ok(info) => info!(
                cover = %self.name,
                host = %self.host,
                "Firmware {} on {} core(s)", info.version, info.cores
            ),
            Err(e) => debug!(cover = %self.name, "System info unavailable: {}", e),
        }
    }

    // The device answered 2xx without acting on the command.
    fn command_dropped(&self, command: &str, msg: &str) {
        warn!(cover = %self.name, "{} dropped by device: {}", command, msg);
    }

    fn command_failed(&mut self, command: &str, error: DeviceError) {
        match error {
            // The device answered but refused; the position is still whatever
            // it was.
            DeviceError::HttpStatus { status, .. } => {
                warn!(cover = %self.name, "{} rejected with HTTP response code {}", command, status);
            }
            e => {
                error!(cover = %self.name, host = %self.host, "{} failed: {}", command, e);
                self.position = None;
                self.in_motion = false;
            }
        }
    }
}
