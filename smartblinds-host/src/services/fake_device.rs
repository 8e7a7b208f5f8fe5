use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use smartblinds_api::protocol::{
    CommandAck, DeviceStatus, MoveCommand, MoveStepsCommand, StatusReply, SystemInfo,
};

use crate::errors::DeviceError;
use crate::services::device_client::BlindDevice;

/// Scripted [`BlindDevice`]. Replies are consumed in push order; an empty
/// status queue answers [`DeviceStatus::Malformed`] and an empty command queue
/// accepts the command. Moves, step moves and resets share the command queue.
#[derive(Default)]
pub struct FakeDevice {
    statuses: Mutex<VecDeque<Result<DeviceStatus, DeviceError>>>,
    command_results: Mutex<VecDeque<Result<CommandAck, DeviceError>>>,
    moves: Mutex<Vec<MoveCommand>>,
    step_moves: Mutex<Vec<i32>>,
    status_calls: AtomicUsize,
    resets: AtomicUsize,
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_status(&self, status: Result<DeviceStatus, DeviceError>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn push_command(&self, result: Result<CommandAck, DeviceError>) {
        self.command_results.lock().unwrap().push_back(result);
    }

    pub fn moves(&self) -> Vec<MoveCommand> {
        self.moves.lock().unwrap().clone()
    }

    pub fn step_moves(&self) -> Vec<i32> {
        self.step_moves.lock().unwrap().clone()
    }

    fn next_command_result(&self) -> Result<CommandAck, DeviceError> {
        self.command_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(CommandAck::Accepted))
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn http_status(status: u16) -> DeviceError {
        DeviceError::HttpStatus {
            url: "http://fake".into(),
            status,
        }
    }

    pub fn decode_error() -> DeviceError {
        let source = serde_json::from_str::<StatusReply>("<html>").unwrap_err();
        DeviceError::Decode {
            url: "http://fake/status".into(),
            source,
        }
    }

    /// A genuine transport failure: a request to a port nobody listens on.
    pub async fn unreachable() -> DeviceError {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let error = reqwest::get(format!("http://{address}/status"))
            .await
            .unwrap_err();
        DeviceError::Transport(error)
    }
}

#[async_trait]
impl BlindDevice for FakeDevice {
    async fn status(&self) -> Result<DeviceStatus, DeviceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(DeviceStatus::Malformed))
    }

    async fn move_to(&self, command: &MoveCommand) -> Result<CommandAck, DeviceError> {
        self.moves.lock().unwrap().push(*command);
        self.next_command_result()
    }

    async fn move_steps(&self, command: &MoveStepsCommand) -> Result<CommandAck, DeviceError> {
        self.step_moves.lock().unwrap().push(command.steps);
        self.next_command_result()
    }

    async fn reset_state(&self) -> Result<CommandAck, DeviceError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.next_command_result()
    }

    async fn system_info(&self) -> Result<SystemInfo, DeviceError> {
        Ok(SystemInfo {
            version: "v4.4".into(),
            cores: 2,
        })
    }
}
