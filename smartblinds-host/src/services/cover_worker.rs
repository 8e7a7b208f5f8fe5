use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::anyhow;
use smartblinds_api::models::CoverResponse;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::services::cover_service::BlindCover;

const COMMAND_BUFFER: usize = 16;

pub enum CoverCommand {
    SetTilt {
        tilt_position: u8,
        reply: oneshot::Sender<CoverResponse>,
    },
    MoveSteps {
        steps: i32,
        reply: oneshot::Sender<CoverResponse>,
    },
    Refresh {
        reply: oneshot::Sender<CoverResponse>,
    },
    ResetCalibration {
        reply: oneshot::Sender<CoverResponse>,
    },
}

/// Cheap handle onto a running cover worker.
#[derive(Clone)]
pub struct CoverHandle {
    id: String,
    commands: mpsc::Sender<CoverCommand>,
    snapshot: watch::Receiver<CoverResponse>,
}

impl CoverHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// State as of the last poll or command.
    pub fn snapshot(&self) -> CoverResponse {
        self.snapshot.borrow().clone()
    }

    pub async fn set_tilt_position(&self, tilt_position: u8) -> anyhow::Result<CoverResponse> {
        self.execute(|reply| CoverCommand::SetTilt {
            tilt_position,
            reply,
        })
        .await
    }

    pub async fn move_steps(&self, steps: i32) -> anyhow::Result<CoverResponse> {
        self.execute(|reply| CoverCommand::MoveSteps { steps, reply })
            .await
    }

    pub async fn refresh(&self) -> anyhow::Result<CoverResponse> {
        self.execute(|reply| CoverCommand::Refresh { reply }).await
    }

    pub async fn reset_calibration(&self) -> anyhow::Result<CoverResponse> {
        self.execute(|reply| CoverCommand::ResetCalibration { reply })
            .await
    }

    async fn execute(
        &self,
        command: impl FnOnce(oneshot::Sender<CoverResponse>) -> CoverCommand,
    ) -> anyhow::Result<CoverResponse> {
        let (reply, response) = oneshot::channel();

        self.commands
            .send(command(reply))
            .await
            .map_err(|_| anyhow!("Worker for cover {} stopped", self.id))?;

        response
            .await
            .map_err(|_| anyhow!("Worker for cover {} dropped the command", self.id))
    }
}

/// Polls the cover once, then hands it to a dedicated worker task that polls
/// every `poll_interval` and applies commands one at a time.
pub async fn spawn_cover(mut cover: BlindCover, poll_interval: Duration) -> CoverHandle {
    cover.log_firmware_info().await;
    cover.update().await;

    let id = cover.unique_id().to_string();
    let (snapshot_tx, snapshot_rx) = watch::channel(cover.snapshot());
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);

    info!(cover = %cover.name(), id = %id, "Cover registered");

    tokio::spawn(run_worker(cover, poll_interval, command_rx, snapshot_tx));

    CoverHandle {
        id,
        commands: command_tx,
        snapshot: snapshot_rx,
    }
}

async fn run_worker(
    mut cover: BlindCover,
    poll_interval: Duration,
    mut commands: mpsc::Receiver<CoverCommand>,
    snapshot: watch::Sender<CoverResponse>,
) {
    let mut interval = time::interval_at(Instant::now() + poll_interval, poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                cover.update().await;
                snapshot.send_replace(cover.snapshot());
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };

                let reply = match command {
                    CoverCommand::SetTilt { tilt_position, reply } => {
                        cover.set_tilt_position(tilt_position).await;
                        reply
                    }
                    CoverCommand::MoveSteps { steps, reply } => {
                        cover.move_steps(steps).await;
                        reply
                    }
                    CoverCommand::Refresh { reply } => {
                        cover.update().await;
                        reply
                    }
                    CoverCommand::ResetCalibration { reply } => {
                        cover.reset_calibration().await;
                        reply
                    }
                };

                let current = cover.snapshot();
                snapshot.send_replace(current.clone());
                let _ = reply.send(current);
            }
        }
    }

    debug!(cover = %cover.name(), "Cover worker stopped");
}

/// Running covers keyed by id.
#[derive(Clone, Default)]
pub struct CoverRegistry {
    covers: BTreeMap<String, CoverHandle>,
}

impl CoverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: CoverHandle) {
        self.covers.insert(handle.id().to_string(), handle);
    }

    pub fn get(&self, id: &str) -> Option<&CoverHandle> {
        self.covers.get(id)
    }

    pub fn len(&self) -> usize {
        self.covers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.covers.is_empty()
    }

    /// Snapshots ordered by display name.
    pub fn snapshots(&self) -> Vec<CoverResponse> {
        let mut snapshots: Vec<_> = self.covers.values().map(CoverHandle::snapshot).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        snapshots
    }
}
