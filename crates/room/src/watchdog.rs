//! Turn watchdog - eliminates turn holders who run out of time

use std::sync::Arc;
use std::time::Duration;

use emoji_guess_core::RoomCode;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::coordinator::GameCoordinator;
use crate::error::Error;

/// Handle to a running watchdog task
///
/// The task exits on its own once the room is finished or deleted.
pub struct TurnWatchdog {
    code: RoomCode,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl TurnWatchdog {
    pub(crate) fn spawn(coordinator: Arc<GameCoordinator>, code: RoomCode) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let shutdown_rx = shutdown_tx.subscribe();
        let task = tokio::spawn(watch_turns(coordinator, code.clone(), shutdown_rx));
        debug!(room = %code, "Turn watchdog started");
        Self {
            code,
            shutdown_tx,
            task,
        }
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.code
    }

    /// Ask the task to stop at its next wake-up
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to exit
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(room = %self.code, "Turn watchdog panicked: {}", e);
        }
    }
}

async fn watch_turns(
    coordinator: Arc<GameCoordinator>,
    code: RoomCode,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let interval = Duration::from_millis(coordinator.config().turn_check_interval_ms);

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                match coordinator.store().get_room(&code) {
                    Ok(Some(room)) if !room.state.is_terminal() => {}
                    Ok(_) => {
                        debug!(room = %code, "Room closed, turn watchdog exiting");
                        break;
                    }
                    Err(e) => {
                        warn!(room = %code, "Turn watchdog could not read room: {}", e);
                        continue;
                    }
                }

                match coordinator.expire_turn(&code).await {
                    Ok(Some(player)) => info!(room = %code, player = %player, "Turn timed out"),
                    Ok(None) => {}
                    Err(Error::RoomNotFound(_)) => break,
                    Err(e) => warn!(room = %code, "Turn expiry failed: {}", e),
                }
            }
            _ = shutdown_rx.recv() => {
                debug!(room = %code, "Turn watchdog shutting down");
                break;
            }
        }
    }
}
