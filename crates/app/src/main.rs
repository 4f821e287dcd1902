//! Emoji Guess - headless table
//!
//! Seats a table of bots in an in-memory room, plays one game to the end,
//! logs the chat as it happens and archives the final room.

use std::path::PathBuf;
use std::sync::Arc;

use emoji_guess_core::{Lifecycle, Room, RoomCode};
use emoji_guess_room::{GameCoordinator, MemoryRoomStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod archivist;
mod bot_runtime;
mod error;
mod state;
mod viewmodel;

use crate::archivist::GameArchive;
use crate::bot_runtime::BotRuntime;
use crate::error::{Error, Result};
use crate::state::AppState;
use crate::viewmodel::{render_line, ChatViewModel};

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Emoji Guess table");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let app_state = match AppState::new(config_path) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        config = ?app_state.config_path(),
        data_dir = %app_state.data_dir().display(),
        "Configuration loaded"
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(app_state)) {
        tracing::error!("Table stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(state: Arc<AppState>) -> Result<()> {
    let store = Arc::new(MemoryRoomStore::new());
    let mut coordinator = GameCoordinator::new(store, state.game().clone())?;
    if let Some(seed) = state.table().seed {
        coordinator = coordinator.with_seed(seed);
    }
    let coordinator = Arc::new(coordinator);

    let mut bots = BotRuntime::new(coordinator.clone(), state.table().clone());
    let code = bots.seat().await?;
    let host = bots.host().cloned().ok_or(Error::NotEnoughBots {
        have: 0,
        need: state.game().min_players,
    })?;

    let chat_task = tokio::spawn(log_chat(coordinator.clone(), code.clone()));
    bots.spawn(&code);
    let watchdog = coordinator.spawn_turn_watchdog(code.clone());

    coordinator.start_game(&code, &host.id).await?;

    let outcome = tokio::select! {
        finished = wait_for_finish(&coordinator, &code) => finished,
        _ = tokio::signal::ctrl_c() => Err(Error::Interrupted),
    };

    watchdog.shutdown();
    bots.shutdown();
    watchdog.join().await;
    bots.join().await;

    let result = match outcome {
        Ok(room) => archive(&state, &coordinator, &room),
        Err(e) => Err(e),
    };

    coordinator.delete_room(&code, &host.id)?;
    let chat = chat_task.await.unwrap_or_default();
    tracing::info!(lines = chat.len(), "Chat closed");
    result
}

async fn wait_for_finish(coordinator: &GameCoordinator, code: &RoomCode) -> Result<Room> {
    let mut sub = coordinator.observe_room(code);
    while let Some(snapshot) = sub.next().await {
        match snapshot {
            Some(room) if room.state == Lifecycle::Finished => {
                let winner = room
                    .winner_id
                    .as_ref()
                    .and_then(|w| room.player(w))
                    .map(|p| p.name.clone());
                tracing::info!(
                    room = %code,
                    rounds = room.current_round,
                    winner = ?winner,
                    "Game over"
                );
                return Ok(room);
            }
            Some(_) => {}
            None => break,
        }
    }
    Err(Error::RoomClosed(code.clone()))
}

fn archive(state: &AppState, coordinator: &GameCoordinator, room: &Room) -> Result<()> {
    let mut chat = ChatViewModel::new();
    chat.merge(&coordinator.observe_chat(&room.room_code).current());
    GameArchive::new(room, chat.lines())?.save(&state.archive_dir())?;
    Ok(())
}

/// Print chat lines until the room is deleted; returns what was shown
async fn log_chat(coordinator: Arc<GameCoordinator>, code: RoomCode) -> Vec<String> {
    let mut room_sub = coordinator.observe_room(&code);
    let mut chat_sub = coordinator.observe_chat(&code);
    let mut chat = ChatViewModel::new();
    let mut shown = Vec::new();

    loop {
        tokio::select! {
            entries = chat_sub.next() => {
                let Some(entries) = entries else { break };
                for line in chat.merge(&entries) {
                    let rendered = render_line(&line);
                    tracing::info!(room = %code, "{}", rendered);
                    shown.push(rendered);
                }
            }
            snapshot = room_sub.next() => {
                if !matches!(snapshot, Some(Some(_))) {
                    break;
                }
            }
        }
    }

    chat_sub.unsubscribe();
    room_sub.unsubscribe();
    shown
}
