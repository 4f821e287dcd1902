//! Table app errors

use emoji_guess_core::{ConfigError, RoomCode};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("A table needs at least {need} bots, configured {have}")]
    NotEnoughBots { have: usize, need: usize },

    #[error("Room {0} closed before the game finished")]
    RoomClosed(RoomCode),

    #[error("Interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Room(#[from] emoji_guess_room::Error),

    #[error(transparent)]
    Core(#[from] emoji_guess_core::Error),
}
