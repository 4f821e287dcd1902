//! Room store and coordinator error types

use emoji_guess_core::{ConfigError, Lifecycle, PlayerId, RoomCode};

/// Room result type
pub type Result<T> = std::result::Result<T, Error>;

/// Room store and coordinator errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Room not found: {0}")]
    RoomNotFound(RoomCode),

    #[error("Room already exists: {0}")]
    RoomExists(RoomCode),

    #[error("Player {player} is not in room {room}")]
    PlayerNotFound { room: RoomCode, player: PlayerId },

    #[error("Room {0} is full")]
    RoomFull(RoomCode),

    #[error("Game in room {0} has already started")]
    AlreadyStarted(RoomCode),

    #[error("Only the host can do that")]
    NotHost,

    #[error("It is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("Need at least {need} players, have {have}")]
    NotEnoughPlayers { have: usize, need: usize },

    #[error("Room {room} is {found}, expected {expected}")]
    InvalidState {
        room: RoomCode,
        expected: Lifecycle,
        found: Lifecycle,
    },

    #[error("Room {room} cannot go from {from} to {to}")]
    IllegalTransition {
        room: RoomCode,
        from: Lifecycle,
        to: Lifecycle,
    },

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Could not find a free room code")]
    CodeSpaceExhausted,

    #[error(transparent)]
    Core(#[from] emoji_guess_core::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
