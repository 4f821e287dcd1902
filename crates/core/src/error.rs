//! Error types for Emoji Guess Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not enough symbols: {requested} requested, {available} available")]
    InsufficientSymbols { requested: usize, available: usize },

    #[error("Duplicate symbol in pool: {0}")]
    DuplicateSymbol(String),

    #[error("Symbol pool is empty")]
    EmptyPool,

    #[error("Invalid room code: {0}")]
    InvalidRoomCode(String),

    #[error("Invalid player name: {0}")]
    InvalidPlayerName(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
