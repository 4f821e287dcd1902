//! Emoji Guess Core Library
//!
//! Room and player models, the emoji pool, and the pure game state machine.

pub mod config;
pub mod emoji;
pub mod engine;
pub mod error;
pub mod invariants;
pub mod models;
pub mod projection;

pub use config::{ConfigError, GameConfig};
pub use emoji::EmojiPool;
pub use engine::{RoundOutcome, TurnAdvance};
pub use error::{Error, Result};
pub use models::*;
pub use projection::{ChatLine, LobbyEntry, PlayerView};
