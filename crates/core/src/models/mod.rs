//! Data models for Emoji Guess

mod chat;
mod lifecycle;
mod player;
mod room;
mod room_code;

pub use chat::*;
pub use lifecycle::*;
pub use player::*;
pub use room::*;
pub use room_code::*;
