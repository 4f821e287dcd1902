//! View models derived from room and chat snapshots

mod chat;
mod game;

pub use chat::{render_line, ChatViewModel};
pub use game::GameViewModel;
