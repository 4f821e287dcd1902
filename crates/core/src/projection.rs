//! Read-only projections of a room for individual consumers

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::models::{ChatEntry, PlayerId, Room};

/// Shown in place of the viewer's own secret
pub const HIDDEN_SYMBOL: &str = "?";

/// One seat at the table as a particular viewer sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub display_name: String,
    pub visible_emoji: String,
    pub is_current_turn: bool,
    pub is_self: bool,
    pub is_eliminated: bool,
}

impl PlayerView {
    /// Project the whole roster for `viewer`, in roster order
    ///
    /// Everyone sees every secret except their own while they are still in
    /// the game.
    pub fn for_viewer(room: &Room, viewer: &PlayerId) -> Vec<PlayerView> {
        room.players
            .iter()
            .map(|p| {
                let is_self = &p.id == viewer;
                let visible_emoji = if p.emoji.is_empty() || (is_self && p.is_alive) {
                    HIDDEN_SYMBOL.to_string()
                } else {
                    p.emoji.clone()
                };
                PlayerView {
                    id: p.id.clone(),
                    display_name: p.name.clone(),
                    visible_emoji,
                    is_current_turn: room.current_turn.as_ref() == Some(&p.id),
                    is_self,
                    is_eliminated: !p.is_alive,
                }
            })
            .collect()
    }
}

/// Lobby listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyEntry {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
}

impl LobbyEntry {
    pub fn list(room: &Room) -> Vec<LobbyEntry> {
        room.players
            .iter()
            .map(|p| LobbyEntry {
                id: p.id.clone(),
                name: p.name.clone(),
                is_host: p.is_host,
            })
            .collect()
    }
}

/// Chat entry ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatLine {
    pub id: String,
    pub sender_name: String,
    pub text: String,
    pub timestamp: i64,
    pub is_system: bool,
}

impl ChatLine {
    pub fn format_timestamp(&self) -> String {
        Local
            .timestamp_millis_opt(self.timestamp)
            .single()
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default()
    }
}

impl From<&ChatEntry> for ChatLine {
    fn from(entry: &ChatEntry) -> Self {
        Self {
            id: entry.id.clone(),
            sender_name: entry.sender_name.clone(),
            text: entry.text.clone(),
            timestamp: entry.timestamp,
            is_system: entry.system,
        }
    }
}
