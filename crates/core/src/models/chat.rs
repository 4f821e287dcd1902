//! Chat entry model for room chat

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PlayerId;

/// A chat entry in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub id: String,
    #[serde(rename = "playerId")]
    pub sender_id: PlayerId,
    #[serde(rename = "playerName")]
    pub sender_name: String,
    pub text: String,
    /// Epoch millis
    pub timestamp: i64,
    /// Posted by the game itself (joins, eliminations, round changes)
    #[serde(default)]
    pub system: bool,
}

impl ChatEntry {
    pub fn new(sender_id: PlayerId, sender_name: String, text: String, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id,
            sender_name,
            text,
            timestamp,
            system: false,
        }
    }

    pub fn system(text: String, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id: PlayerId::default(),
            sender_name: String::new(),
            text,
            timestamp,
            system: true,
        }
    }
}
