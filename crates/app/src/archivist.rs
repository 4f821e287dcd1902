//! Archivist - writes finished games to the data directory
//!
//! One JSON file per game: the final room record in its wire shape plus the
//! chat log as it was displayed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use emoji_guess_core::{ChatLine, Room};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Archived game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameArchive {
    pub archived_at: DateTime<Utc>,
    pub room: serde_json::Value,
    pub chat: Vec<ArchivedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedLine {
    pub time: String,
    pub sender: Option<String>,
    pub text: String,
}

impl From<&ChatLine> for ArchivedLine {
    fn from(line: &ChatLine) -> Self {
        Self {
            time: line.format_timestamp(),
            sender: (!line.is_system).then(|| line.sender_name.clone()),
            text: line.text.clone(),
        }
    }
}

impl GameArchive {
    pub fn new(room: &Room, chat: &[ChatLine]) -> Result<Self> {
        Ok(Self {
            archived_at: Utc::now(),
            room: room.to_json()?,
            chat: chat.iter().map(ArchivedLine::from).collect(),
        })
    }

    /// Decode the archived room record
    pub fn room(&self) -> Result<Room> {
        Ok(Room::from_json(self.room.clone())?)
    }

    fn file_name(&self, room: &Room) -> String {
        format!(
            "GAME_{}_{}.json",
            room.room_code,
            self.archived_at.format("%Y%m%d-%H%M%S")
        )
    }

    /// Write the archive under `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let room = self.room()?;
        let path = dir.join(self.file_name(&room));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        tracing::info!(path = %path.display(), "Game archived");
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
