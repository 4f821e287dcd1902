//! Player model

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque player identity as issued by the identity backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh id for a player with no account
    pub fn anonymous() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A player seated in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Secret symbol for the current round (empty before the first round)
    pub emoji: String,
    pub is_alive: bool,
    pub is_host: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            emoji: String::new(),
            is_alive: true,
            is_host: false,
        }
    }

    pub fn host(id: PlayerId, name: String) -> Self {
        Self {
            is_host: true,
            ..Self::new(id, name)
        }
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = emoji.into();
        self
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(PlayerId::default(), String::new())
    }
}
