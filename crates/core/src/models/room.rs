//! Room model - one game session

use serde::{Deserialize, Deserializer, Serialize};

use super::lifecycle::lifecycle_or_waiting;
use super::{Lifecycle, Player, PlayerId, RoomCode};
use crate::error::Result;

/// Default seconds a turn lasts
pub const DEFAULT_ROUND_DURATION_SECS: u32 = 30;

/// A room as stored in the room store
///
/// The roster is kept in join order. Turn rotation follows that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_code: RoomCode,
    #[serde(default)]
    pub host_id: PlayerId,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default, deserialize_with = "lifecycle_or_waiting")]
    pub state: Lifecycle,
    #[serde(default)]
    pub current_round: u32,
    #[serde(
        rename = "currentTurnPlayerId",
        default,
        deserialize_with = "empty_as_none"
    )]
    pub current_turn: Option<PlayerId>,
    /// Epoch millis when the current turn started
    #[serde(default)]
    pub round_start_time: i64,
    /// Seconds
    #[serde(default = "default_round_duration")]
    pub round_duration: u32,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub winner_id: Option<PlayerId>,
}

fn default_round_duration() -> u32 {
    DEFAULT_ROUND_DURATION_SECS
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<PlayerId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|id| !id.is_empty()).map(PlayerId::new))
}

impl Room {
    /// Create a room in the lobby with the host as its only player
    pub fn new(room_code: RoomCode, host_id: PlayerId, host_name: String) -> Self {
        Self {
            room_code,
            host_id: host_id.clone(),
            players: vec![Player::host(host_id, host_name)],
            state: Lifecycle::Waiting,
            current_round: 0,
            current_turn: None,
            round_start_time: 0,
            round_duration: DEFAULT_ROUND_DURATION_SECS,
            winner_id: None,
        }
    }

    pub fn with_round_duration(mut self, seconds: u32) -> Self {
        self.round_duration = seconds;
        self
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.player(id).is_some()
    }

    /// Alive players in roster order
    pub fn alive_players(&self) -> Vec<&Player> {
        self.players.iter().filter(|p| p.is_alive).collect()
    }

    /// Ids of alive players in roster order
    pub fn alive_ids(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_alive)
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_alive).count()
    }

    pub fn host(&self) -> Option<&Player> {
        self.player(&self.host_id)
    }

    pub fn is_host(&self, id: &PlayerId) -> bool {
        &self.host_id == id
    }

    /// Insert a player at the end of the roster, or replace the record with the same id in place
    pub fn upsert_player(&mut self, player: Player) {
        match self.player_mut(&player.id) {
            Some(existing) => *existing = player,
            None => self.players.push(player),
        }
    }

    pub fn remove_player(&mut self, id: &PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| &p.id == id)?;
        Some(self.players.remove(index))
    }

    /// Serialize to the store's JSON record shape
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode a store record, filling defaults for missing fields
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
