//! Room store interface
//!
//! The store is the external, authoritative home of room and chat records.
//! Other clients read and write it concurrently. Everything else in the
//! workspace goes through this trait.

use emoji_guess_core::{ChatEntry, Lifecycle, Player, PlayerId, Room, RoomCode};

use super::{ChatSubscription, RoomSubscription};
use crate::error::Result;

/// Reads, live subscriptions and field-level writes on room records
pub trait RoomStore: Send + Sync {
    /// Fetch the current snapshot of a room
    fn get_room(&self, code: &RoomCode) -> Result<Option<Room>>;

    /// Live room snapshots; `None` while the room does not exist
    fn subscribe_room(&self, code: &RoomCode) -> RoomSubscription;

    /// Live chat log, ordered by timestamp
    fn subscribe_chat(&self, code: &RoomCode) -> ChatSubscription;

    /// Create a room record. Fails if the code is taken.
    fn create_room(&self, room: &Room) -> Result<()>;

    /// Insert or replace one player record
    fn upsert_player(&self, code: &RoomCode, player: &Player) -> Result<()>;

    /// Replace the whole roster
    fn replace_players(&self, code: &RoomCode, players: &[Player]) -> Result<()>;

    fn update_lifecycle(&self, code: &RoomCode, state: Lifecycle) -> Result<()>;

    fn update_round(&self, code: &RoomCode, round: u32) -> Result<()>;

    /// Set the turn holder and the turn start timestamp together
    fn update_turn(
        &self,
        code: &RoomCode,
        holder: Option<&PlayerId>,
        round_start_time: i64,
    ) -> Result<()>;

    /// Clear one player's alive flag
    fn eliminate_player(&self, code: &RoomCode, player: &PlayerId) -> Result<()>;

    fn set_winner(&self, code: &RoomCode, winner: &PlayerId) -> Result<()>;

    fn append_chat(&self, code: &RoomCode, entry: ChatEntry) -> Result<()>;

    /// Remove a player record. Unknown players are ignored.
    fn remove_player(&self, code: &RoomCode, player: &PlayerId) -> Result<()>;

    /// Delete the room record and its chat log
    fn delete_room(&self, code: &RoomCode) -> Result<()>;
}
