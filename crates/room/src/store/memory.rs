//! In-process room store
//!
//! Every room gets a pair of watch channels (snapshot and chat log). Writes
//! are applied to a copy of the current snapshot and published whole, so
//! subscribers never observe a half-applied write.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use emoji_guess_core::{ChatEntry, Lifecycle, Player, PlayerId, Room, RoomCode};
use tokio::sync::watch;
use tracing::debug;

use super::{ChatSubscription, RoomStore, RoomSubscription, Subscription};
use crate::error::{Error, Result};

struct RoomSlot {
    room: watch::Sender<Option<Room>>,
    chat: watch::Sender<Vec<ChatEntry>>,
}

impl RoomSlot {
    fn empty() -> Self {
        let (room, _) = watch::channel(None);
        let (chat, _) = watch::channel(Vec::new());
        Self { room, chat }
    }

    fn is_unobserved(&self) -> bool {
        self.room.receiver_count() == 0 && self.chat.receiver_count() == 0
    }

    /// No room behind it and nobody watching
    fn is_stale(&self) -> bool {
        self.room.borrow().is_none() && self.is_unobserved()
    }
}

/// Drop slots left behind by subscriptions to codes that never held a room,
/// or to rooms deleted while still observed
fn prune(slots: &mut HashMap<RoomCode, RoomSlot>) {
    let before = slots.len();
    slots.retain(|_, slot| !slot.is_stale());
    if slots.len() < before {
        debug!(pruned = before - slots.len(), "Stale room slots dropped");
    }
}

/// Room store backed by process memory
#[derive(Default)]
pub struct MemoryRoomStore {
    slots: Mutex<HashMap<RoomCode, RoomSlot>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<RoomCode, RoomSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` to a copy of the room and publish it if it succeeds
    fn modify_room<F>(&self, code: &RoomCode, change: F) -> Result<()>
    where
        F: FnOnce(&mut Room) -> Result<()>,
    {
        let slots = self.slots();
        let slot = slots
            .get(code)
            .ok_or_else(|| Error::RoomNotFound(code.clone()))?;
        let mut room = slot
            .room
            .borrow()
            .clone()
            .ok_or_else(|| Error::RoomNotFound(code.clone()))?;
        change(&mut room)?;
        slot.room.send_replace(Some(room));
        Ok(())
    }

    /// Codes of rooms that currently exist
    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.slots()
            .iter()
            .filter(|(_, slot)| slot.room.borrow().is_some())
            .map(|(code, _)| code.clone())
            .collect()
    }

    /// Live subscriptions (room and chat) attached to a code
    pub fn subscriber_count(&self, code: &RoomCode) -> usize {
        self.slots()
            .get(code)
            .map(|slot| slot.room.receiver_count() + slot.chat.receiver_count())
            .unwrap_or(0)
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots().len()
    }
}

impl RoomStore for MemoryRoomStore {
    fn get_room(&self, code: &RoomCode) -> Result<Option<Room>> {
        Ok(self
            .slots()
            .get(code)
            .and_then(|slot| slot.room.borrow().clone()))
    }

    fn subscribe_room(&self, code: &RoomCode) -> RoomSubscription {
        let mut slots = self.slots();
        prune(&mut slots);
        let slot = slots.entry(code.clone()).or_insert_with(RoomSlot::empty);
        debug!(room = %code, "Room subscription attached");
        Subscription::new(code.clone(), slot.room.subscribe())
    }

    fn subscribe_chat(&self, code: &RoomCode) -> ChatSubscription {
        let mut slots = self.slots();
        prune(&mut slots);
        let slot = slots.entry(code.clone()).or_insert_with(RoomSlot::empty);
        debug!(room = %code, "Chat subscription attached");
        Subscription::new(code.clone(), slot.chat.subscribe())
    }

    fn create_room(&self, room: &Room) -> Result<()> {
        let mut slots = self.slots();
        prune(&mut slots);
        let slot = slots
            .entry(room.room_code.clone())
            .or_insert_with(RoomSlot::empty);
        if slot.room.borrow().is_some() {
            return Err(Error::RoomExists(room.room_code.clone()));
        }
        slot.chat.send_replace(Vec::new());
        slot.room.send_replace(Some(room.clone()));
        debug!(room = %room.room_code, "Room created");
        Ok(())
    }

    fn upsert_player(&self, code: &RoomCode, player: &Player) -> Result<()> {
        self.modify_room(code, |room| {
            room.upsert_player(player.clone());
            Ok(())
        })?;
        debug!(room = %code, player = %player.id, "Player upserted");
        Ok(())
    }

    fn replace_players(&self, code: &RoomCode, players: &[Player]) -> Result<()> {
        self.modify_room(code, |room| {
            room.players = players.to_vec();
            Ok(())
        })?;
        debug!(room = %code, count = players.len(), "Roster replaced");
        Ok(())
    }

    fn update_lifecycle(&self, code: &RoomCode, state: Lifecycle) -> Result<()> {
        self.modify_room(code, |room| {
            room.state = state;
            Ok(())
        })?;
        debug!(room = %code, state = %state, "Lifecycle updated");
        Ok(())
    }

    fn update_round(&self, code: &RoomCode, round: u32) -> Result<()> {
        self.modify_room(code, |room| {
            room.current_round = round;
            Ok(())
        })
    }

    fn update_turn(
        &self,
        code: &RoomCode,
        holder: Option<&PlayerId>,
        round_start_time: i64,
    ) -> Result<()> {
        self.modify_room(code, |room| {
            room.current_turn = holder.cloned();
            room.round_start_time = round_start_time;
            Ok(())
        })?;
        debug!(room = %code, holder = ?holder, "Turn updated");
        Ok(())
    }

    fn eliminate_player(&self, code: &RoomCode, player: &PlayerId) -> Result<()> {
        self.modify_room(code, |room| match room.player_mut(player) {
            Some(p) => {
                p.is_alive = false;
                Ok(())
            }
            None => Err(Error::PlayerNotFound {
                room: code.clone(),
                player: player.clone(),
            }),
        })
    }

    fn set_winner(&self, code: &RoomCode, winner: &PlayerId) -> Result<()> {
        self.modify_room(code, |room| {
            room.winner_id = Some(winner.clone());
            Ok(())
        })
    }

    fn append_chat(&self, code: &RoomCode, entry: ChatEntry) -> Result<()> {
        let slots = self.slots();
        let slot = slots
            .get(code)
            .filter(|slot| slot.room.borrow().is_some())
            .ok_or_else(|| Error::RoomNotFound(code.clone()))?;
        slot.chat.send_modify(|log| {
            let at = log.partition_point(|e| e.timestamp <= entry.timestamp);
            log.insert(at, entry);
        });
        Ok(())
    }

    fn remove_player(&self, code: &RoomCode, player: &PlayerId) -> Result<()> {
        self.modify_room(code, |room| {
            room.remove_player(player);
            Ok(())
        })
    }

    fn delete_room(&self, code: &RoomCode) -> Result<()> {
        let mut slots = self.slots();
        if let Some(slot) = slots.get(code) {
            slot.room.send_replace(None);
            slot.chat.send_replace(Vec::new());
        }
        prune(&mut slots);
        debug!(room = %code, "Room deleted");
        Ok(())
    }
}
