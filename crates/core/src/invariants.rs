//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible room states during development.
//! These checks are compiled out in release builds.

use std::collections::HashSet;

use crate::models::{Lifecycle, Room};

/// Validate that a room snapshot is internally consistent
pub fn assert_room_invariants(room: &Room) {
    assert_unique_players(room);
    assert_single_host(room);
    assert_turn_holder_alive(room);
    assert_winner_valid(room);
    if matches!(room.state, Lifecycle::InProgress | Lifecycle::RoundEnd) {
        assert_distinct_symbols(room);
    }
}

/// Player ids must be unique within a room
pub fn assert_unique_players(room: &Room) {
    let mut seen = HashSet::new();
    for player in &room.players {
        debug_assert!(
            seen.insert(&player.id),
            "Room {} lists player {} twice",
            room.room_code,
            player.id
        );
    }
}

/// Exactly one player carries the host flag, and it is the room's host
pub fn assert_single_host(room: &Room) {
    let hosts: Vec<_> = room.players.iter().filter(|p| p.is_host).collect();
    debug_assert!(
        hosts.len() == 1,
        "Room {} has {} hosts, expected 1",
        room.room_code,
        hosts.len()
    );
    debug_assert!(
        hosts.iter().all(|p| p.id == room.host_id),
        "Room {} host flag does not match host id {}",
        room.room_code,
        room.host_id
    );
}

/// Alive players hold pairwise distinct symbols
pub fn assert_distinct_symbols(room: &Room) {
    let alive = room.alive_players();
    let symbols: HashSet<_> = alive.iter().map(|p| p.emoji.as_str()).collect();
    debug_assert!(
        symbols.len() == alive.len(),
        "Room {} round {} has repeated symbols",
        room.room_code,
        room.current_round
    );
}

/// A turn holder, if any, must be alive
pub fn assert_turn_holder_alive(room: &Room) {
    if let Some(holder) = &room.current_turn {
        debug_assert!(
            room.player(holder).is_some_and(|p| p.is_alive),
            "Room {} turn holder {} is not an alive player",
            room.room_code,
            holder
        );
    }
}

/// A winner only exists in a finished room with exactly that player alive
pub fn assert_winner_valid(room: &Room) {
    if let Some(winner) = &room.winner_id {
        debug_assert!(
            room.state == Lifecycle::Finished,
            "Room {} has winner {} but state is {}",
            room.room_code,
            winner,
            room.state
        );
        debug_assert!(
            room.alive_ids() == [winner.clone()],
            "Room {} winner {} is not the sole survivor",
            room.room_code,
            winner
        );
    }
}
