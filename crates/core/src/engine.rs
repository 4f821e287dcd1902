//! Game state machine
//!
//! Pure functions over a room snapshot. Nothing here performs I/O: callers
//! hand in a snapshot (or a local copy to mutate), and persist whatever
//! changed through the room store.

use std::collections::HashMap;

use rand::Rng;

use crate::emoji::EmojiPool;
use crate::error::Result;
use crate::models::{Lifecycle, PlayerId, Room};

/// What happens after a turn is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAdvance {
    /// Hand the turn to this player
    Next(PlayerId),
    /// Every alive player had a turn; the round is over
    RoundComplete,
    /// One or zero players alive
    GameOver,
}

/// Result of ending a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The game finished, with a winner if exactly one player survived
    Finished { winner: Option<PlayerId> },
    /// A new round started
    NextRound { round: u32 },
}

/// Assign a distinct secret symbol to each alive player
pub fn assign_emojis<R: Rng + ?Sized>(
    alive: &[PlayerId],
    pool: &EmojiPool,
    rng: &mut R,
) -> Result<HashMap<PlayerId, String>> {
    pool.assign(alive, rng)
}

/// The alive player after `current` in roster order, wrapping at the end
///
/// An unknown `current` hands the turn to the first alive player.
pub fn next_turn_holder(alive: &[PlayerId], current: &PlayerId) -> Option<PlayerId> {
    match alive {
        [] => None,
        [only] => Some(only.clone()),
        _ => {
            let next = match alive.iter().position(|id| id == current) {
                Some(index) if index + 1 < alive.len() => index + 1,
                _ => 0,
            };
            Some(alive[next].clone())
        }
    }
}

/// Whether `symbol` is the guesser's secret. Unknown guessers never match.
pub fn validate_guess(room: &Room, guesser: &PlayerId, symbol: &str) -> bool {
    room.player(guesser)
        .map(|p| p.emoji == symbol)
        .unwrap_or(false)
}

/// Validate a guess and eliminate the guesser on a miss
pub fn apply_guess(room: &mut Room, guesser: &PlayerId, symbol: &str) -> bool {
    let correct = validate_guess(room, guesser, symbol);
    if !correct {
        eliminate(room, guesser);
    }
    correct
}

/// Mark a player as no longer alive. Returns false for unknown ids.
pub fn eliminate(room: &mut Room, player: &PlayerId) -> bool {
    match room.player_mut(player) {
        Some(p) => {
            p.is_alive = false;
            true
        }
        None => false,
    }
}

pub fn is_game_over(room: &Room) -> bool {
    room.alive_count() <= 1
}

/// Finish the game, crowning the sole survivor if there is one
pub fn finish(room: &mut Room) -> Option<PlayerId> {
    let alive = room.alive_ids();
    if let [winner] = alive.as_slice() {
        room.winner_id = Some(winner.clone());
    }
    room.state = Lifecycle::Finished;
    room.current_turn = None;
    room.winner_id.clone()
}

/// Whole seconds left in the current turn, never negative
pub fn remaining_time(room: &Room, now_ms: i64) -> u64 {
    let elapsed_secs = (now_ms - room.round_start_time).div_euclid(1000);
    (i64::from(room.round_duration) - elapsed_secs).max(0) as u64
}

pub fn is_turn_expired(room: &Room, now_ms: i64) -> bool {
    remaining_time(room, now_ms) == 0
}

/// Decide what follows a resolved turn
///
/// `alive_before` is the alive roster as it was when `current` took the
/// turn, so a holder eliminated by their own turn still anchors rotation.
pub fn resolve_turn(room: &Room, alive_before: &[PlayerId], current: &PlayerId) -> TurnAdvance {
    if is_game_over(room) {
        return TurnAdvance::GameOver;
    }

    let Some(current_index) = alive_before.iter().position(|id| id == current) else {
        return match room.alive_ids().into_iter().next() {
            Some(first) => TurnAdvance::Next(first),
            None => TurnAdvance::GameOver,
        };
    };

    // Only the current holder can have left the roster during their turn,
    // so the next entry in `alive_before` is still alive.
    match alive_before.get(current_index + 1) {
        Some(next) if room.player(next).is_some_and(|p| p.is_alive) => {
            TurnAdvance::Next(next.clone())
        }
        _ => TurnAdvance::RoundComplete,
    }
}

/// Start round `round`: fresh symbols, turn to the first alive player
pub fn start_round<R: Rng + ?Sized>(
    room: &mut Room,
    round: u32,
    pool: &EmojiPool,
    rng: &mut R,
    now_ms: i64,
) -> Result<()> {
    let alive = room.alive_ids();
    let assignment = assign_emojis(&alive, pool, rng)?;
    for player in room.players.iter_mut() {
        if let Some(symbol) = assignment.get(&player.id) {
            player.emoji = symbol.clone();
        }
    }

    room.current_round = round;
    room.current_turn = alive.first().cloned();
    room.round_start_time = now_ms;
    room.state = Lifecycle::InProgress;
    Ok(())
}

/// End the current round: finish the game, or move on to the next round
pub fn end_round<R: Rng + ?Sized>(
    room: &mut Room,
    pool: &EmojiPool,
    rng: &mut R,
    now_ms: i64,
) -> Result<RoundOutcome> {
    if is_game_over(room) {
        let winner = finish(room);
        return Ok(RoundOutcome::Finished { winner });
    }

    let round = room.current_round + 1;
    start_round(room, round, pool, rng, now_ms)?;
    Ok(RoundOutcome::NextRound { round })
}
