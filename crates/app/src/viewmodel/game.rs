//! Game view model - one player's view of the table

use emoji_guess_core::engine;
use emoji_guess_core::{EmojiPool, Lifecycle, PlayerId, PlayerView, Room};
use rand::Rng;

/// Identifies one turn: a new key means a new turn started
#[derive(Debug, Clone, PartialEq, Eq)]
struct TurnKey {
    round: u32,
    holder: PlayerId,
    started_at: i64,
}

/// What a player sees and may do
pub struct GameViewModel {
    viewer: PlayerId,
    round: u32,
    players: Vec<PlayerView>,
    turn: Option<TurnKey>,
    remaining_secs: u64,
    options: Vec<String>,
    selected: Option<String>,
    submitted: bool,
    winner_name: Option<String>,
}

impl GameViewModel {
    pub fn new(viewer: PlayerId) -> Self {
        Self {
            viewer,
            round: 0,
            players: Vec::new(),
            turn: None,
            remaining_secs: 0,
            options: Vec::new(),
            selected: None,
            submitted: false,
            winner_name: None,
        }
    }

    /// Refresh from a room snapshot
    ///
    /// Returns true when a new turn has just started for the viewer, in which
    /// case a fresh option grid has been drawn.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        room: &Room,
        pool: &EmojiPool,
        option_count: usize,
        rng: &mut R,
        now_ms: i64,
    ) -> bool {
        self.round = room.current_round;
        self.players = PlayerView::for_viewer(room, &self.viewer);
        self.remaining_secs = engine::remaining_time(room, now_ms);
        self.winner_name = room
            .winner_id
            .as_ref()
            .and_then(|w| room.player(w))
            .map(|p| p.name.clone());

        let key = match (&room.state, &room.current_turn) {
            (Lifecycle::InProgress, Some(holder)) => Some(TurnKey {
                round: room.current_round,
                holder: holder.clone(),
                started_at: room.round_start_time,
            }),
            _ => None,
        };
        if key == self.turn {
            return false;
        }

        self.turn = key;
        self.selected = None;
        self.submitted = false;
        self.options.clear();

        if !self.is_my_turn() {
            return false;
        }
        match room.player(&self.viewer) {
            Some(me) => {
                self.options = pool.options(option_count, &me.emoji, rng);
                true
            }
            None => false,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn players(&self) -> &[PlayerView] {
        &self.players
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn winner_name(&self) -> Option<&str> {
        self.winner_name.as_deref()
    }

    pub fn is_my_turn(&self) -> bool {
        self.turn.as_ref().is_some_and(|t| t.holder == self.viewer)
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Highlight an option. Only symbols from the current grid are accepted.
    pub fn select(&mut self, symbol: &str) -> bool {
        if !self.is_my_turn() || self.submitted || !self.options.iter().any(|o| o == symbol) {
            return false;
        }
        self.selected = Some(symbol.to_string());
        true
    }

    pub fn confirm_enabled(&self) -> bool {
        self.is_my_turn() && !self.submitted && self.selected.is_some()
    }

    /// Take the selected symbol for submission. At most once per turn.
    pub fn confirm(&mut self) -> Option<String> {
        if !self.confirm_enabled() {
            return None;
        }
        self.submitted = true;
        self.selected.take()
    }
}
