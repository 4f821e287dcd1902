//! Game coordinator - the authoritative orchestrator for rooms
//!
//! Reads a room snapshot from the store, runs the state machine on a local
//! copy, and writes the proposed values back field by field. Mutating
//! operations on one room are serialized behind a per-room lock so the
//! turn watchdog and player guesses never interleave.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use emoji_guess_core::engine::{self, RoundOutcome, TurnAdvance};
use emoji_guess_core::{
    invariants, ChatEntry, EmojiPool, GameConfig, Lifecycle, Player, PlayerId, Room, RoomCode,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument};

use crate::announce;
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::store::{ChatSubscription, RoomStore, RoomSubscription};
use crate::watchdog::TurnWatchdog;

/// Attempts at drawing an unused room code before giving up
const MAX_CODE_ATTEMPTS: usize = 16;

/// Result of a submitted guess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    pub correct: bool,
    pub advance: TurnAdvance,
}

/// Drives games by pushing state-machine results into a room store
pub struct GameCoordinator {
    store: Arc<dyn RoomStore>,
    config: GameConfig,
    pool: EmojiPool,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    room_locks: Mutex<HashMap<RoomCode, Arc<tokio::sync::Mutex<()>>>>,
}

impl GameCoordinator {
    /// Create a coordinator over `store`. The config is validated here.
    pub fn new(store: Arc<dyn RoomStore>, config: GameConfig) -> Result<Self> {
        config.validate()?;
        let pool = config.pool()?;
        Ok(Self {
            store,
            config,
            pool,
            clock: Arc::new(SystemClock),
            rng: Mutex::new(StdRng::from_entropy()),
            room_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Make symbol assignment and room codes reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn store(&self) -> &Arc<dyn RoomStore> {
        &self.store
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn pool(&self) -> &EmojiPool {
        &self.pool
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    async fn lock_room(&self, code: &RoomCode) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.room_locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(code.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    fn forget_room(&self, code: &RoomCode) {
        self.room_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(code);
    }

    fn load(&self, code: &RoomCode) -> Result<Room> {
        self.store
            .get_room(code)?
            .ok_or_else(|| Error::RoomNotFound(code.clone()))
    }

    fn announce(&self, code: &RoomCode, text: String) -> Result<()> {
        self.store
            .append_chat(code, ChatEntry::system(text, self.now_millis()))
    }

    fn expect_state(room: &Room, expected: Lifecycle) -> Result<()> {
        if room.state != expected {
            return Err(Error::InvalidState {
                room: room.room_code.clone(),
                expected,
                found: room.state,
            });
        }
        Ok(())
    }

    /// Fail unless the stored room may move to `next`
    fn check_transition(&self, code: &RoomCode, next: Lifecycle) -> Result<()> {
        let current = self.load(code)?.state;
        if !current.can_transition_to(next) {
            return Err(Error::IllegalTransition {
                room: code.clone(),
                from: current,
                to: next,
            });
        }
        Ok(())
    }

    fn advance_lifecycle(&self, code: &RoomCode, next: Lifecycle) -> Result<()> {
        self.check_transition(code, next)?;
        self.store.update_lifecycle(code, next)
    }

    /// Open a new room with `host` as its only player
    #[instrument(skip(self))]
    pub fn create_room(&self, host: &PlayerId, name: &str) -> Result<RoomCode> {
        let name = self.config.validate_name(name)?;

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = self.with_rng(|rng| RoomCode::generate(rng));
            let room = Room::new(code.clone(), host.clone(), name.clone())
                .with_round_duration(self.config.round_duration_secs);

            match self.store.create_room(&room) {
                Ok(()) => {
                    info!(room = %code, host = %host, "Room created");
                    return Ok(code);
                }
                Err(Error::RoomExists(_)) => {
                    debug!(room = %code, "Room code taken, drawing another");
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::CodeSpaceExhausted)
    }

    /// Seat a player in a lobby. Rejoining only refreshes the display name.
    #[instrument(skip(self))]
    pub async fn join_room(&self, code: &RoomCode, player: &PlayerId, name: &str) -> Result<()> {
        let name = self.config.validate_name(name)?;
        let _guard = self.lock_room(code).await;
        let room = self.load(code)?;

        if let Some(existing) = room.player(player) {
            let mut updated = existing.clone();
            updated.name = name;
            return self.store.upsert_player(code, &updated);
        }

        if room.state != Lifecycle::Waiting {
            return Err(Error::AlreadyStarted(code.clone()));
        }
        if room.players.len() >= self.config.max_players {
            return Err(Error::RoomFull(code.clone()));
        }

        self.store
            .upsert_player(code, &Player::new(player.clone(), name.clone()))?;
        self.announce(code, announce::joined(&name))?;
        info!(room = %code, player = %player, "Player joined");
        Ok(())
    }

    /// Remove a player. The host leaving closes the room.
    #[instrument(skip(self))]
    pub async fn leave_room(&self, code: &RoomCode, player: &PlayerId) -> Result<()> {
        let _guard = self.lock_room(code).await;
        let room = self.load(code)?;
        let Some(leaver) = room.player(player).cloned() else {
            return Ok(());
        };

        let mut after = room.clone();
        after.remove_player(player);
        if leaver.is_host || after.players.is_empty() {
            self.store.delete_room(code)?;
            self.forget_room(code);
            info!(room = %code, "Room closed");
            return Ok(());
        }

        let holds_turn = room.current_turn.as_ref() == Some(player);
        let in_play = room.state == Lifecycle::InProgress;
        let advance = if in_play && (holds_turn || engine::is_game_over(&after)) {
            Some(engine::resolve_turn(&after, &room.alive_ids(), player))
        } else {
            None
        };
        if let (true, Some(advance)) = (holds_turn, &advance) {
            self.hand_off_turn(code, &room, advance)?;
        }

        self.store.remove_player(code, player)?;
        self.announce(code, announce::left(&leaver.name))?;
        info!(room = %code, player = %player, "Player left");

        if let Some(advance) = advance {
            self.settle(code, &advance).await?;
        }
        Ok(())
    }

    /// Delete a room and its chat. Host only.
    #[instrument(skip(self))]
    pub fn delete_room(&self, code: &RoomCode, requester: &PlayerId) -> Result<()> {
        let room = self.load(code)?;
        if !room.is_host(requester) {
            return Err(Error::NotHost);
        }
        self.store.delete_room(code)?;
        self.forget_room(code);
        info!(room = %code, "Room deleted");
        Ok(())
    }

    /// Start the game: pre-roll, then the first round
    #[instrument(skip(self))]
    pub async fn start_game(&self, code: &RoomCode, requester: &PlayerId) -> Result<()> {
        let _guard = self.lock_room(code).await;
        let room = self.load(code)?;

        if !room.is_host(requester) {
            return Err(Error::NotHost);
        }
        Self::expect_state(&room, Lifecycle::Waiting)?;

        let have = room.players.len();
        if have < self.config.min_players {
            return Err(Error::NotEnoughPlayers {
                have,
                need: self.config.min_players,
            });
        }
        if have > self.pool.len() {
            return Err(emoji_guess_core::Error::InsufficientSymbols {
                requested: have,
                available: self.pool.len(),
            }
            .into());
        }

        self.advance_lifecycle(code, Lifecycle::Starting)?;
        self.announce(code, announce::game_started())?;
        info!(room = %code, players = have, "Game starting");

        tokio::time::sleep(Duration::from_millis(self.config.start_delay_ms)).await;

        let mut room = self.load(code)?;
        Self::expect_state(&room, Lifecycle::Starting)?;
        let now = self.now_millis();
        self.with_rng(|rng| engine::start_round(&mut room, 1, &self.pool, rng, now))?;
        self.persist_round(code, &room)?;
        self.announce(code, announce::new_round(1))?;
        info!(room = %code, "Round 1 started");
        Ok(())
    }

    /// Resolve the turn holder's guess
    #[instrument(skip(self))]
    pub async fn submit_guess(
        &self,
        code: &RoomCode,
        guesser: &PlayerId,
        symbol: &str,
    ) -> Result<GuessOutcome> {
        let _guard = self.lock_room(code).await;
        let mut room = self.load(code)?;
        Self::expect_state(&room, Lifecycle::InProgress)?;
        if room.current_turn.as_ref() != Some(guesser) {
            return Err(Error::NotYourTurn(guesser.clone()));
        }

        let alive_before = room.alive_ids();
        let correct = engine::apply_guess(&mut room, guesser, symbol);
        let advance = engine::resolve_turn(&room, &alive_before, guesser);

        self.hand_off_turn(code, &room, &advance)?;
        if !correct {
            self.store.eliminate_player(code, guesser)?;
            if let Some(p) = room.player(guesser) {
                self.announce(code, announce::eliminated(&p.name))?;
            }
        }
        info!(room = %code, guesser = %guesser, correct, advance = ?advance, "Guess resolved");

        self.settle(code, &advance).await?;
        Ok(GuessOutcome { correct, advance })
    }

    /// Eliminate the turn holder if their time ran out
    ///
    /// Returns the eliminated player, or `None` when nothing expired.
    pub async fn expire_turn(&self, code: &RoomCode) -> Result<Option<PlayerId>> {
        let _guard = self.lock_room(code).await;
        let mut room = self.load(code)?;
        if room.state != Lifecycle::InProgress {
            return Ok(None);
        }
        let Some(holder) = room.current_turn.clone() else {
            return Ok(None);
        };
        if !engine::is_turn_expired(&room, self.now_millis()) {
            return Ok(None);
        }

        let alive_before = room.alive_ids();
        engine::eliminate(&mut room, &holder);
        let advance = engine::resolve_turn(&room, &alive_before, &holder);

        self.hand_off_turn(code, &room, &advance)?;
        self.store.eliminate_player(code, &holder)?;
        if let Some(p) = room.player(&holder) {
            self.announce(code, announce::timed_out(&p.name))?;
        }
        info!(room = %code, player = %holder, "Turn expired");

        self.settle(code, &advance).await?;
        Ok(Some(holder))
    }

    /// End the current round and either finish or start the next one
    pub async fn end_round(&self, code: &RoomCode) -> Result<RoundOutcome> {
        let _guard = self.lock_room(code).await;
        self.end_round_locked(code).await
    }

    /// Move the turn off the current holder before they are eliminated or
    /// removed. A round that is over keeps no holder.
    fn hand_off_turn(&self, code: &RoomCode, room: &Room, advance: &TurnAdvance) -> Result<()> {
        match advance {
            TurnAdvance::Next(next) => {
                self.store
                    .update_turn(code, Some(next), self.now_millis())?;
                debug!(room = %code, next = %next, "Turn passed");
            }
            TurnAdvance::RoundComplete | TurnAdvance::GameOver => {
                self.store.update_turn(code, None, room.round_start_time)?;
            }
        }
        Ok(())
    }

    async fn settle(&self, code: &RoomCode, advance: &TurnAdvance) -> Result<()> {
        match advance {
            TurnAdvance::Next(_) => Ok(()),
            TurnAdvance::RoundComplete | TurnAdvance::GameOver => {
                self.end_round_locked(code).await.map(|_| ())
            }
        }
    }

    async fn end_round_locked(&self, code: &RoomCode) -> Result<RoundOutcome> {
        let room = self.load(code)?;
        Self::expect_state(&room, Lifecycle::InProgress)?;
        let holder_gone = room
            .current_turn
            .as_ref()
            .is_some_and(|h| !room.player(h).is_some_and(|p| p.is_alive));
        if holder_gone {
            self.store.update_turn(code, None, room.round_start_time)?;
        }
        self.advance_lifecycle(code, Lifecycle::RoundEnd)?;

        tokio::time::sleep(Duration::from_millis(self.config.round_end_delay_ms)).await;

        let mut room = self.load(code)?;
        Self::expect_state(&room, Lifecycle::RoundEnd)?;
        let now = self.now_millis();
        let outcome = self.with_rng(|rng| engine::end_round(&mut room, &self.pool, rng, now))?;

        match &outcome {
            RoundOutcome::Finished { winner } => {
                invariants::assert_room_invariants(&room);
                self.store.update_turn(code, None, room.round_start_time)?;
                self.advance_lifecycle(code, Lifecycle::Finished)?;
                if let Some(winner) = winner {
                    self.store.set_winner(code, winner)?;
                }

                let text = match winner.as_ref().and_then(|w| room.player(w)) {
                    Some(p) => announce::winner(&p.name),
                    None => announce::no_winner(),
                };
                self.announce(code, text)?;
                info!(room = %code, winner = ?winner, "Game finished");
            }
            RoundOutcome::NextRound { round } => {
                self.persist_round(code, &room)?;
                self.announce(code, announce::new_round(*round))?;
                info!(room = %code, round, "Round started");
            }
        }

        Ok(outcome)
    }

    /// Write a freshly started round back to the store
    fn persist_round(&self, code: &RoomCode, room: &Room) -> Result<()> {
        invariants::assert_room_invariants(room);
        self.check_transition(code, room.state)?;
        self.store.replace_players(code, &room.players)?;
        self.store.update_round(code, room.current_round)?;
        self.store
            .update_turn(code, room.current_turn.as_ref(), room.round_start_time)?;
        self.store.update_lifecycle(code, room.state)?;
        Ok(())
    }

    /// Post a player's chat message
    pub fn send_message(&self, code: &RoomCode, sender: &PlayerId, text: &str) -> Result<ChatEntry> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let room = self.load(code)?;
        let player = room.player(sender).ok_or_else(|| Error::PlayerNotFound {
            room: code.clone(),
            player: sender.clone(),
        })?;

        let entry = ChatEntry::new(
            sender.clone(),
            player.name.clone(),
            text.to_string(),
            self.now_millis(),
        );
        self.store.append_chat(code, entry.clone())?;
        Ok(entry)
    }

    pub fn observe_room(&self, code: &RoomCode) -> RoomSubscription {
        self.store.subscribe_room(code)
    }

    pub fn observe_chat(&self, code: &RoomCode) -> ChatSubscription {
        self.store.subscribe_chat(code)
    }

    /// Start the background task that eliminates players who run out of time
    pub fn spawn_turn_watchdog(self: &Arc<Self>, code: RoomCode) -> TurnWatchdog {
        TurnWatchdog::spawn(Arc::clone(self), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryRoomStore;

    const START: i64 = 1_700_000_000_000;

    struct Table {
        store: Arc<MemoryRoomStore>,
        clock: Arc<ManualClock>,
        coordinator: Arc<GameCoordinator>,
        code: RoomCode,
        ids: Vec<PlayerId>,
    }

    fn fast_config() -> GameConfig {
        GameConfig {
            start_delay_ms: 0,
            round_end_delay_ms: 0,
            turn_check_interval_ms: 5,
            ..GameConfig::default()
        }
    }

    async fn table_with(config: GameConfig, names: &[&str]) -> Table {
        let store = Arc::new(MemoryRoomStore::new());
        let clock = Arc::new(ManualClock::new(START));
        let coordinator = GameCoordinator::new(store.clone(), config)
            .unwrap()
            .with_clock(clock.clone())
            .with_seed(11);

        let ids: Vec<PlayerId> = names.iter().map(|n| PlayerId::new(n.to_lowercase())).collect();
        let code = coordinator.create_room(&ids[0], names[0]).unwrap();
        for (id, name) in ids.iter().zip(names).skip(1) {
            coordinator.join_room(&code, id, name).await.unwrap();
        }

        Table {
            store,
            clock,
            coordinator: Arc::new(coordinator),
            code,
            ids,
        }
    }

    async fn table(names: &[&str]) -> Table {
        table_with(fast_config(), names).await
    }

    impl Table {
        fn room(&self) -> Room {
            self.store.get_room(&self.code).unwrap().unwrap()
        }

        fn chat_texts(&self) -> Vec<String> {
            self.store
                .subscribe_chat(&self.code)
                .current()
                .into_iter()
                .map(|e| e.text)
                .collect()
        }

        fn secret_of(&self, id: &PlayerId) -> String {
            self.room().player(id).unwrap().emoji.clone()
        }

        async fn start(&self) {
            self.coordinator
                .start_game(&self.code, &self.ids[0])
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_create_room_seats_host() {
        let t = table(&["Alice"]).await;
        let room = t.room();
        assert_eq!(room.players.len(), 1);
        assert!(room.players[0].is_host);
        assert_eq!(room.round_duration, 30);
        assert_eq!(room.state, Lifecycle::Waiting);
    }

    #[tokio::test]
    async fn test_create_room_rejects_short_name() {
        let t = table(&["Alice"]).await;
        let err = t
            .coordinator
            .create_room(&PlayerId::new("x"), "X")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(emoji_guess_core::Error::InvalidPlayerName(_))
        ));
    }

    #[tokio::test]
    async fn test_join_room_rules() {
        let config = GameConfig {
            max_players: 2,
            ..fast_config()
        };
        let t = table_with(config, &["Alice", "Bob"]).await;

        let err = t
            .coordinator
            .join_room(&t.code, &PlayerId::new("carl"), "Carl")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RoomFull(_)));

        t.coordinator
            .join_room(&t.code, &t.ids[1], "Bobby")
            .await
            .unwrap();
        assert_eq!(t.room().players[1].name, "Bobby");
        assert!(t.chat_texts().contains(&"Bob joined the game".to_string()));

        let missing = RoomCode::parse("ZZZZZZ").unwrap();
        assert!(matches!(
            t.coordinator
                .join_room(&missing, &PlayerId::new("d"), "Dana")
                .await,
            Err(Error::RoomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_join_after_start_rejected() {
        let t = table(&["Alice", "Bob"]).await;
        t.start().await;
        let err = t
            .coordinator
            .join_room(&t.code, &PlayerId::new("late"), "Late")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyStarted(_)));
    }

    #[tokio::test]
    async fn test_start_game_guards() {
        let t = table(&["Alice"]).await;
        let err = t
            .coordinator
            .start_game(&t.code, &t.ids[0])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotEnoughPlayers { have: 1, need: 2 }));

        t.coordinator
            .join_room(&t.code, &PlayerId::new("bob"), "Bob")
            .await
            .unwrap();
        let err = t
            .coordinator
            .start_game(&t.code, &PlayerId::new("bob"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotHost));
    }

    #[tokio::test]
    async fn test_start_game_insufficient_symbols() {
        let config = GameConfig {
            symbols: Some(vec!["🐼".to_string(), "🦊".to_string()]),
            ..fast_config()
        };
        let t = table_with(config, &["Alice", "Bob", "Carl"]).await;
        let err = t
            .coordinator
            .start_game(&t.code, &t.ids[0])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Core(emoji_guess_core::Error::InsufficientSymbols {
                requested: 3,
                available: 2
            })
        ));
        assert_eq!(t.room().state, Lifecycle::Waiting);
    }

    #[tokio::test]
    async fn test_start_game_begins_round_one() {
        let t = table(&["Alice", "Bob", "Carl"]).await;
        t.start().await;

        let room = t.room();
        assert_eq!(room.state, Lifecycle::InProgress);
        assert_eq!(room.current_round, 1);
        assert_eq!(room.current_turn, Some(t.ids[0].clone()));
        assert_eq!(room.round_start_time, START);
        invariants::assert_room_invariants(&room);
        assert!(room.players.iter().all(|p| t.coordinator.pool().contains(&p.emoji)));

        let chat = t.chat_texts();
        assert_eq!(chat, vec![
            "Bob joined the game".to_string(),
            "Carl joined the game".to_string(),
            "The game has started!".to_string(),
            "New round! Round 1".to_string(),
        ]);
    }

    #[tokio::test]
    async fn test_guess_out_of_turn() {
        let t = table(&["Alice", "Bob"]).await;
        t.start().await;
        let err = t
            .coordinator
            .submit_guess(&t.code, &t.ids[1], "🐼")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotYourTurn(_)));
    }

    #[tokio::test]
    async fn test_guess_before_start() {
        let t = table(&["Alice", "Bob"]).await;
        let err = t
            .coordinator
            .submit_guess(&t.code, &t.ids[0], "🐼")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                expected: Lifecycle::InProgress,
                found: Lifecycle::Waiting,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_correct_guesses_rotate_then_new_round() {
        let t = table(&["Alice", "Bob", "Carl"]).await;
        t.start().await;

        for (i, id) in t.ids.iter().enumerate() {
            t.clock.advance(1_000);
            let secret = t.secret_of(id);
            let outcome = t
                .coordinator
                .submit_guess(&t.code, id, &secret)
                .await
                .unwrap();
            assert!(outcome.correct);
            match t.ids.get(i + 1) {
                Some(next) => {
                    assert_eq!(outcome.advance, TurnAdvance::Next(next.clone()));
                    assert_eq!(t.room().current_turn.as_ref(), Some(next));
                    assert_eq!(t.room().round_start_time, t.clock.now_millis());
                }
                None => assert_eq!(outcome.advance, TurnAdvance::RoundComplete),
            }
        }

        let room = t.room();
        assert_eq!(room.current_round, 2);
        assert_eq!(room.state, Lifecycle::InProgress);
        assert_eq!(room.current_turn, Some(t.ids[0].clone()));
        assert_eq!(room.alive_count(), 3);
        assert!(t.chat_texts().contains(&"New round! Round 2".to_string()));
    }

    #[tokio::test]
    async fn test_elimination_to_winner() {
        let t = table(&["Alice", "Bob", "Carl"]).await;
        t.start().await;
        let (a, b, c) = (&t.ids[0], &t.ids[1], &t.ids[2]);

        let outcome = t
            .coordinator
            .submit_guess(&t.code, a, "not-a-symbol")
            .await
            .unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.advance, TurnAdvance::Next(b.clone()));
        let room = t.room();
        assert_eq!(room.alive_ids(), vec![b.clone(), c.clone()]);
        assert!(!engine::is_game_over(&room));

        let outcome = t
            .coordinator
            .submit_guess(&t.code, b, "not-a-symbol")
            .await
            .unwrap();
        assert_eq!(outcome.advance, TurnAdvance::GameOver);

        let room = t.room();
        assert_eq!(room.state, Lifecycle::Finished);
        assert_eq!(room.winner_id, Some(c.clone()));
        assert_eq!(room.current_turn, None);

        let chat = t.chat_texts();
        assert!(chat.contains(&"Alice was eliminated".to_string()));
        assert!(chat.contains(&"Bob was eliminated".to_string()));
        assert_eq!(chat.last().unwrap(), "Carl has won the game!");
    }

    #[tokio::test]
    async fn test_last_in_order_eliminated_starts_new_round() {
        let t = table(&["Alice", "Bob", "Carl"]).await;
        t.start().await;
        for id in &t.ids[..2] {
            let secret = t.secret_of(id);
            t.coordinator.submit_guess(&t.code, id, &secret).await.unwrap();
        }
        let outcome = t
            .coordinator
            .submit_guess(&t.code, &t.ids[2], "not-a-symbol")
            .await
            .unwrap();
        assert_eq!(outcome.advance, TurnAdvance::RoundComplete);

        let room = t.room();
        assert_eq!(room.current_round, 2);
        assert_eq!(room.alive_ids(), vec![t.ids[0].clone(), t.ids[1].clone()]);
        assert_eq!(room.current_turn, Some(t.ids[0].clone()));
    }

    #[tokio::test]
    async fn test_expire_turn() {
        let t = table(&["Alice", "Bob", "Carl"]).await;
        t.start().await;

        t.clock.advance(29_000);
        assert_eq!(t.coordinator.expire_turn(&t.code).await.unwrap(), None);

        t.clock.advance(1_000);
        let expired = t.coordinator.expire_turn(&t.code).await.unwrap();
        assert_eq!(expired, Some(t.ids[0].clone()));

        let room = t.room();
        assert!(!room.player(&t.ids[0]).unwrap().is_alive);
        assert_eq!(room.current_turn, Some(t.ids[1].clone()));
        assert_eq!(room.round_start_time, t.clock.now_millis());
        assert!(t
            .chat_texts()
            .contains(&"Alice ran out of time and was eliminated".to_string()));
    }

    #[tokio::test]
    async fn test_turn_holder_leaving_passes_turn() {
        let t = table(&["Alice", "Bob", "Carl"]).await;
        t.start().await;
        let secret = t.secret_of(&t.ids[0]);
        t.coordinator
            .submit_guess(&t.code, &t.ids[0], &secret)
            .await
            .unwrap();

        t.coordinator.leave_room(&t.code, &t.ids[1]).await.unwrap();
        let room = t.room();
        assert_eq!(room.players.len(), 2);
        assert_eq!(room.current_turn, Some(t.ids[2].clone()));
        assert!(t.chat_texts().contains(&"Bob left the game".to_string()));
    }

    #[tokio::test]
    async fn test_host_leaving_closes_room() {
        let t = table(&["Alice", "Bob"]).await;
        t.coordinator.leave_room(&t.code, &t.ids[0]).await.unwrap();
        assert!(t.store.get_room(&t.code).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_room_host_only() {
        let t = table(&["Alice", "Bob"]).await;
        assert!(matches!(
            t.coordinator.delete_room(&t.code, &t.ids[1]),
            Err(Error::NotHost)
        ));
        t.coordinator.delete_room(&t.code, &t.ids[0]).unwrap();
        assert!(t.store.get_room(&t.code).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_send_message() {
        let t = table(&["Alice", "Bob"]).await;
        let entry = t
            .coordinator
            .send_message(&t.code, &t.ids[1], "  hola  ")
            .unwrap();
        assert_eq!(entry.text, "hola");
        assert_eq!(entry.sender_name, "Bob");
        assert!(!entry.system);

        assert!(matches!(
            t.coordinator.send_message(&t.code, &t.ids[1], "   "),
            Err(Error::EmptyMessage)
        ));
        assert!(matches!(
            t.coordinator
                .send_message(&t.code, &PlayerId::new("ghost"), "hi"),
            Err(Error::PlayerNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_observe_room_sees_start() {
        let t = table(&["Alice", "Bob"]).await;
        let mut sub = t.coordinator.observe_room(&t.code);
        let first = sub.next().await.unwrap().unwrap();
        assert_eq!(first.state, Lifecycle::Waiting);

        t.start().await;
        let latest = sub.next().await.unwrap().unwrap();
        assert_eq!(latest.state, Lifecycle::InProgress);
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn test_watchdog_eliminates_idle_player() {
        let t = table(&["Alice", "Bob", "Carl"]).await;
        t.start().await;
        let watchdog = t.coordinator.spawn_turn_watchdog(t.code.clone());

        t.clock.advance(31_000);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let room = t.room();
        assert!(!room.player(&t.ids[0]).unwrap().is_alive);
        assert_eq!(room.current_turn, Some(t.ids[1].clone()));

        watchdog.shutdown();
        watchdog.join().await;
    }

    #[tokio::test]
    async fn test_last_opponent_leaving_crowns_winner() {
        let t = table(&["Alice", "Bob", "Carl"]).await;
        t.start().await;
        let (a, b, c) = (&t.ids[0], &t.ids[1], &t.ids[2]);

        let secret = t.secret_of(a);
        t.coordinator.submit_guess(&t.code, a, &secret).await.unwrap();
        t.coordinator
            .submit_guess(&t.code, b, "not-a-symbol")
            .await
            .unwrap();
        let secret = t.secret_of(c);
        let outcome = t.coordinator.submit_guess(&t.code, c, &secret).await.unwrap();
        assert_eq!(outcome.advance, TurnAdvance::RoundComplete);

        let room = t.room();
        assert_eq!(room.current_round, 2);
        assert_eq!(room.current_turn.as_ref(), Some(a));
        assert_eq!(room.alive_ids(), vec![a.clone(), c.clone()]);

        // Carl never held the turn; his leaving still ends the game
        t.coordinator.leave_room(&t.code, c).await.unwrap();

        let room = t.room();
        assert_eq!(room.state, Lifecycle::Finished);
        assert_eq!(room.winner_id.as_ref(), Some(a));
        assert_eq!(room.current_turn, None);
        invariants::assert_room_invariants(&room);

        let chat = t.chat_texts();
        assert!(chat.contains(&"Carl left the game".to_string()));
        assert_eq!(chat.last().unwrap(), "Alice has won the game!");
    }

    #[tokio::test]
    async fn test_round_end_pause_has_no_eliminated_holder() {
        let config = GameConfig {
            round_end_delay_ms: 300,
            ..fast_config()
        };
        let t = table_with(config, &["Alice", "Bob", "Carl"]).await;
        t.start().await;
        for id in &t.ids[..2] {
            let secret = t.secret_of(id);
            t.coordinator.submit_guess(&t.code, id, &secret).await.unwrap();
        }

        let coordinator = t.coordinator.clone();
        let (code, carl) = (t.code.clone(), t.ids[2].clone());
        let miss = tokio::spawn(async move {
            coordinator.submit_guess(&code, &carl, "not-a-symbol").await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let paused = t.room();
        assert_eq!(paused.state, Lifecycle::RoundEnd);
        assert!(!paused.player(&t.ids[2]).unwrap().is_alive);
        assert_eq!(paused.current_turn, None);
        invariants::assert_room_invariants(&paused);

        let outcome = miss.await.unwrap().unwrap();
        assert_eq!(outcome.advance, TurnAdvance::RoundComplete);
        let room = t.room();
        assert_eq!(room.state, Lifecycle::InProgress);
        assert_eq!(room.current_round, 2);
        assert_eq!(room.current_turn, Some(t.ids[0].clone()));
    }

    #[tokio::test]
    async fn test_lifecycle_only_moves_forward() {
        let t = table(&["Alice", "Bob"]).await;
        t.start().await;

        let err = t
            .coordinator
            .advance_lifecycle(&t.code, Lifecycle::Waiting)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::IllegalTransition {
                from: Lifecycle::InProgress,
                to: Lifecycle::Waiting,
                ..
            }
        ));
        assert!(matches!(
            t.coordinator.advance_lifecycle(&t.code, Lifecycle::Finished),
            Err(Error::IllegalTransition { .. })
        ));
        assert_eq!(t.room().state, Lifecycle::InProgress);

        t.coordinator
            .submit_guess(&t.code, &t.ids[0], "not-a-symbol")
            .await
            .unwrap();
        assert_eq!(t.room().state, Lifecycle::Finished);

        let err = t
            .coordinator
            .advance_lifecycle(&t.code, Lifecycle::InProgress)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::IllegalTransition {
                from: Lifecycle::Finished,
                to: Lifecycle::InProgress,
                ..
            }
        ));
        assert_eq!(t.room().state, Lifecycle::Finished);
        assert!(t.coordinator.end_round(&t.code).await.is_err());
    }

    #[tokio::test]
    async fn test_join_waits_for_room_lock() {
        let t = table(&["Alice", "Bob"]).await;
        let guard = t.coordinator.lock_room(&t.code).await;

        let coordinator = t.coordinator.clone();
        let code = t.code.clone();
        let join = tokio::spawn(async move {
            coordinator
                .join_room(&code, &PlayerId::new("carl"), "Carl")
                .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!join.is_finished());
        assert_eq!(t.room().players.len(), 2);

        drop(guard);
        join.await.unwrap().unwrap();
        assert_eq!(t.room().players.len(), 3);
    }

    #[tokio::test]
    async fn test_join_during_pre_roll_rejected() {
        let config = GameConfig {
            start_delay_ms: 100,
            ..fast_config()
        };
        let t = table_with(config, &["Alice", "Bob"]).await;

        let coordinator = t.coordinator.clone();
        let (code, host) = (t.code.clone(), t.ids[0].clone());
        let start = tokio::spawn(async move { coordinator.start_game(&code, &host).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(t.room().state, Lifecycle::Starting);

        let err = t
            .coordinator
            .join_room(&t.code, &PlayerId::new("late"), "Late")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyStarted(_)));
        start.await.unwrap().unwrap();

        let room = t.room();
        assert_eq!(room.state, Lifecycle::InProgress);
        assert_eq!(room.players.len(), 2);
        assert!(room.players.iter().all(|p| !p.emoji.is_empty()));
        invariants::assert_room_invariants(&room);
    }

    /// Memory store that checks the room after every write
    #[derive(Default)]
    struct CheckedStore {
        inner: MemoryRoomStore,
        writes: Mutex<Vec<(&'static str, Lifecycle)>>,
    }

    impl CheckedStore {
        fn record<T>(&self, op: &'static str, code: &RoomCode, result: Result<T>) -> Result<T> {
            if let Ok(Some(room)) = self.inner.get_room(code) {
                invariants::assert_room_invariants(&room);
                self.writes.lock().unwrap().push((op, room.state));
            }
            result
        }

        fn position(&self, op: &str, state: Lifecycle) -> usize {
            self.writes
                .lock()
                .unwrap()
                .iter()
                .position(|(o, s)| *o == op && *s == state)
                .unwrap()
        }
    }

    impl RoomStore for CheckedStore {
        fn get_room(&self, code: &RoomCode) -> Result<Option<Room>> {
            self.inner.get_room(code)
        }

        fn subscribe_room(&self, code: &RoomCode) -> RoomSubscription {
            self.inner.subscribe_room(code)
        }

        fn subscribe_chat(&self, code: &RoomCode) -> ChatSubscription {
            self.inner.subscribe_chat(code)
        }

        fn create_room(&self, room: &Room) -> Result<()> {
            let result = self.inner.create_room(room);
            self.record("create_room", &room.room_code, result)
        }

        fn upsert_player(&self, code: &RoomCode, player: &Player) -> Result<()> {
            self.record("upsert_player", code, self.inner.upsert_player(code, player))
        }

        fn replace_players(&self, code: &RoomCode, players: &[Player]) -> Result<()> {
            self.record("replace_players", code, self.inner.replace_players(code, players))
        }

        fn update_lifecycle(&self, code: &RoomCode, state: Lifecycle) -> Result<()> {
            self.record("update_lifecycle", code, self.inner.update_lifecycle(code, state))
        }

        fn update_round(&self, code: &RoomCode, round: u32) -> Result<()> {
            self.record("update_round", code, self.inner.update_round(code, round))
        }

        fn update_turn(
            &self,
            code: &RoomCode,
            holder: Option<&PlayerId>,
            round_start_time: i64,
        ) -> Result<()> {
            let result = self.inner.update_turn(code, holder, round_start_time);
            self.record("update_turn", code, result)
        }

        fn eliminate_player(&self, code: &RoomCode, player: &PlayerId) -> Result<()> {
            self.record("eliminate_player", code, self.inner.eliminate_player(code, player))
        }

        fn set_winner(&self, code: &RoomCode, winner: &PlayerId) -> Result<()> {
            self.record("set_winner", code, self.inner.set_winner(code, winner))
        }

        fn append_chat(&self, code: &RoomCode, entry: ChatEntry) -> Result<()> {
            self.inner.append_chat(code, entry)
        }

        fn remove_player(&self, code: &RoomCode, player: &PlayerId) -> Result<()> {
            self.record("remove_player", code, self.inner.remove_player(code, player))
        }

        fn delete_room(&self, code: &RoomCode) -> Result<()> {
            self.inner.delete_room(code)
        }
    }

    #[tokio::test]
    async fn test_every_write_leaves_a_consistent_room() {
        let store = Arc::new(CheckedStore::default());
        let clock = Arc::new(ManualClock::new(START));
        let coordinator = GameCoordinator::new(store.clone(), fast_config())
            .unwrap()
            .with_clock(clock.clone())
            .with_seed(11);
        let (a, b, c) = (PlayerId::new("alice"), PlayerId::new("bob"), PlayerId::new("carl"));
        let code = coordinator.create_room(&a, "Alice").unwrap();
        coordinator.join_room(&code, &b, "Bob").await.unwrap();
        coordinator.join_room(&code, &c, "Carl").await.unwrap();
        coordinator.start_game(&code, &a).await.unwrap();
        let secret = |id: &PlayerId| {
            store.get_room(&code).unwrap().unwrap().player(id).unwrap().emoji.clone()
        };

        // Carl misses last in round one, Bob times out in round two
        coordinator.submit_guess(&code, &a, &secret(&a)).await.unwrap();
        coordinator.submit_guess(&code, &b, &secret(&b)).await.unwrap();
        coordinator
            .submit_guess(&code, &c, "not-a-symbol")
            .await
            .unwrap();
        coordinator.submit_guess(&code, &a, &secret(&a)).await.unwrap();
        clock.advance(31_000);
        assert_eq!(coordinator.expire_turn(&code).await.unwrap(), Some(b.clone()));

        let room = store.get_room(&code).unwrap().unwrap();
        assert_eq!(room.state, Lifecycle::Finished);
        assert_eq!(room.winner_id, Some(a));

        let finished = store.position("update_lifecycle", Lifecycle::Finished);
        let winner = store.position("set_winner", Lifecycle::Finished);
        assert!(finished < winner);
    }
}
