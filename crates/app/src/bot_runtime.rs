//! Bot runtime - seats bot players at a table and plays their turns
//!
//! Each bot runs as its own task. It watches the room like any client would,
//! keeps a `GameViewModel`, and when a turn comes up it thinks for a while,
//! picks a symbol from the grid and submits it.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use emoji_guess_core::{PlayerId, RoomCode};
use emoji_guess_room::{Error as RoomError, GameCoordinator};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::state::TableConfig;
use crate::viewmodel::GameViewModel;

/// A seated bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotPlayer {
    pub id: PlayerId,
    pub name: String,
}

/// Bot runtime - manages bots and their tasks
pub struct BotRuntime {
    coordinator: Arc<GameCoordinator>,
    table: TableConfig,
    bots: Vec<BotPlayer>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl BotRuntime {
    pub fn new(coordinator: Arc<GameCoordinator>, table: TableConfig) -> Self {
        let bots = (0..table.bots)
            .map(|i| BotPlayer {
                id: PlayerId::anonymous(),
                name: table.bot_name(i),
            })
            .collect();
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            coordinator,
            table,
            bots,
            tasks: Vec::new(),
            shutdown_tx,
        }
    }

    /// The bot that creates the room and starts the game
    pub fn host(&self) -> Option<&BotPlayer> {
        self.bots.first()
    }

    /// Create a room hosted by the first bot and seat the others
    pub async fn seat(&self) -> Result<RoomCode> {
        let mut bots = self.bots.iter();
        let Some(host) = bots.next() else {
            return Err(crate::error::Error::NotEnoughBots {
                have: 0,
                need: self.coordinator.config().min_players,
            });
        };

        let code = self.coordinator.create_room(&host.id, &host.name)?;
        for bot in bots {
            self.coordinator.join_room(&code, &bot.id, &bot.name).await?;
        }
        tracing::info!(room = %code, bots = self.bots.len(), "Table seated");
        Ok(code)
    }

    /// Start one task per bot
    pub fn spawn(&mut self, code: &RoomCode) {
        for (index, bot) in self.bots.iter().enumerate() {
            let rng = match self.table.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
                None => StdRng::from_entropy(),
            };
            let seat = Seat {
                coordinator: self.coordinator.clone(),
                bot: bot.clone(),
                code: code.clone(),
                think_ms: self.table.think_min_ms..=self.table.think_max_ms,
                accuracy: self.table.accuracy,
                rng,
            };
            self.tasks
                .push(tokio::spawn(play(seat, self.shutdown_tx.subscribe())));
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for every bot task to exit
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!("Bot task panicked: {}", e);
            }
        }
    }
}

struct Seat {
    coordinator: Arc<GameCoordinator>,
    bot: BotPlayer,
    code: RoomCode,
    think_ms: RangeInclusive<u64>,
    accuracy: f64,
    rng: StdRng,
}

async fn play(mut seat: Seat, mut shutdown_rx: broadcast::Receiver<()>) {
    let coordinator = seat.coordinator.clone();
    let mut room_sub = coordinator.observe_room(&seat.code);
    let mut view = GameViewModel::new(seat.bot.id.clone());

    loop {
        let snapshot = tokio::select! {
            snapshot = room_sub.next() => snapshot,
            _ = shutdown_rx.recv() => break,
        };
        let Some(Some(room)) = snapshot else {
            tracing::debug!(bot = %seat.bot.name, "Room gone, bot leaving");
            break;
        };

        let new_turn = view.apply(
            &room,
            coordinator.pool(),
            coordinator.config().emoji_options,
            &mut seat.rng,
            coordinator.now_millis(),
        );
        if room.state.is_terminal() {
            if let Some(winner) = view.winner_name() {
                tracing::debug!(bot = %seat.bot.name, winner, "Bot saw the game end");
            }
            break;
        }
        if !new_turn {
            continue;
        }
        tracing::debug!(
            bot = %seat.bot.name,
            round = view.round(),
            remaining_secs = view.remaining_secs(),
            seats = view.players().len(),
            "Bot's turn"
        );

        let think = seat.rng.gen_range(seat.think_ms.clone());
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(think)) => {}
            _ = shutdown_rx.recv() => break,
        }

        // Bots know their own symbol; accuracy decides whether they use it
        let secret = room
            .player(&seat.bot.id)
            .map(|p| p.emoji.clone())
            .unwrap_or_default();
        if let Some(choice) = pick_guess(view.options(), &secret, seat.accuracy, &mut seat.rng) {
            view.select(&choice);
        }
        let Some(guess) = view.confirm() else {
            continue;
        };

        match coordinator.submit_guess(&seat.code, &seat.bot.id, &guess).await {
            Ok(outcome) => tracing::debug!(
                bot = %seat.bot.name,
                correct = outcome.correct,
                "Bot guessed"
            ),
            Err(RoomError::NotYourTurn(_)) | Err(RoomError::InvalidState { .. }) => {
                tracing::debug!(bot = %seat.bot.name, "Turn moved on before the guess landed");
            }
            Err(e) => tracing::warn!(bot = %seat.bot.name, error = %e, "Bot guess rejected"),
        }
    }

    room_sub.unsubscribe();
}

/// Choose a symbol from the grid, naming `secret` with probability `accuracy`
fn pick_guess<R: Rng + ?Sized>(
    options: &[String],
    secret: &str,
    accuracy: f64,
    rng: &mut R,
) -> Option<String> {
    let has_secret = options.iter().any(|o| o == secret);
    if has_secret && rng.gen_bool(accuracy) {
        return Some(secret.to_string());
    }
    options
        .iter()
        .filter(|o| *o != secret)
        .choose(rng)
        .or_else(|| options.first())
        .cloned()
}
