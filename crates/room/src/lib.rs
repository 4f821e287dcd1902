//! Emoji Guess Room Library
//!
//! Shared room state and the coordinator that drives games through it.
//!
//! # Architecture
//!
//! - **Store**: Holds room snapshots and chat logs, pushes every change to subscribers
//! - **Coordinator**: Validates player actions and writes state-machine results to the store
//! - **Watchdog**: Background task that eliminates players whose turn timer ran out
//!
//! # Usage
//!
//! ```ignore
//! let store = Arc::new(MemoryRoomStore::new());
//! let coordinator = Arc::new(GameCoordinator::new(store, GameConfig::default())?);
//!
//! let code = coordinator.create_room(&host_id, "Alice")?;
//! coordinator.join_room(&code, &guest_id, "Bob").await?;
//! let watchdog = coordinator.spawn_turn_watchdog(code.clone());
//! coordinator.start_game(&code, &host_id).await?;
//!
//! let mut room = coordinator.observe_room(&code);
//! while let Some(Some(snapshot)) = room.next().await {
//!     // render snapshot
//! }
//! ```

pub mod announce;
pub mod clock;
pub mod coordinator;
pub mod error;
pub mod store;
pub mod watchdog;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{GameCoordinator, GuessOutcome};
pub use error::{Error, Result};
pub use store::{ChatSubscription, MemoryRoomStore, RoomStore, RoomSubscription, Subscription};
pub use watchdog::TurnWatchdog;
