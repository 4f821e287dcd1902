//! Room store boundary and live subscriptions

mod memory;
mod traits;

use emoji_guess_core::{ChatEntry, Room, RoomCode};
use tokio::sync::watch;
use tracing::debug;

pub use memory::MemoryRoomStore;
pub use traits::RoomStore;

/// Live room snapshots
pub type RoomSubscription = Subscription<Option<Room>>;

/// Live chat log
pub type ChatSubscription = Subscription<Vec<ChatEntry>>;

/// A cancellable stream of values published by the store
///
/// The first call to [`Subscription::next`] yields the current value right
/// away. Later calls wait for a change and yield the latest value, so bursts
/// of writes may be observed as a single update. Dropping the subscription
/// (or calling [`Subscription::unsubscribe`]) detaches it from the store.
pub struct Subscription<T> {
    code: RoomCode,
    rx: watch::Receiver<T>,
    primed: bool,
}

impl<T: Clone> Subscription<T> {
    pub(crate) fn new(code: RoomCode, rx: watch::Receiver<T>) -> Self {
        Self {
            code,
            rx,
            primed: false,
        }
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.code
    }

    /// Wait for the next value. `None` once the store has gone away.
    pub async fn next(&mut self) -> Option<T> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }

        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Latest value without waiting
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Detach from the store
    pub fn unsubscribe(self) {
        debug!(room = %self.code, "Unsubscribed");
    }
}
