//! Cook progress notifications over a tokio broadcast channel.

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::cook_time::CookTime;
use crate::state_machine::CookRecord;

/// Something observable that happened during a cook session.
#[derive(Debug, Clone, PartialEq)]
pub enum CookEvent {
    Started {
        session_id: Uuid,
        remaining: CookTime,
        heat_rate: f64,
    },
    /// One second of cooking elapsed.
    Tick {
        session_id: Uuid,
        remaining: CookTime,
        /// Food temperature after this tick, if there is food inside.
        temperature: Option<f64>,
    },
    Finished(CookRecord),
}

/// In-process bus for [`CookEvent`]s.
///
/// Publishing succeeds even when nobody is subscribed (the event is
/// dropped). Slow subscribers lag and lose old events rather than blocking
/// the countdown.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CookEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<CookEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: CookEvent) {
        // Only fails when there are no receivers.
        let _ = self.sender.send(event);
    }
}
