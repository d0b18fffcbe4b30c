//! Notifications published on lottery state transitions.
//!
//! Events are informational only: the core never depends on a subscriber
//! existing, and a send with no receivers is not an error. Transport and
//! indexing collaborators subscribe and forward however they like.

use crate::clock::Epoch;
use crate::lottery::{Address, LotteryId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Hint text: a purchase or redemption arrived after the sale closed.
pub const NOTICE_ENDED: &str = "lottery ended";
/// Hint text: redemption triggered the drawing; resubmit the stub.
pub const NOTICE_JUST_DRAWN: &str = "winner just drawn, submit again";
/// Hint text: the stub's code did not match the winner code.
pub const NOTICE_NOT_WINNER: &str = "not a winner";
/// Hint text: the lottery was already settled and removed.
pub const NOTICE_EXPIRED: &str = "no prize, redemption period expired";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LotteryEvent {
    Created {
        id: LotteryId,
        name: String,
        price: u64,
        total_amount: u64,
        end_epoch: Epoch,
        bonus: u64,
    },
    TicketSold {
        id: LotteryId,
        buyer: Address,
        index: u64,
        remaining: u64,
    },
    WinnerAnnounced {
        id: LotteryId,
        name: String,
        /// Hex-encoded winner code.
        winner_code: String,
        /// Hex-encoded announcement seed, published for post-hoc verification.
        seed: String,
    },
    Notice {
        id: LotteryId,
        text: String,
    },
}

impl LotteryEvent {
    /// JSON encoding offered to transport collaborators.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("event serialization cannot fail")
    }
}

/// Broadcast bus for [`LotteryEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LotteryEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LotteryEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn publish(&self, event: LotteryEvent) {
        // No subscribers is fine; events are informational.
        let _ = self.sender.send(event);
    }
}
