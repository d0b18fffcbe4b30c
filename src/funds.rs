//! Escrow primitives.
//!
//! [`Funds`] is a move-only wrapper over a balance: value is created once at
//! the host boundary via [`Funds::mint`] and from then on only moves between
//! pools through `split`, `merge` and `take_all`. Nothing on a ledger path is
//! silently dropped; a zero-valued drop loses nothing by definition.
//!
//! Third-party settlements (creator income after a win, unsold refunds) leave
//! the core through a [`PayoutSink`]. The default sink, [`PayoutQueue`],
//! queues payouts for an external settlement collaborator to drain.

use crate::errors::{LedgerResult, LotteryError};
use crate::lottery::{Address, LotteryId};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// A pool of escrowed value. Not `Clone`: value moves, it is never copied.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub struct Funds(u64);

impl Funds {
    /// An empty pool.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Create value. This is the host boundary: the embedder mints funds to
    /// mirror an external deposit, the core only moves them afterwards.
    pub fn mint(amount: u64) -> Self {
        Self(amount)
    }

    pub fn amount(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Split `amount` out of this pool into a new one.
    pub fn split(&mut self, amount: u64) -> LedgerResult<Funds> {
        if amount > self.0 {
            return Err(LotteryError::InsufficientFunds {
                available: self.0,
                requested: amount,
            });
        }
        self.0 -= amount;
        Ok(Funds(amount))
    }

    /// Merge another pool into this one.
    pub fn merge(&mut self, other: Funds) {
        self.0 += other.0;
    }

    /// Drain this pool, leaving it empty.
    pub fn take_all(&mut self) -> Funds {
        Funds(std::mem::take(&mut self.0))
    }
}

/// Why a payout left the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutReason {
    /// Ticket income owed to the creator after a winner was paid.
    CreatorIncome,
    /// Bonus plus income refunded to the creator of an unsold or unclaimed
    /// lottery.
    UnsoldRefund,
}

/// A settlement leaving the core for delivery to a third party.
#[derive(Debug)]
pub struct Payout {
    pub lottery_id: LotteryId,
    pub recipient: Address,
    pub funds: Funds,
    pub reason: PayoutReason,
}

/// Delivery seam for settlements addressed to parties other than the caller.
///
/// The engine returns prizes, change and withdrawals to the caller directly;
/// everything else goes through this sink.
pub trait PayoutSink: Send + Sync {
    fn deliver(&self, payout: Payout);
}

/// Default sink: queues payouts for an external transport collaborator.
pub struct PayoutQueue {
    queue: Mutex<Vec<Payout>>,
}

impl PayoutQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Take all queued payouts. The caller becomes responsible for delivery.
    pub fn drain(&self) -> Vec<Payout> {
        std::mem::take(&mut *self.queue.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total value currently queued.
    pub fn queued_amount(&self) -> u64 {
        self.queue
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.funds.amount())
            .sum()
    }
}

impl Default for PayoutQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PayoutSink for PayoutQueue {
    fn deliver(&self, payout: Payout) {
        self.queue.lock().unwrap().push(payout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_merge_conserve_value() {
        let mut pool = Funds::mint(100);
        let part = pool.split(30).unwrap();
        assert_eq!(pool.amount(), 70);
        assert_eq!(part.amount(), 30);

        pool.merge(part);
        assert_eq!(pool.amount(), 100);
    }

    #[test]
    fn test_split_beyond_balance_fails() {
        let mut pool = Funds::mint(10);
        let err = pool.split(11).unwrap_err();
        assert_eq!(
            err,
            LotteryError::InsufficientFunds {
                available: 10,
                requested: 11
            }
        );
        // Pool untouched by the failed split.
        assert_eq!(pool.amount(), 10);
    }

    #[test]
    fn test_take_all_empties_pool() {
        let mut pool = Funds::mint(42);
        let taken = pool.take_all();
        assert_eq!(taken.amount(), 42);
        assert!(pool.is_zero());
    }

    #[test]
    fn test_payout_queue_drain() {
        let queue = PayoutQueue::new();
        queue.deliver(Payout {
            lottery_id: LotteryId::fresh(),
            recipient: Address::new("creator"),
            funds: Funds::mint(50),
            reason: PayoutReason::CreatorIncome,
        });
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.queued_amount(), 50);

        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        assert!(queue.is_empty());
        assert_eq!(drained[0].funds.amount(), 50);
    }
}
