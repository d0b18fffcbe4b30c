//! Platform-wide counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals across every lottery the engine has served.
pub struct PlatformStats {
    lotteries_created: AtomicU64,
    tickets_sold: AtomicU64,
    fees_collected: AtomicU64,
    payouts_queued: AtomicU64,
    winners_paid: AtomicU64,
}

impl PlatformStats {
    pub fn new() -> Self {
        Self {
            lotteries_created: AtomicU64::new(0),
            tickets_sold: AtomicU64::new(0),
            fees_collected: AtomicU64::new(0),
            payouts_queued: AtomicU64::new(0),
            winners_paid: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_lottery_created(&self) {
        self.lotteries_created.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_ticket_sold(&self) {
        self.tickets_sold.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_fee(&self, amount: u64) {
        self.fees_collected.fetch_add(amount, Ordering::SeqCst);
    }

    pub(crate) fn record_payout_queued(&self) {
        self.payouts_queued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_winner_paid(&self) {
        self.winners_paid.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lotteries_created: self.lotteries_created.load(Ordering::SeqCst),
            tickets_sold: self.tickets_sold.load(Ordering::SeqCst),
            fees_collected: self.fees_collected.load(Ordering::SeqCst),
            payouts_queued: self.payouts_queued.load(Ordering::SeqCst),
            winners_paid: self.winners_paid.load(Ordering::SeqCst),
        }
    }
}

impl Default for PlatformStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub lotteries_created: u64,
    pub tickets_sold: u64,
    pub fees_collected: u64,
    pub payouts_queued: u64,
    pub winners_paid: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = PlatformStats::new();
        stats.record_lottery_created();
        stats.record_ticket_sold();
        stats.record_ticket_sold();
        stats.record_fee(5);
        stats.record_payout_queued();
        stats.record_winner_paid();

        let snap = stats.snapshot();
        assert_eq!(snap.lotteries_created, 1);
        assert_eq!(snap.tickets_sold, 2);
        assert_eq!(snap.fees_collected, 5);
        assert_eq!(snap.payouts_queued, 1);
        assert_eq!(snap.winners_paid, 1);
    }
}
