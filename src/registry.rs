//! Shared mutable root: the lottery map and the platform fee pool.
//!
//! The keyed map gives per-lottery isolation: every operation addresses a
//! single lottery by identifier and holds that entry's guard for its whole
//! critical section, so concurrent calls against distinct lotteries never
//! contend and partial effects are never visible. Same-key serialization is
//! the map's shard lock, matching the transactional substrate the ledger
//! model assumes.

use crate::errors::{LedgerResult, LotteryError};
use crate::funds::Funds;
use crate::lottery::{Lottery, LotteryId, LotterySnapshot};
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::sync::Mutex;

/// Unforgeable capability required to withdraw platform fees.
///
/// Only `Registry::new` can create one; holding it is the access check.
pub struct OperatorCap(());

/// The process-wide ledger root. Created once, lives for the process.
pub struct Registry {
    lotteries: DashMap<LotteryId, Lottery>,
    fee_pool: Mutex<Funds>,
}

impl Registry {
    /// Create the registry and the operator's withdrawal capability.
    pub fn new() -> (Self, OperatorCap) {
        let registry = Self {
            lotteries: DashMap::new(),
            fee_pool: Mutex::new(Funds::zero()),
        };
        (registry, OperatorCap(()))
    }

    pub(crate) fn insert(&self, lottery: Lottery) {
        self.lotteries.insert(lottery.id, lottery);
    }

    /// Exclusive guard over one lottery entry.
    pub(crate) fn lottery_mut(
        &self,
        id: &LotteryId,
    ) -> Option<RefMut<'_, LotteryId, Lottery>> {
        self.lotteries.get_mut(id)
    }

    /// Atomically remove a lottery when `pred` still holds, handing ownership
    /// to the caller for settlement.
    pub(crate) fn remove_if(
        &self,
        id: &LotteryId,
        pred: impl FnOnce(&Lottery) -> bool,
    ) -> Option<Lottery> {
        self.lotteries.remove_if(id, |_, l| pred(l)).map(|(_, l)| l)
    }

    pub(crate) fn remove(&self, id: &LotteryId) -> Option<Lottery> {
        self.lotteries.remove(id).map(|(_, l)| l)
    }

    /// Merge a skimmed fee into the platform pool.
    pub(crate) fn pool_fee(&self, fee: Funds) {
        self.fee_pool.lock().unwrap().merge(fee);
    }

    /// Drain the fee pool; fails if it is empty.
    pub(crate) fn withdraw_fees(&self) -> LedgerResult<Funds> {
        let mut pool = self.fee_pool.lock().unwrap();
        if pool.is_zero() {
            return Err(LotteryError::NoIncome);
        }
        Ok(pool.take_all())
    }

    pub fn fee_pool_amount(&self) -> u64 {
        self.fee_pool.lock().unwrap().amount()
    }

    pub fn lottery_count(&self) -> usize {
        self.lotteries.len()
    }

    pub fn contains(&self, id: &LotteryId) -> bool {
        self.lotteries.contains_key(id)
    }

    /// Read-only view of one lottery.
    pub fn snapshot(&self, id: &LotteryId) -> Option<LotterySnapshot> {
        self.lotteries.get(id).map(|l| l.snapshot())
    }

    /// Read-only views of every live lottery, in no particular order.
    pub fn snapshots(&self) -> Vec<LotterySnapshot> {
        self.lotteries.iter().map(|l| l.snapshot()).collect()
    }
}
