//! Lottery entity and ticket stub capability.

use crate::clock::Epoch;
use crate::funds::Funds;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Participant address. Opaque to the core; the embedder decides its shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique lottery identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotteryId(Uuid);

impl LotteryId {
    /// Allocate a fresh identifier.
    pub(crate) fn fresh() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for LotteryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the close transition should do for a lottery right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseAction {
    /// Close condition not met; the lottery stays open.
    NotClosable,
    /// Tickets were sold: draw a winner and freeze the code.
    Announce,
    /// Nothing was ever sold: refund the bonus to the creator instead.
    RefundCreator,
}

/// One lottery: its identity, escrow pools, timing and outcome.
///
/// Lives in the registry from creation until destruction; destruction settles
/// every escrowed value, so a removed lottery never holds funds.
#[derive(Debug)]
pub struct Lottery {
    pub(crate) id: LotteryId,
    pub(crate) name: String,
    pub(crate) creator: Address,
    pub(crate) price: u64,
    pub(crate) total_amount: u64,
    pub(crate) remaining_amount: u64,
    pub(crate) bonus: Funds,
    pub(crate) income: Funds,
    pub(crate) end_epoch: Epoch,
    pub(crate) announcement: bool,
    pub(crate) winner_code: Vec<u8>,
    /// Seed drawn at announcement, retained so anyone can re-derive the
    /// winning index from public data.
    pub(crate) audit_seed: Option<[u8; 32]>,
}

impl Lottery {
    pub(crate) fn new(
        id: LotteryId,
        name: String,
        creator: Address,
        price: u64,
        total_amount: u64,
        bonus: Funds,
        end_epoch: Epoch,
    ) -> Self {
        Self {
            id,
            name,
            creator,
            price,
            total_amount,
            remaining_amount: total_amount,
            bonus,
            income: Funds::zero(),
            end_epoch,
            announcement: false,
            winner_code: Vec::new(),
            audit_seed: None,
        }
    }

    pub(crate) fn tickets_sold(&self) -> u64 {
        self.total_amount - self.remaining_amount
    }

    /// Sale is over once time runs out or every ticket is sold.
    pub(crate) fn close_condition_met(&self, now: Epoch) -> bool {
        now > self.end_epoch || self.remaining_amount == 0
    }

    /// Pure close decision; effects are applied by the engine per entry point.
    /// Only meaningful while `announcement` is false.
    pub(crate) fn close_action(&self, now: Epoch) -> CloseAction {
        if !self.close_condition_met(now) {
            CloseAction::NotClosable
        } else if self.tickets_sold() == 0 {
            CloseAction::RefundCreator
        } else {
            CloseAction::Announce
        }
    }

    /// Cloned public view for listing collaborators.
    pub fn snapshot(&self) -> LotterySnapshot {
        LotterySnapshot {
            id: self.id,
            name: self.name.clone(),
            creator: self.creator.clone(),
            price: self.price,
            total_amount: self.total_amount,
            remaining_amount: self.remaining_amount,
            bonus: self.bonus.amount(),
            income: self.income.amount(),
            end_epoch: self.end_epoch,
            announcement: self.announcement,
            winner_code: if self.winner_code.is_empty() {
                None
            } else {
                Some(hex::encode(&self.winner_code))
            },
        }
    }
}

/// Capability token proving one ticket purchase.
///
/// Not `Clone` and not constructible outside the crate: minted only by a
/// purchase, consumed by move on redemption. Its code is fixed at mint time
/// and never mutated.
#[derive(Debug)]
pub struct TicketStub {
    lottery_id: LotteryId,
    code: Vec<u8>,
}

impl TicketStub {
    pub(crate) fn mint(lottery_id: LotteryId, code: Vec<u8>) -> Self {
        Self { lottery_id, code }
    }

    pub fn lottery_id(&self) -> LotteryId {
        self.lottery_id
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn code_hex(&self) -> String {
        hex::encode(&self.code)
    }
}

/// Read-only public view of a lottery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotterySnapshot {
    pub id: LotteryId,
    pub name: String,
    pub creator: Address,
    pub price: u64,
    pub total_amount: u64,
    pub remaining_amount: u64,
    pub bonus: u64,
    pub income: u64,
    pub end_epoch: Epoch,
    pub announcement: bool,
    /// Hex-encoded winner code; present exactly when announced.
    pub winner_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_lottery(total: u64, end_epoch: Epoch) -> Lottery {
        Lottery::new(
            LotteryId::fresh(),
            "test".to_string(),
            Address::new("creator"),
            10,
            total,
            Funds::mint(100),
            end_epoch,
        )
    }

    #[test]
    fn test_close_action_open() {
        let lottery = open_lottery(5, 20);
        assert_eq!(lottery.close_action(10), CloseAction::NotClosable);
        assert_eq!(lottery.close_action(20), CloseAction::NotClosable);
    }

    #[test]
    fn test_close_action_expired_without_sales_refunds() {
        let lottery = open_lottery(5, 20);
        assert_eq!(lottery.close_action(21), CloseAction::RefundCreator);
    }

    #[test]
    fn test_close_action_expired_with_sales_announces() {
        let mut lottery = open_lottery(5, 20);
        lottery.remaining_amount = 3;
        assert_eq!(lottery.close_action(21), CloseAction::Announce);
    }

    #[test]
    fn test_close_action_sellout_announces_before_expiry() {
        let mut lottery = open_lottery(5, 20);
        lottery.remaining_amount = 0;
        assert_eq!(lottery.close_action(1), CloseAction::Announce);
    }

    #[test]
    fn test_snapshot_hides_empty_winner_code() {
        let mut lottery = open_lottery(5, 20);
        assert!(lottery.snapshot().winner_code.is_none());

        lottery.announcement = true;
        lottery.winner_code = vec![0xab; 32];
        let snap = lottery.snapshot();
        assert_eq!(snap.winner_code.as_deref(), Some(hex::encode([0xab; 32]).as_str()));
    }
}
