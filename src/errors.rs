//! Error types for the lottery ledger.
//!
//! Every failure here is synchronous and caller-visible: a failed precondition
//! aborts the triggering call with no partial state change. Redemption aborts
//! that must hand the ticket stub back to the caller use [`RedeemRejected`],
//! which carries the unconsumed stub.

use crate::lottery::{LotteryId, TicketStub};

/// Result alias used throughout the crate.
pub type LedgerResult<T> = Result<T, LotteryError>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LotteryError {
    #[error("platform fee pool is empty")]
    NoIncome,

    #[error("unknown lottery {0}")]
    UnknownLottery(LotteryId),

    #[error("lottery is already announced")]
    AlreadyAnnounced,

    #[error("lottery close condition not yet met")]
    NotYetClosable,

    #[error("bonus not redeemable before the grace period elapses")]
    NotRedeemable,

    #[error("lottery bonus must be positive")]
    InvalidBonus,

    #[error("payment {payment} is below ticket price {price}")]
    InsufficientPayment { payment: u64, price: u64 },

    #[error("lottery is still open, close condition not yet met")]
    NotOpenForRedemption,

    #[error("insufficient funds: {available} available, {requested} requested")]
    InsufficientFunds { available: u64, requested: u64 },
}

/// Redemption abort that returns the unconsumed stub to its owner.
///
/// `redeem_lottery` consumes the stub by move; when the call must fail without
/// consuming it, the stub travels back inside the error.
#[derive(Debug, thiserror::Error)]
#[error("redemption rejected: {reason}")]
pub struct RedeemRejected {
    pub stub: TicketStub,
    #[source]
    pub reason: LotteryError,
}
