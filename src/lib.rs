//! Tombola - Self-Service Lottery Ledger
//!
//! Any party creates a lottery by escrowing a prize, sells numbered tickets
//! against it, and a winner is selected deterministically (but unpredictably
//! to participants) from fresh entropy once the sale closes.
//!
//! The core guarantees, under adversarial and concurrent access:
//! - exactly one winner code is ever produced per lottery;
//! - every escrowed value (bonus, ticket income, platform fee) is accounted
//!   for on every exit path, with no leakage or double spend;
//! - the selection cannot be biased by the caller who triggers it.
//!
//! [`engine::LotteryEngine`] is the entry surface; everything else supports
//! it. Transport, indexing and query collaborators layer over the event bus
//! and the registry's read-only snapshots.

pub mod clock;
pub mod config;
pub mod engine;
pub mod entropy;
pub mod errors;
pub mod events;
pub mod funds;
pub mod lottery;
pub mod registry;
pub mod stats;

pub use clock::{Epoch, EpochClock, ManualEpochClock, SystemEpochClock};
pub use config::{ConfigBuilder, ConfigError, ConfigLoader, LedgerConfig};
pub use engine::{
    BuyOutcome, LotteryEngine, RedeemOutcome, BONUS_GRACE_EPOCHS, PLATFORM_FEE_DIVISOR,
};
pub use errors::{LedgerResult, LotteryError, RedeemRejected};
pub use events::{EventBus, LotteryEvent};
pub use funds::{Funds, Payout, PayoutQueue, PayoutReason, PayoutSink};
pub use lottery::{Address, LotteryId, LotterySnapshot, TicketStub};
pub use registry::{OperatorCap, Registry};
pub use stats::{PlatformStats, StatsSnapshot};
