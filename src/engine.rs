//! Lifecycle orchestrator.
//!
//! Drives every lottery through its state machine: creation, ticket sales,
//! announcement, redemption, refunds and fee settlement. Each operation is
//! atomic with respect to the registry and the single lottery it touches; a
//! failed precondition aborts with no state change.
//!
//! The close transition is a single decision point shared by purchase,
//! announcement and redemption: `Lottery::close_action` says what should
//! happen, and each entry point applies the effects itself. There is no
//! mutual recursion between operations.

use crate::clock::{Epoch, EpochClock};
use crate::config::LedgerConfig;
use crate::entropy;
use crate::errors::{LedgerResult, LotteryError, RedeemRejected};
use crate::events::{
    EventBus, LotteryEvent, NOTICE_ENDED, NOTICE_EXPIRED, NOTICE_JUST_DRAWN, NOTICE_NOT_WINNER,
};
use crate::funds::{Funds, Payout, PayoutReason, PayoutSink};
use crate::lottery::{Address, CloseAction, Lottery, LotteryId, LotterySnapshot, TicketStub};
use crate::registry::{OperatorCap, Registry};
use crate::stats::PlatformStats;
use std::sync::Arc;

/// One percent of ticket income is skimmed into the platform fee pool.
pub const PLATFORM_FEE_DIVISOR: u64 = 100;

/// Epochs past `end_epoch` after which an unclaimed lottery's creator may
/// reclaim the escrow.
pub const BONUS_GRACE_EPOCHS: u64 = 15;

/// Outcome of a purchase attempt.
#[derive(Debug)]
pub enum BuyOutcome {
    /// A ticket was sold; the stub proves the purchase.
    Ticket(TicketStub),
    /// The sale had already closed. The close transition ran and the caller's
    /// payment was left untouched.
    Closed,
}

/// Outcome of submitting a stub for redemption.
#[derive(Debug)]
pub enum RedeemOutcome {
    /// The stub matched the winner code; the prize travels with the outcome.
    Won { prize: Funds },
    /// The stub did not match. It has been consumed.
    Lost,
    /// Redemption arrived before the drawing; submitting it triggered the
    /// close transition. The stub comes back for resubmission.
    JustDrawn { stub: TicketStub },
    /// The lottery was already settled and removed. The stub is worthless
    /// and has been consumed.
    Expired,
}

/// The lottery ledger's single entry surface.
pub struct LotteryEngine {
    registry: Arc<Registry>,
    clock: Arc<dyn EpochClock>,
    sink: Arc<dyn PayoutSink>,
    events: EventBus,
    stats: PlatformStats,
    default_duration_epochs: u64,
}

impl LotteryEngine {
    pub fn new(
        config: &LedgerConfig,
        registry: Arc<Registry>,
        clock: Arc<dyn EpochClock>,
        sink: Arc<dyn PayoutSink>,
    ) -> Self {
        Self {
            registry,
            clock,
            sink,
            events: EventBus::new(config.events.channel_capacity),
            stats: PlatformStats::new(),
            default_duration_epochs: config.timing.default_duration_epochs,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn stats(&self) -> &PlatformStats {
        &self.stats
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Read-only view of one lottery.
    pub fn snapshot(&self, id: &LotteryId) -> Option<LotterySnapshot> {
        self.registry.snapshot(id)
    }

    /// Read-only views of all live lotteries.
    pub fn snapshots(&self) -> Vec<LotterySnapshot> {
        self.registry.snapshots()
    }

    /// Create a lottery with the configured default duration.
    pub fn create_lottery(
        &self,
        name: impl Into<String>,
        creator: Address,
        price: u64,
        total_amount: u64,
        bonus: Funds,
    ) -> LedgerResult<LotteryId> {
        let duration = self.default_duration_epochs;
        self.create_lottery_with_epochs(name, creator, price, total_amount, duration, bonus)
    }

    /// Create a lottery open for `duration_epochs` from now.
    pub fn create_lottery_with_epochs(
        &self,
        name: impl Into<String>,
        creator: Address,
        price: u64,
        total_amount: u64,
        duration_epochs: u64,
        bonus: Funds,
    ) -> LedgerResult<LotteryId> {
        if bonus.is_zero() {
            // Dropping a zero-valued pool loses nothing.
            return Err(LotteryError::InvalidBonus);
        }

        let name = name.into();
        let id = LotteryId::fresh();
        let now = self.clock.current_epoch();
        let end_epoch = now.saturating_add(duration_epochs);
        let bonus_amount = bonus.amount();

        let lottery = Lottery::new(id, name.clone(), creator, price, total_amount, bonus, end_epoch);
        self.registry.insert(lottery);
        self.stats.record_lottery_created();

        tracing::info!(
            lottery = %id,
            name = %name,
            price,
            total_amount,
            end_epoch,
            bonus = bonus_amount,
            "lottery created"
        );
        self.events.publish(LotteryEvent::Created {
            id,
            name,
            price,
            total_amount,
            end_epoch,
            bonus: bonus_amount,
        });

        Ok(id)
    }

    /// Buy one ticket.
    ///
    /// The payment is borrowed: exactly `price` is taken on a sale, and
    /// nothing moves on any other path. If the sale has already closed this
    /// runs the close transition instead of selling and returns
    /// [`BuyOutcome::Closed`].
    pub fn buy_lottery(
        &self,
        id: LotteryId,
        buyer: &Address,
        payment: &mut Funds,
    ) -> LedgerResult<BuyOutcome> {
        let now = self.clock.current_epoch();

        let mut entry = self
            .registry
            .lottery_mut(&id)
            .ok_or(LotteryError::UnknownLottery(id))?;
        let lottery = entry.value_mut();

        if lottery.announcement {
            return Err(LotteryError::AlreadyAnnounced);
        }
        if payment.amount() < lottery.price {
            return Err(LotteryError::InsufficientPayment {
                payment: payment.amount(),
                price: lottery.price,
            });
        }

        match lottery.close_action(now) {
            CloseAction::Announce => {
                // Past closing: never sell, draw instead. Payment untouched.
                self.announce_in_place(lottery);
                drop(entry);
                self.notice(id, NOTICE_ENDED);
                return Ok(BuyOutcome::Closed);
            }
            CloseAction::RefundCreator => {
                drop(entry);
                self.refund_creator_if_unsold(id, now);
                self.notice(id, NOTICE_ENDED);
                return Ok(BuyOutcome::Closed);
            }
            CloseAction::NotClosable => {}
        }

        let price = lottery.price;
        lottery.income.merge(payment.split(price)?);
        lottery.remaining_amount -= 1;

        let index = lottery.total_amount - lottery.remaining_amount;
        let code = entropy::derive_winner_code(index, &id).to_vec();
        let stub = TicketStub::mint(id, code);
        let remaining = lottery.remaining_amount;

        self.stats.record_ticket_sold();
        tracing::debug!(lottery = %id, buyer = %buyer, index, remaining, "ticket sold");
        self.events.publish(LotteryEvent::TicketSold {
            id,
            buyer: buyer.clone(),
            index,
            remaining,
        });

        // Sell-out is itself a closing condition.
        if lottery.remaining_amount == 0 {
            self.announce_in_place(lottery);
        }
        drop(entry);

        Ok(BuyOutcome::Ticket(stub))
    }

    /// Close a lottery: draw the winner, or refund the creator when nothing
    /// was ever sold.
    pub fn announce(&self, id: LotteryId) -> LedgerResult<()> {
        let now = self.clock.current_epoch();

        let mut entry = self
            .registry
            .lottery_mut(&id)
            .ok_or(LotteryError::UnknownLottery(id))?;
        let lottery = entry.value_mut();

        if lottery.announcement {
            return Err(LotteryError::AlreadyAnnounced);
        }

        match lottery.close_action(now) {
            CloseAction::NotClosable => Err(LotteryError::NotYetClosable),
            CloseAction::Announce => {
                self.announce_in_place(lottery);
                Ok(())
            }
            CloseAction::RefundCreator => {
                drop(entry);
                self.refund_creator_if_unsold(id, now);
                Ok(())
            }
        }
    }

    /// Redeem a stub against its lottery.
    ///
    /// Consumes the stub on every path except the "just drawn" retry and the
    /// abort against a still-open lottery, where it travels back to the
    /// caller.
    pub fn redeem_lottery(
        &self,
        stub: TicketStub,
        redeemer: &Address,
    ) -> Result<RedeemOutcome, RedeemRejected> {
        let id = stub.lottery_id();
        let now = self.clock.current_epoch();

        let Some(mut entry) = self.registry.lottery_mut(&id) else {
            // Already fully settled; the stub is void.
            self.notice(id, NOTICE_EXPIRED);
            return Ok(RedeemOutcome::Expired);
        };
        let lottery = entry.value_mut();

        if !lottery.announcement {
            return match lottery.close_action(now) {
                CloseAction::NotClosable => {
                    drop(entry);
                    Err(RedeemRejected {
                        stub,
                        reason: LotteryError::NotOpenForRedemption,
                    })
                }
                CloseAction::Announce => {
                    self.announce_in_place(lottery);
                    drop(entry);
                    self.notice(id, NOTICE_JUST_DRAWN);
                    Ok(RedeemOutcome::JustDrawn { stub })
                }
                CloseAction::RefundCreator => {
                    drop(entry);
                    self.refund_creator_if_unsold(id, now);
                    self.notice(id, NOTICE_EXPIRED);
                    Ok(RedeemOutcome::Expired)
                }
            };
        }

        if stub.code() != lottery.winner_code.as_slice() {
            drop(entry);
            self.notice(id, NOTICE_NOT_WINNER);
            return Ok(RedeemOutcome::Lost);
        }

        // Winner. Take the lottery out of the registry and settle it fully.
        drop(entry);
        let Some(mut lottery) = self.registry.remove(&id) else {
            // Lost the race against another settlement of the same lottery.
            self.notice(id, NOTICE_EXPIRED);
            return Ok(RedeemOutcome::Expired);
        };

        let prize = lottery.bonus.take_all();
        self.stats.record_winner_paid();
        tracing::info!(
            lottery = %id,
            redeemer = %redeemer,
            prize = prize.amount(),
            "winner paid"
        );
        self.settle_and_destroy(lottery, PayoutReason::CreatorIncome);

        Ok(RedeemOutcome::Won { prize })
    }

    /// Refund an unsold lottery's escrow, or reclaim a closed-but-unclaimed
    /// one after the grace period.
    pub fn redeem_bonus(&self, id: LotteryId) -> LedgerResult<()> {
        let now = self.clock.current_epoch();

        let Some(lottery) = self
            .registry
            .remove_if(&id, |l| Self::bonus_redeemable(l, now))
        else {
            // Still present means the predicate failed, not the lookup.
            return if self.registry.contains(&id) {
                Err(LotteryError::NotRedeemable)
            } else {
                Err(LotteryError::UnknownLottery(id))
            };
        };

        tracing::info!(lottery = %id, "bonus redeemed to creator");
        self.settle_and_destroy(lottery, PayoutReason::UnsoldRefund);
        self.notice(id, NOTICE_ENDED);

        Ok(())
    }

    /// Push a lottery's end epoch further out. No funds move.
    pub fn extend_lottery(&self, id: LotteryId, additional_epochs: u64) -> LedgerResult<()> {
        let mut entry = self
            .registry
            .lottery_mut(&id)
            .ok_or(LotteryError::UnknownLottery(id))?;
        let lottery = entry.value_mut();

        if lottery.announcement {
            return Err(LotteryError::AlreadyAnnounced);
        }

        lottery.end_epoch = lottery.end_epoch.saturating_add(additional_epochs);
        tracing::debug!(lottery = %id, end_epoch = lottery.end_epoch, "lottery extended");
        Ok(())
    }

    /// Drain the platform fee pool. Requires the operator capability.
    pub fn withdraw(&self, _cap: &OperatorCap) -> LedgerResult<Funds> {
        let funds = self.registry.withdraw_fees()?;
        tracing::info!(amount = funds.amount(), "platform fees withdrawn");
        Ok(funds)
    }

    /// Draw the winner and freeze the code. The caller guarantees at least
    /// one ticket was sold and `announcement` is still false.
    fn announce_in_place(&self, lottery: &mut Lottery) {
        let seed = entropy::fresh_seed();
        let index =
            entropy::derive_winning_index(lottery.total_amount, lottery.remaining_amount, &seed);
        let code = entropy::derive_winner_code(index, &lottery.id);

        lottery.announcement = true;
        lottery.winner_code = code.to_vec();
        lottery.audit_seed = Some(seed);

        tracing::info!(
            lottery = %lottery.id,
            winner_code = %hex::encode(code),
            "winner announced"
        );
        self.events.publish(LotteryEvent::WinnerAnnounced {
            id: lottery.id,
            name: lottery.name.clone(),
            winner_code: hex::encode(code),
            seed: hex::encode(seed),
        });
    }

    /// Close transition for a lottery that never sold a ticket: remove it and
    /// refund the whole escrow to the creator.
    fn refund_creator_if_unsold(&self, id: LotteryId, now: Epoch) {
        let removed = self.registry.remove_if(&id, |l| {
            !l.announcement && l.tickets_sold() == 0 && l.close_condition_met(now)
        });
        if let Some(lottery) = removed {
            tracing::info!(lottery = %id, "unsold lottery refunded to creator");
            self.settle_and_destroy(lottery, PayoutReason::UnsoldRefund);
        }
    }

    /// Final settlement of a removed lottery. Skims the platform fee from
    /// ticket income exactly once, sweeps any remaining bonus into income
    /// (the bonus is never fee-skimmed), and delivers the balance to the
    /// creator through the payout sink. Consumes the lottery; nothing is
    /// left escrowed.
    fn settle_and_destroy(&self, mut lottery: Lottery, reason: PayoutReason) {
        let fee = lottery.income.amount() / PLATFORM_FEE_DIVISOR;
        if fee > 0 {
            // split cannot fail: fee <= income by construction.
            if let Ok(fee_funds) = lottery.income.split(fee) {
                self.registry.pool_fee(fee_funds);
                self.stats.record_fee(fee);
            }
        }

        let leftover_bonus = lottery.bonus.take_all();
        lottery.income.merge(leftover_bonus);

        let funds = lottery.income.take_all();
        tracing::debug!(
            lottery = %lottery.id,
            creator = %lottery.creator,
            amount = funds.amount(),
            fee,
            ?reason,
            "lottery settled"
        );
        self.sink.deliver(Payout {
            lottery_id: lottery.id,
            recipient: lottery.creator.clone(),
            funds,
            reason,
        });
        self.stats.record_payout_queued();
    }

    fn bonus_redeemable(lottery: &Lottery, now: Epoch) -> bool {
        lottery.tickets_sold() == 0
            || now > lottery.end_epoch.saturating_add(BONUS_GRACE_EPOCHS)
    }

    fn notice(&self, id: LotteryId, text: &str) {
        self.events.publish(LotteryEvent::Notice {
            id,
            text: text.to_string(),
        });
    }
}
