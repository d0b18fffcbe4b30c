//! Logical time.
//!
//! The ledger measures lottery expiry and grace periods in epochs, a discrete
//! logical time unit supplied by the embedder. [`EpochClock`] is that seam:
//! [`ManualEpochClock`] is driven explicitly (embedders with their own notion
//! of time, and tests), [`SystemEpochClock`] derives the epoch from wall time
//! and a configured interval.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Discrete logical time unit.
pub type Epoch = u64;

pub trait EpochClock: Send + Sync {
    fn current_epoch(&self) -> Epoch;
}

/// Clock advanced explicitly by the embedder.
pub struct ManualEpochClock {
    epoch: AtomicU64,
}

impl ManualEpochClock {
    pub fn new(start: Epoch) -> Self {
        Self {
            epoch: AtomicU64::new(start),
        }
    }

    pub fn advance(&self, epochs: u64) {
        self.epoch.fetch_add(epochs, Ordering::SeqCst);
    }

    pub fn set(&self, epoch: Epoch) {
        self.epoch.store(epoch, Ordering::SeqCst);
    }
}

impl EpochClock for ManualEpochClock {
    fn current_epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }
}

/// Clock that maps wall time onto epochs of a fixed interval.
pub struct SystemEpochClock {
    origin: SystemTime,
    interval: Duration,
}

impl SystemEpochClock {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            origin: SystemTime::UNIX_EPOCH,
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }
}

impl EpochClock for SystemEpochClock {
    fn current_epoch(&self) -> Epoch {
        let elapsed = SystemTime::now()
            .duration_since(self.origin)
            .unwrap_or(Duration::ZERO);
        elapsed.as_secs() / self.interval.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualEpochClock::new(5);
        assert_eq!(clock.current_epoch(), 5);

        clock.advance(3);
        assert_eq!(clock.current_epoch(), 8);

        clock.set(100);
        assert_eq!(clock.current_epoch(), 100);
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemEpochClock::new(60);
        let a = clock.current_epoch();
        let b = clock.current_epoch();
        assert!(b >= a);
        assert!(a > 0);
    }
}
