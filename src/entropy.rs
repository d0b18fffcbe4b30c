//! Winner selection through keyed-hash chaining.
//!
//! A single winning index is derived from the sale counters and a fresh seed:
//! the seed keys a hash of the total ticket count, whose output keys a hash of
//! the remaining count, and the final digest is folded into an index in
//! `[1, d]` where `d` is the number of tickets sold. The seed is drawn from
//! OS entropy at the moment of announcement, never caller-suppliable and
//! never derived from prior state, so no party can choose or preview it
//! before the announcing call commits.
//!
//! Winner codes bind an index to a lottery's identity with one further keyed
//! hash. The same derivation runs at purchase time over the ticket's
//! sequential index, so a ticket wins exactly when its purchase-order index
//! equals the selected one, and redemption is a plain byte comparison.

use crate::lottery::LotteryId;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Length of winner and stub codes in bytes.
pub const WINNER_CODE_LEN: usize = 32;

/// SHA-256 over `key || data`, the chaining building block.
pub fn keyed_digest(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.update(data);
    hasher.finalize().into()
}

/// Draw 32 bytes of fresh OS entropy.
pub fn fresh_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    seed
}

/// Derive the winning index in `[1, d]` where `d = total - remaining`.
///
/// The caller guarantees at least one ticket was sold (`d >= 1`).
pub fn derive_winning_index(total: u64, remaining: u64, seed: &[u8; 32]) -> u64 {
    debug_assert!(total > remaining, "selection requires at least one sale");
    let d = (total - remaining) as u128;

    let h1 = keyed_digest(seed, &total.to_le_bytes());
    let h2 = keyed_digest(&h1, &remaining.to_le_bytes());

    // Fold the digest right-to-left; the accumulator starts at the
    // multiplicative identity so every byte contributes.
    let mut index: u128 = 1;
    for &byte in h2.iter().rev() {
        index = (index * (byte as u128 % d + 1)) % d + 1;
    }
    index as u64
}

/// Bind an index to a lottery's identity, producing a fixed-length code.
pub fn derive_winner_code(index: u64, lottery_id: &LotteryId) -> [u8; WINNER_CODE_LEN] {
    keyed_digest(lottery_id.as_bytes(), &index.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_always_in_range() {
        for _ in 0..100 {
            let seed = fresh_seed();
            let total = 1 + rand::random::<u64>() % 1000;
            let remaining = rand::random::<u64>() % total;
            let index = derive_winning_index(total, remaining, &seed);
            let d = total - remaining;
            assert!(index >= 1 && index <= d, "index {} out of [1, {}]", index, d);
        }
    }

    #[test]
    fn test_index_deterministic_for_fixed_inputs() {
        let seed = [7u8; 32];
        let a = derive_winning_index(100, 40, &seed);
        let b = derive_winning_index(100, 40, &seed);
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_sale_always_selects_one() {
        for _ in 0..20 {
            let seed = fresh_seed();
            assert_eq!(derive_winning_index(5, 4, &seed), 1);
            assert_eq!(derive_winning_index(1, 0, &seed), 1);
        }
    }

    #[test]
    fn test_seed_changes_selection() {
        // With 256 candidates two fixed seeds agreeing would be surprising;
        // check over several pairs so flakiness is negligible.
        let mut differed = false;
        for _ in 0..16 {
            let a = derive_winning_index(1000, 0, &fresh_seed());
            let b = derive_winning_index(1000, 0, &fresh_seed());
            if a != b {
                differed = true;
                break;
            }
        }
        assert!(differed);
    }

    #[test]
    fn test_winner_code_binds_index_and_lottery() {
        let id_a = LotteryId::fresh();
        let id_b = LotteryId::fresh();

        let code = derive_winner_code(3, &id_a);
        assert_eq!(code.len(), WINNER_CODE_LEN);
        assert_eq!(code, derive_winner_code(3, &id_a));
        assert_ne!(code, derive_winner_code(4, &id_a));
        assert_ne!(code, derive_winner_code(3, &id_b));
    }

    #[test]
    fn test_fresh_seeds_are_distinct() {
        assert_ne!(fresh_seed(), fresh_seed());
    }
}
