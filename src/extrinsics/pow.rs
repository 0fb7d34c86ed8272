//! Proof-of-work solver for registration and the test-network faucet.
//!
//! A seal is `sha256(nonce_le || sha256(block_hash || account))`;
//! hashing the account in makes a solved nonce useless for any other
//! key. The seal meets a difficulty `d` when `seal * d < 2^256`,
//! equivalently when it compares below `(2^256 - 1) / d` byte-wise
//! big-endian.

use crate::errors::{PowFailed, SubnetResult};
use sha2::{Digest, Sha256};
use sp_core::H256;

/// A solved proof of work, ready to submit.
#[derive(Debug, Clone)]
pub struct PowSolution {
    pub block_number: u64,
    pub nonce: u64,
    /// The 32-byte seal.
    pub work: Vec<u8>,
}

/// Big-endian `(2^256 - 1) / difficulty`.
fn difficulty_limit(difficulty: u64) -> [u8; 32] {
    let difficulty = difficulty.max(1) as u128;
    let mut limit = [0u8; 32];
    let mut remainder: u128 = 0;
    for byte in limit.iter_mut() {
        let cur = (remainder << 8) | 0xff;
        *byte = (cur / difficulty) as u8;
        remainder = cur % difficulty;
    }
    limit
}

/// `sha256(block_hash || account)`, fixed for the whole nonce search.
fn block_and_key_hash(block_hash: &H256, key: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(block_hash.as_bytes());
    hasher.update(key);
    hasher.finalize().into()
}

fn seal(nonce: u64, block_and_key: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(nonce.to_le_bytes());
    hasher.update(block_and_key);
    hasher.finalize().into()
}

fn meets_difficulty(seal: &[u8; 32], limit: &[u8; 32]) -> bool {
    seal < limit
}

/// Search for a nonce whose seal meets the difficulty for the given
/// registering account.
pub fn solve(
    block_number: u64,
    block_hash: H256,
    key: &[u8; 32],
    difficulty: u64,
    max_attempts: u64,
) -> SubnetResult<PowSolution> {
    let limit = difficulty_limit(difficulty);
    let block_and_key = block_and_key_hash(&block_hash, key);

    for nonce in 0..max_attempts {
        let candidate = seal(nonce, &block_and_key);
        if meets_difficulty(&candidate, &limit) {
            return Ok(PowSolution {
                block_number,
                nonce,
                work: candidate.to_vec(),
            });
        }
    }

    Err(PowFailed {
        attempts: max_attempts,
        difficulty,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_one_accepts_everything() {
        let limit = difficulty_limit(1);
        assert_eq!(limit, [0xff; 32]);
    }

    #[test]
    fn test_limit_scales_down() {
        let easy = difficulty_limit(2);
        let hard = difficulty_limit(1 << 20);
        assert!(hard < easy);
        assert_eq!(easy[0], 0x7f);
    }

    #[test]
    fn test_solve_low_difficulty() {
        let key = [9u8; 32];
        let solution = solve(10, H256::repeat_byte(7), &key, 2, 10_000).unwrap();
        assert_eq!(solution.block_number, 10);
        assert_eq!(solution.work.len(), 32);

        // The returned seal reproduces from the nonce and key.
        let block_and_key = block_and_key_hash(&H256::repeat_byte(7), &key);
        let expected = seal(solution.nonce, &block_and_key);
        assert_eq!(solution.work, expected.to_vec());
    }

    #[test]
    fn test_seal_is_key_specific() {
        // A nonce solved for one account must not seal for another.
        let block_hash = H256::repeat_byte(7);
        let a = solve(10, block_hash, &[1u8; 32], 1, 10).unwrap();
        let b = solve(10, block_hash, &[2u8; 32], 1, 10).unwrap();
        assert_eq!(a.nonce, b.nonce);
        assert_ne!(a.work, b.work);
    }

    #[test]
    fn test_solve_gives_up() {
        // Max difficulty with a single attempt virtually never solves.
        let result = solve(0, H256::repeat_byte(1), &[0u8; 32], u64::MAX, 1);
        assert!(result.is_err());
    }
}
