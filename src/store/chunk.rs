//! Deterministic chunk material.
//!
//! A chunk is a pure function of (seed, index, size): both sides of a
//! challenge derive the same bytes independently, so allocation never
//! moves data over the network.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

use super::CHUNK_SIZE;

/// Seed string for a (miner, validator) pair, miner first.
pub fn pair_seed(miner_hotkey: &str, validator_hotkey: &str) -> String {
    format!("{}{}", miner_hotkey, validator_hotkey)
}

/// 32-byte RNG key for one chunk: `sha256(seed || index_le)`.
pub fn chunk_rng_key(seed: &str, index: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(index.to_le_bytes());
    hasher.finalize().into()
}

/// Generate chunk bytes for a seed and index.
pub fn generate_chunk(seed: &str, index: u32, size: usize) -> Vec<u8> {
    let mut rng = ChaCha20Rng::from_seed(chunk_rng_key(seed, index));
    let mut data = vec![0u8; size];
    rng.fill_bytes(&mut data);
    data
}

/// Hex SHA-256 proof over raw chunk bytes.
pub fn chunk_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Proof for a chunk without keeping the data around.
pub fn generate_chunk_proof(seed: &str, index: u32) -> String {
    chunk_hash(&generate_chunk(seed, index, CHUNK_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_are_deterministic() {
        let a = generate_chunk("seed", 0, 1024);
        let b = generate_chunk("seed", 0, 1024);
        assert_eq!(a, b);
        assert_eq!(a.len(), 1024);
    }

    #[test]
    fn test_chunks_differ_by_index_and_seed() {
        let a = generate_chunk("seed", 0, 1024);
        let b = generate_chunk("seed", 1, 1024);
        let c = generate_chunk("other", 0, 1024);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_proof_matches_hash_of_data() {
        let data = generate_chunk("seed", 3, CHUNK_SIZE);
        assert_eq!(chunk_hash(&data), generate_chunk_proof("seed", 3));
    }

    #[test]
    fn test_pair_seed_order() {
        assert_eq!(pair_seed("miner", "validator"), "minervalidator");
        assert_ne!(pair_seed("a", "b"), pair_seed("b", "a"));
    }
}
