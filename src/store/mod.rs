//! Deterministic chunk store.
//!
//! Miners fill disk with seeded pseudo-random chunks; validators keep
//! only the proofs. Both derive the material from the same
//! (miner, validator) seed, so a challenge needs no prior transfer.

pub mod allocate;
pub mod chunk;
pub mod db;
pub mod generate;
pub mod verify;

/// Size of one chunk: 1 MiB.
pub const CHUNK_SIZE: usize = 1 << 20;

/// Floor for a validator's assumed allocation per miner.
pub const MIN_N_CHUNKS: u32 = 1 << 10;

pub use allocate::{allocate, available_space, confirm_generation, human_readable_size, Allocation};
pub use chunk::{chunk_hash, generate_chunk, generate_chunk_proof, pair_seed};
pub use db::{db_name, db_path, ChunkDb};
pub use generate::{generate_all, generate_db};
pub use verify::{verify_all, verify_db};
