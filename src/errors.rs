//! Error types for the storage subnet node stack.
//!
//! Each failure mode gets a structured error type carrying the context a
//! caller needs to react, plus a unified [`SubnetError`] enum with `From`
//! conversions so modules can propagate with `?`.

use std::path::PathBuf;
use thiserror::Error;

/// Failed to connect to the subtensor chain endpoint.
#[derive(Debug, Error)]
#[error("Failed to connect to chain at {endpoint}: {reason}")]
pub struct ChainConnectionError {
    pub endpoint: String,
    pub reason: String,
}

impl ChainConnectionError {
    pub fn new(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

/// A storage query returned something unexpected or failed to decode.
#[derive(Debug, Error)]
#[error("Chain query {module}.{entry} failed: {reason}")]
pub struct ChainQueryError {
    pub module: String,
    pub entry: String,
    pub reason: String,
}

impl ChainQueryError {
    pub fn new(
        module: impl Into<String>,
        entry: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            entry: entry.into(),
            reason: reason.into(),
        }
    }
}

/// An extrinsic was rejected or dropped before inclusion.
#[derive(Debug, Error)]
#[error("Extrinsic {call} failed: {reason}")]
pub struct ExtrinsicFailed {
    pub call: String,
    pub reason: String,
}

impl ExtrinsicFailed {
    pub fn new(call: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            call: call.into(),
            reason: reason.into(),
        }
    }
}

/// The hotkey is not registered on the target subnet.
#[derive(Debug, Error)]
#[error("Hotkey {hotkey} is not registered on netuid {netuid}")]
pub struct NotRegistered {
    pub hotkey: String,
    pub netuid: u16,
}

impl NotRegistered {
    pub fn new(hotkey: impl Into<String>, netuid: u16) -> Self {
        Self {
            hotkey: hotkey.into(),
            netuid,
        }
    }
}

/// Proof-of-work search exhausted its attempt budget.
#[derive(Debug, Error)]
#[error("Proof of work failed after {attempts} attempts (difficulty {difficulty})")]
pub struct PowFailed {
    pub attempts: u64,
    pub difficulty: u64,
}

/// A chunk database could not be opened or operated on.
#[derive(Debug, Error)]
#[error("Chunk store error at {path}: {reason}")]
pub struct StoreError {
    pub path: PathBuf,
    pub reason: String,
}

impl StoreError {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A stored chunk hash does not match its regenerated data.
#[derive(Debug, Error)]
#[error("Chunk {index} failed verification in {db}: expected {expected}, got {actual}")]
pub struct ChunkMismatch {
    pub db: String,
    pub index: u32,
    pub expected: String,
    pub actual: String,
}

/// Disk probing or the allocation math produced an unusable result.
#[derive(Debug, Error)]
#[error("Allocation error: {reason}")]
pub struct AllocationError {
    pub reason: String,
}

impl AllocationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The axon rejected a request signature.
#[derive(Debug, Error)]
#[error("Unauthorized request from {hotkey}: {reason}")]
pub struct Unauthorized {
    pub hotkey: String,
    pub reason: String,
}

/// A dendrite call did not complete.
#[derive(Debug, Error)]
#[error("Request to {endpoint} failed: {reason}")]
pub struct RequestFailed {
    pub endpoint: String,
    pub reason: String,
}

impl RequestFailed {
    pub fn new(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

/// Unified error type covering every subsystem.
#[derive(Debug, Error)]
pub enum SubnetError {
    #[error(transparent)]
    ChainConnection(#[from] ChainConnectionError),

    #[error(transparent)]
    ChainQuery(#[from] ChainQueryError),

    #[error(transparent)]
    Extrinsic(#[from] ExtrinsicFailed),

    #[error(transparent)]
    NotRegistered(#[from] NotRegistered),

    #[error(transparent)]
    Pow(#[from] PowFailed),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    ChunkMismatch(#[from] ChunkMismatch),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Unauthorized(#[from] Unauthorized),

    #[error(transparent)]
    Request(#[from] RequestFailed),

    #[error("Wallet error: {0}")]
    Wallet(#[from] crate::wallet::WalletError),

    #[error("Subxt error: {0}")]
    Subxt(#[from] subxt::Error),

    #[error("RocksDB error: {0}")]
    Rocks(#[from] rocksdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("{0}")]
    Other(String),
}

impl SubnetError {
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type SubnetResult<T> = Result<T, SubnetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NotRegistered::new("5GrwvaEF...", 12);
        assert!(err.to_string().contains("netuid 12"));

        let err: SubnetError = ChainConnectionError::new("ws://127.0.0.1:9946", "refused").into();
        assert!(err.to_string().contains("ws://127.0.0.1:9946"));
    }

    #[test]
    fn test_chunk_mismatch_display() {
        let err = ChunkMismatch {
            db: "DB-a-b".into(),
            index: 7,
            expected: "aa".into(),
            actual: "bb".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Chunk 7"));
        assert!(msg.contains("DB-a-b"));
    }
}
