//! Network and chain configuration.
//!
//! Resolves network names to RPC endpoints and carries the chain constants
//! the rest of the crate relies on.

use std::path::PathBuf;

/// SS58 address format used by the chain (substrate generic, 42)
pub const SS58_FORMAT: u16 = 42;

/// Block time in seconds
pub const BLOCK_TIME_SECS: u64 = 12;

/// RAO per TAO (1 TAO = 10^9 RAO)
pub const RAO_PER_TAO: u64 = 1_000_000_000;

/// Default netuid targeted by the node binaries
pub const DEFAULT_NETUID: u16 = 12;

/// Finney mainnet endpoint
pub const FINNEY_ENDPOINT: &str = "wss://entrypoint-finney.opentensor.ai:443";

/// Public test network endpoint
pub const TEST_ENDPOINT: &str = "wss://test.finney.opentensor.ai:443";

/// Archive node endpoint
pub const ARCHIVE_ENDPOINT: &str = "wss://archive.chain.opentensor.ai:443";

/// Local development chain endpoint
pub const LOCAL_ENDPOINT: &str = "ws://127.0.0.1:9946";

/// Resolve a network name (or raw ws:// URL) to a chain endpoint.
///
/// Unknown names are treated as endpoints verbatim, so both
/// `--network local` and `--network ws://10.0.0.5:9944` work.
pub fn network_to_endpoint(network: &str) -> String {
    match network {
        "finney" | "mainnet" => FINNEY_ENDPOINT.to_string(),
        "test" | "testnet" => TEST_ENDPOINT.to_string(),
        "archive" => ARCHIVE_ENDPOINT.to_string(),
        "local" => std::env::var("CHAIN_ENDPOINT").unwrap_or_else(|_| LOCAL_ENDPOINT.to_string()),
        other => crate::utils::networking::format_ws_endpoint(other),
    }
}

/// Default wallet directory (`~/.bittensor/wallets`).
pub fn default_wallet_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bittensor")
        .join("wallets")
}

/// Default root directory for chunk databases (`~/.bittensor/db`).
pub fn default_db_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bittensor")
        .join("db")
}

/// Convert a RAO balance to TAO for display.
pub fn rao_to_tao(rao: u128) -> f64 {
    rao as f64 / RAO_PER_TAO as f64
}
