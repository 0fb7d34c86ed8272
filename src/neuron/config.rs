//! Shared CLI configuration for the miner and validator binaries.
//!
//! Flag names keep the dotted convention operators already know:
//! `--wallet.name`, `--subtensor.network`, `--logging.debug`, and so on.

use crate::axon::DEFAULT_AXON_PORT;
use crate::config;
use crate::errors::SubnetResult;
use crate::logging::LoggingConfig;
use crate::wallet::Wallet;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
pub struct NeuronConfig {
    /// Wallet name.
    #[arg(long = "wallet.name", default_value = "default")]
    pub wallet_name: String,

    /// Hotkey name within the wallet.
    #[arg(long = "wallet.hotkey", default_value = "default")]
    pub wallet_hotkey: String,

    /// Wallet directory override.
    #[arg(long = "wallet.path")]
    pub wallet_path: Option<String>,

    /// Subnet uid to operate on.
    #[arg(long, default_value_t = config::DEFAULT_NETUID)]
    pub netuid: u16,

    /// Named network: finney, test, archive, local.
    #[arg(long = "subtensor.network", default_value = "local")]
    pub network: String,

    /// Explicit chain endpoint; overrides the network name.
    #[arg(long = "subtensor.chain_endpoint")]
    pub chain_endpoint: Option<String>,

    /// Port the axon binds on.
    #[arg(long = "axon.port", default_value_t = DEFAULT_AXON_PORT)]
    pub axon_port: u16,

    /// Public IP to announce on chain, when behind NAT.
    #[arg(long = "axon.external_ip")]
    pub axon_external_ip: Option<String>,

    /// Public port to announce on chain.
    #[arg(long = "axon.external_port")]
    pub axon_external_port: Option<u16>,

    /// Debug-level logging.
    #[arg(long = "logging.debug")]
    pub debug: bool,

    /// Trace-level logging.
    #[arg(long = "logging.trace")]
    pub trace: bool,

    /// Root directory for chunk databases.
    #[arg(long = "db_root_path")]
    pub db_root_path: Option<PathBuf>,

    /// Fraction of free disk space to fill.
    #[arg(long, default_value_t = 0.01)]
    pub threshold: f64,

    /// Concurrent database generation workers.
    #[arg(long, default_value_t = 10)]
    pub workers: usize,

    /// Skip the interactive allocation confirmation.
    #[arg(long = "no_prompt")]
    pub no_prompt: bool,

    /// Wipe and regenerate existing databases.
    #[arg(long)]
    pub restart: bool,
}

impl NeuronConfig {
    /// The websocket endpoint to dial.
    pub fn endpoint(&self) -> String {
        match &self.chain_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => config::network_to_endpoint(&self.network),
        }
    }

    /// Root directory for this node's chunk databases.
    pub fn db_root(&self) -> PathBuf {
        self.db_root_path
            .clone()
            .unwrap_or_else(config::default_db_root)
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::new()
            .with_debug(self.debug)
            .with_trace(self.trace)
    }

    /// Open the configured wallet with its hotkey selected.
    pub fn open_wallet(&self) -> SubnetResult<Wallet> {
        Ok(Wallet::new(
            &self.wallet_name,
            &self.wallet_hotkey,
            self.wallet_path.as_deref(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = NeuronConfig::parse_from(["miner"]);
        assert_eq!(cfg.wallet_name, "default");
        assert_eq!(cfg.netuid, config::DEFAULT_NETUID);
        assert_eq!(cfg.axon_port, DEFAULT_AXON_PORT);
        assert_eq!(cfg.endpoint(), config::LOCAL_ENDPOINT);
        assert!((cfg.threshold - 0.01).abs() < 1e-12);
        assert!(!cfg.no_prompt);
    }

    #[test]
    fn test_dotted_flags() {
        let cfg = NeuronConfig::parse_from([
            "miner",
            "--wallet.name",
            "store",
            "--wallet.hotkey",
            "hk1",
            "--subtensor.network",
            "test",
            "--axon.port",
            "9000",
            "--logging.debug",
            "--no_prompt",
        ]);
        assert_eq!(cfg.wallet_name, "store");
        assert_eq!(cfg.wallet_hotkey, "hk1");
        assert_eq!(cfg.endpoint(), config::TEST_ENDPOINT);
        assert_eq!(cfg.axon_port, 9000);
        assert!(cfg.debug);
        assert!(cfg.no_prompt);
    }

    #[test]
    fn test_endpoint_override() {
        let cfg = NeuronConfig::parse_from([
            "validator",
            "--subtensor.chain_endpoint",
            "ws://10.1.2.3:9944",
        ]);
        assert_eq!(cfg.endpoint(), "ws://10.1.2.3:9944");
    }
}
