//! Metagraph: a snapshot of subnet state.
//!
//! Holds the per-uid arrays a storage node needs: hotkeys, stakes, axon
//! endpoints, validator permits. Synced from chain storage by
//! [`crate::queries::metagraph::sync_metagraph`].

use crate::axon::AxonInfo;
use crate::config;
use crate::errors::SubnetResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Subnet state indexed by uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metagraph {
    pub netuid: u16,
    /// Network name the snapshot was taken from.
    pub network: String,
    /// Block number at sync time.
    pub block: u64,
    /// Number of registered neurons.
    pub n: u16,
    pub uids: Vec<u16>,
    /// Hotkey SS58 addresses per uid.
    pub hotkeys: Vec<String>,
    /// Owning coldkey SS58 addresses per uid.
    pub coldkeys: Vec<String>,
    /// Total hotkey stake per uid, in RAO.
    pub stake: Vec<u64>,
    pub validator_permit: Vec<bool>,
    /// Last weight-update block per uid.
    pub last_update: Vec<u64>,
    /// Served axon endpoints per uid; `None` when a neuron never served.
    pub axons: Vec<Option<AxonInfo>>,
}

impl Metagraph {
    pub fn new(netuid: u16, network: &str) -> Self {
        Self {
            netuid,
            network: network.to_string(),
            block: 0,
            n: 0,
            uids: Vec::new(),
            hotkeys: Vec::new(),
            coldkeys: Vec::new(),
            stake: Vec::new(),
            validator_permit: Vec::new(),
            last_update: Vec::new(),
            axons: Vec::new(),
        }
    }

    /// Stake array alias matching the conventional `S` notation.
    pub fn s(&self) -> &[u64] {
        &self.stake
    }

    /// Total subnet stake in TAO.
    pub fn total_stake_tao(&self) -> f64 {
        config::rao_to_tao(self.stake.iter().map(|s| *s as u128).sum())
    }

    pub fn get_uid(&self, hotkey: &str) -> Option<u16> {
        self.hotkeys
            .iter()
            .position(|h| h == hotkey)
            .map(|idx| idx as u16)
    }

    pub fn is_registered(&self, hotkey: &str) -> bool {
        self.get_uid(hotkey).is_some()
    }

    /// Uids holding a validator permit.
    pub fn validators(&self) -> Vec<u16> {
        self.validator_permit
            .iter()
            .enumerate()
            .filter(|(_, &permit)| permit)
            .map(|(idx, _)| idx as u16)
            .collect()
    }

    /// Hotkey for a uid, if it exists.
    pub fn hotkey(&self, uid: u16) -> Option<&str> {
        self.hotkeys.get(uid as usize).map(String::as_str)
    }

    /// Served axon for a uid, if any.
    pub fn axon(&self, uid: u16) -> Option<&AxonInfo> {
        self.axons.get(uid as usize).and_then(|a| a.as_ref())
    }

    /// Persist the snapshot as JSON.
    pub fn save(&self, path: &Path) -> SubnetResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load a previously saved snapshot.
    pub fn load(path: &Path) -> SubnetResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let metagraph: Self = serde_json::from_str(&content)?;
        Ok(metagraph)
    }

    /// Directory where snapshots for this network/netuid are kept.
    pub fn save_dir(network: &str, netuid: u16) -> PathBuf {
        dirs::home_dir()
            .unwrap_or_default()
            .join(".bittensor")
            .join("metagraphs")
            .join(format!("network-{}", network))
            .join(format!("netuid-{}", netuid))
    }
}

impl std::fmt::Display for Metagraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Metagraph( netuid={}, network={}, n={}, block={} )",
            self.netuid, self.network, self.n, self.block
        )
    }
}
