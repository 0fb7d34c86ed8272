//! Stake-proportional space allocation.

use crate::config;
use crate::errors::{AllocationError, SubnetResult};
use crate::metagraph::Metagraph;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{chunk, db, CHUNK_SIZE};

/// One planned chunk database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub path: PathBuf,
    pub n_chunks: u32,
    pub seed: String,
    pub miner: String,
    pub validator: String,
    /// Hash-only databases hold proofs without chunk data.
    pub hash_only: bool,
}

impl Allocation {
    /// Total on-disk size the data column will take.
    pub fn size_bytes(&self) -> u64 {
        if self.hash_only {
            0
        } else {
            self.n_chunks as u64 * CHUNK_SIZE as u64
        }
    }
}

/// Free space in bytes at a path.
pub fn available_space(path: &Path) -> SubnetResult<u64> {
    fs2::available_space(path)
        .map_err(|e| AllocationError::new(format!("statvfs {} failed: {}", path.display(), e)).into())
}

/// Render a byte count for humans.
pub fn human_readable_size(size: u64) -> String {
    const UNITS: &[(u64, &str)] = &[
        (1 << 40, "TB"),
        (1 << 30, "GB"),
        (1 << 20, "MB"),
        (1 << 10, "KB"),
    ];
    for (threshold, unit) in UNITS {
        if size >= *threshold {
            return format!("{:.2} {}", size as f64 / *threshold as f64, unit);
        }
    }
    format!("{} bytes", size)
}

/// Plan one database per hotkey in the metagraph.
///
/// Each hotkey's share is `(S_i + 1) / Σ_j (S_j + 1)` of the available
/// space scaled by `threshold`, where `S` is stake in TAO. The +1
/// keeps zero-stake hotkeys from rounding to nothing.
pub fn allocate(
    db_root: &Path,
    wallet_name: &str,
    hotkey_name: &str,
    miner_hotkey: &str,
    metagraph: &Metagraph,
    threshold: f64,
    hash_only: bool,
) -> SubnetResult<Vec<Allocation>> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(AllocationError::new(format!(
            "threshold must be in [0, 1], got {}",
            threshold
        ))
        .into());
    }

    let wallet_db_path = db_root.join(wallet_name).join(hotkey_name);
    std::fs::create_dir_all(&wallet_db_path)?;

    let available = available_space(&wallet_db_path)?;
    let filling_space = available as f64 * threshold;

    let stakes_tao: Vec<f64> = metagraph
        .s()
        .iter()
        .map(|s| config::rao_to_tao(*s as u128))
        .collect();
    let denom: f64 = stakes_tao.iter().map(|s| s + 1.0).sum();
    if denom <= 0.0 {
        return Err(AllocationError::new("metagraph has no hotkeys to allocate for").into());
    }

    let mut allocations = Vec::with_capacity(metagraph.hotkeys.len());
    for (i, validator_hotkey) in metagraph.hotkeys.iter().enumerate() {
        let db_size = (stakes_tao[i] + 1.0) / denom * filling_space;
        let n_chunks = (db_size / CHUNK_SIZE as f64) as u32 + 1;

        allocations.push(Allocation {
            path: db::db_path(
                db_root,
                wallet_name,
                hotkey_name,
                miner_hotkey,
                validator_hotkey,
            ),
            n_chunks,
            seed: chunk::pair_seed(miner_hotkey, validator_hotkey),
            miner: miner_hotkey.to_string(),
            validator: validator_hotkey.to_string(),
            hash_only,
        });
    }

    Ok(allocations)
}

/// Ask the operator to confirm before filling the disk.
pub fn confirm_generation(allocations: &[Allocation]) -> SubnetResult<bool> {
    let total_size: u64 = allocations.iter().map(Allocation::size_bytes).sum();
    let prompt = format!(
        "Partition {} databases with total size {}?",
        allocations.len(),
        human_readable_size(total_size)
    );
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AllocationError::new(format!("prompt failed: {}", e)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metagraph() -> Metagraph {
        let mut mg = Metagraph::new(12, "local");
        mg.n = 2;
        mg.uids = vec![0, 1];
        mg.hotkeys = vec!["validator0".into(), "validator1".into()];
        mg.stake = vec![0, 3 * config::RAO_PER_TAO];
        mg.validator_permit = vec![true, true];
        mg.last_update = vec![0, 0];
        mg.axons = vec![None, None];
        mg
    }

    #[test]
    fn test_allocations_scale_with_stake() {
        let dir = tempfile::tempdir().unwrap();
        let allocations = allocate(
            dir.path(),
            "w",
            "hk",
            "miner",
            &sample_metagraph(),
            0.01,
            false,
        )
        .unwrap();

        assert_eq!(allocations.len(), 2);
        // Stake 3 TAO vs 0 TAO: the staked validator gets the larger share.
        assert!(allocations[1].n_chunks >= allocations[0].n_chunks);
        assert!(allocations[0].n_chunks >= 1);
        assert_eq!(allocations[0].seed, "minervalidator0");
        assert!(allocations[0]
            .path
            .ends_with("w/hk/DB-miner-validator0"));
    }

    #[test]
    fn test_threshold_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let result = allocate(
            dir.path(),
            "w",
            "hk",
            "miner",
            &sample_metagraph(),
            1.5,
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_human_readable_size() {
        assert_eq!(human_readable_size(512), "512 bytes");
        assert_eq!(human_readable_size(1 << 20), "1.00 MB");
        assert_eq!(human_readable_size(3 * (1 << 30)), "3.00 GB");
    }

    #[test]
    fn test_hash_only_size_is_zero() {
        let alloc = Allocation {
            path: PathBuf::from("/tmp/DB-a-b"),
            n_chunks: 1024,
            seed: "ab".into(),
            miner: "a".into(),
            validator: "b".into(),
            hash_only: true,
        };
        assert_eq!(alloc.size_bytes(), 0);
    }
}
