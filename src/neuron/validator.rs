//! The validator node loop.
//!
//! Keeps hash-only databases per miner, challenges a random chunk each
//! step, and grows or shrinks its estimate of each miner's allocation
//! from the outcome. Verified chunk counts become on-chain weights.

use crate::chain::{ExtrinsicWait, PairSigner, SubtensorClient};
use crate::config::BLOCK_TIME_SECS;
use crate::dendrite::{Dendrite, DEFAULT_TIMEOUT};
use crate::errors::{NotRegistered, SubnetResult};
use crate::extrinsics;
use crate::metagraph::Metagraph;
use crate::protocol::Retrieve;
use crate::queries::{subnets, sync_metagraph};
use crate::store::{self, chunk, db, Allocation, ChunkDb, MIN_N_CHUNKS};
use rand::Rng;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::{load_hotkey, NeuronConfig};

/// Steps between weight submissions.
const WEIGHTS_INTERVAL: u64 = 1000;

/// Challenge bookkeeping for one miner.
#[derive(Debug, Clone)]
struct MinerState {
    /// The allocation we will challenge against next.
    attempted: u32,
    /// The largest allocation that has answered correctly.
    verified: u32,
}

impl MinerState {
    fn new() -> Self {
        Self {
            attempted: MIN_N_CHUNKS,
            verified: 0,
        }
    }

    /// A correct answer locks in the attempted allocation and probes
    /// ten percent higher next time.
    fn record_success(&mut self) {
        self.verified = self.attempted;
        self.attempted = (self.attempted as f64 * 1.1) as u32;
    }

    /// A wrong or missing answer shrinks the estimate, floored at
    /// `MIN_N_CHUNKS`; verified never exceeds attempted.
    fn record_failure(&mut self) {
        self.attempted = ((self.attempted as f64 * 0.9) as u32).max(MIN_N_CHUNKS);
        self.verified = self.verified.min(self.attempted);
    }
}

pub async fn run(config: NeuronConfig) -> SubnetResult<()> {
    crate::logging::init_logging(&config.logging_config());
    info!(
        "Running validator for netuid {} against {}",
        config.netuid,
        config.endpoint()
    );

    let wallet = config.open_wallet()?;
    let hotkey = load_hotkey(&wallet)?;
    let my_hotkey = hotkey.ss58_address().to_string();
    info!("Validator hotkey: {}", my_hotkey);

    let client = SubtensorClient::connect(config.endpoint()).await?;
    let mut metagraph = sync_metagraph(&client, config.netuid, &config.network).await?;

    let uid = metagraph
        .get_uid(&my_hotkey)
        .ok_or_else(|| NotRegistered::new(&my_hotkey, config.netuid))?;
    info!("Running validator on uid {}", uid);

    let mut states: HashMap<String, MinerState> = HashMap::new();
    let allocations = plan_hash_allocations(&config, &my_hotkey, &metagraph, &states);
    store::generate_all(&allocations, config.workers, config.restart, true).await?;
    for alloc in &allocations {
        states.insert(alloc.miner.clone(), MinerState::new());
    }

    let dendrite = Dendrite::new(hotkey.clone())?;
    let signer = PairSigner::from_keypair(&hotkey);

    info!("Starting validator loop");
    let mut step: u64 = 0;
    loop {
        challenge_all(&config, &my_hotkey, &metagraph, &dendrite, &mut states).await;

        // Grow hash databases to cover the new attempted allocations.
        let next = plan_hash_allocations(&config, &my_hotkey, &metagraph, &states);
        if let Err(e) = store::generate_all(&next, config.workers, false, false).await {
            warn!("Hash database regeneration failed: {}", e);
        }

        if (step + 1) % WEIGHTS_INTERVAL == 0 {
            if let Err(e) =
                submit_weights(&client, &signer, config.netuid, &metagraph, &states).await
            {
                warn!("Failed to set weights: {}", e);
            }
        }
        step += 1;

        match sync_metagraph(&client, config.netuid, &config.network).await {
            Ok(fresh) => {
                for hotkey in &fresh.hotkeys {
                    states.entry(hotkey.clone()).or_insert_with(MinerState::new);
                }
                metagraph = fresh;
            }
            Err(e) => warn!("Metagraph resync failed: {}", e),
        }

        // Wait one block, leaving on interrupt.
        tokio::select! {
            _ = tokio::time::sleep(std::time::Duration::from_secs(BLOCK_TIME_SECS)) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, exiting validator");
                return Ok(());
            }
        }
    }
}

/// Hash-only allocations sized to each miner's attempted count.
fn plan_hash_allocations(
    config: &NeuronConfig,
    my_hotkey: &str,
    metagraph: &Metagraph,
    states: &HashMap<String, MinerState>,
) -> Vec<Allocation> {
    metagraph
        .hotkeys
        .iter()
        .map(|miner| {
            let n_chunks = states
                .get(miner)
                .map(|s| s.attempted)
                .unwrap_or(MIN_N_CHUNKS);
            Allocation {
                path: validator_db_path(config, miner, my_hotkey),
                n_chunks,
                seed: chunk::pair_seed(miner, my_hotkey),
                miner: miner.clone(),
                validator: my_hotkey.to_string(),
                hash_only: true,
            }
        })
        .collect()
}

fn validator_db_path(config: &NeuronConfig, miner: &str, validator: &str) -> PathBuf {
    db::db_path(
        &config.db_root(),
        &config.wallet_name,
        &config.wallet_hotkey,
        miner,
        validator,
    )
}

/// Challenge every miner in the metagraph once.
async fn challenge_all(
    config: &NeuronConfig,
    my_hotkey: &str,
    metagraph: &Metagraph,
    dendrite: &Dendrite,
    states: &mut HashMap<String, MinerState>,
) {
    for (i, miner) in metagraph.hotkeys.iter().enumerate() {
        // Never challenge ourselves.
        if miner == my_hotkey {
            continue;
        }
        let state = states.entry(miner.clone()).or_insert_with(MinerState::new);

        let db_path = validator_db_path(config, miner, my_hotkey);
        let expected = match pick_challenge(&db_path, state.attempted) {
            Ok(Some(challenge)) => challenge,
            Ok(None) => continue,
            Err(e) => {
                warn!("Could not read proofs for {}: {}", miner, e);
                continue;
            }
        };
        let (index, expected_hash) = expected;
        debug!("Challenging miner [uid {}] for chunk {}", i, index);

        let axon = match metagraph.axon(i as u16) {
            Some(axon) if axon.is_serving() => axon.clone(),
            _ => {
                debug!("Miner [uid {}] is not serving an axon", i);
                state.record_failure();
                continue;
            }
        };

        let result = dendrite
            .retrieve(&axon, miner, Retrieve::new(index.to_string()), DEFAULT_TIMEOUT)
            .await;

        let verified = match result {
            Ok((response, Some(retrieve))) if response.is_success() => retrieve
                .data_bytes()
                .map(|data| chunk::chunk_hash(&data) == expected_hash)
                .unwrap_or(false),
            Ok(_) => false,
            Err(e) => {
                debug!("Challenge to miner [uid {}] failed: {}", i, e);
                false
            }
        };

        if verified {
            state.record_success();
            debug!(
                "Miner [uid {}] verified, raising allocation to {}",
                i, state.attempted
            );
        } else {
            state.record_failure();
            debug!(
                "Miner [uid {}] failed, reducing allocation to {}",
                i, state.attempted
            );
        }
    }
}

/// Choose a random chunk within what the local hash database actually
/// covers and return its stored proof.
fn pick_challenge(db_path: &PathBuf, attempted: u32) -> SubnetResult<Option<(u32, String)>> {
    if !ChunkDb::exists(db_path) {
        return Ok(None);
    }
    let db = ChunkDb::open(db_path)?;
    let upper = db.n_chunks()?.min(attempted);
    if upper == 0 {
        return Ok(None);
    }
    let index = rand::rng().random_range(0..upper);
    Ok(db.get_hash(index)?.map(|hash| (index, hash)))
}

/// Normalize verified chunk counts into weights and submit them.
async fn submit_weights(
    client: &SubtensorClient,
    signer: &PairSigner,
    netuid: u16,
    metagraph: &Metagraph,
    states: &HashMap<String, MinerState>,
) -> SubnetResult<()> {
    // Fetch fresh each time; the chain can bump the key mid-run.
    let version_key = subnets::weights_version_key(client, netuid).await?;

    let uids: Vec<u64> = metagraph.uids.iter().map(|uid| *uid as u64).collect();
    let scores: Vec<f32> = metagraph
        .hotkeys
        .iter()
        .map(|hotkey| {
            states
                .get(hotkey)
                .map(|s| s.verified as f32)
                .unwrap_or(0.0)
        })
        .collect();

    info!("Setting weights from verified allocations");
    extrinsics::set_weights(
        client,
        signer,
        netuid,
        &uids,
        &scores,
        version_key,
        ExtrinsicWait::Included,
    )
    .await?;
    info!("Successfully set weights");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_success_growth() {
        let mut state = MinerState::new();
        state.record_success();
        assert_eq!(state.verified, MIN_N_CHUNKS);
        assert_eq!(state.attempted, (MIN_N_CHUNKS as f64 * 1.1) as u32);
    }

    #[test]
    fn test_state_failure_floors_at_minimum() {
        let mut state = MinerState::new();
        state.record_failure();
        assert_eq!(state.attempted, MIN_N_CHUNKS);
        assert_eq!(state.verified, 0);
    }

    #[test]
    fn test_verified_never_exceeds_attempted() {
        let mut state = MinerState::new();
        for _ in 0..20 {
            state.record_success();
        }
        let peak_verified = state.verified;
        assert!(peak_verified > MIN_N_CHUNKS);

        for _ in 0..30 {
            state.record_failure();
        }
        assert_eq!(state.attempted, MIN_N_CHUNKS);
        assert!(state.verified <= state.attempted);
    }

    #[test]
    fn test_pick_challenge_within_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DB-m-v");
        let alloc = Allocation {
            path: path.clone(),
            n_chunks: 4,
            seed: "mv".into(),
            miner: "m".into(),
            validator: "v".into(),
            hash_only: true,
        };
        store::generate_db(&alloc, false, None).unwrap();

        for _ in 0..10 {
            let (index, hash) = pick_challenge(&path, 100).unwrap().unwrap();
            assert!(index < 4);
            assert_eq!(hash, chunk::generate_chunk_proof("mv", index));
        }
    }

    #[test]
    fn test_pick_challenge_missing_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DB-none");
        assert!(pick_challenge(&path, 8).unwrap().is_none());
    }
}
