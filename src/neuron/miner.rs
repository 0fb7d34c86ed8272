//! The miner node loop.
//!
//! Fills disk with seeded chunk databases for every hotkey in the
//! metagraph, announces its axon on chain, and answers `Retrieve`
//! challenges from validators out of the matching database.

use crate::axon::{Axon, AxonConfig};
use crate::chain::{ExtrinsicWait, PairSigner, SubtensorClient};
use crate::config::BLOCK_TIME_SECS;
use crate::errors::{NotRegistered, SubnetResult};
use crate::extrinsics;
use crate::metagraph::Metagraph;
use crate::protocol::{Retrieve, Synapse, RETRIEVE_SYNAPSE};
use crate::queries::sync_metagraph;
use crate::store::{self, Allocation, ChunkDb};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{load_hotkey, NeuronConfig};

/// Blocks between metagraph resyncs while serving.
const RESYNC_INTERVAL_BLOCKS: u64 = 50;

/// Open databases this miner serves, keyed by validator hotkey.
///
/// Handles stay open for the life of the process: RocksDB holds a
/// per-path lock, so overlapping challenges must share one handle
/// rather than reopen the database per request.
type StoreMap = Arc<RwLock<HashMap<String, Arc<ChunkDb>>>>;

pub async fn run(config: NeuronConfig) -> SubnetResult<()> {
    crate::logging::init_logging(&config.logging_config());
    info!(
        "Running miner for netuid {} against {}",
        config.netuid,
        config.endpoint()
    );

    let wallet = config.open_wallet()?;
    let hotkey = load_hotkey(&wallet)?;
    let my_hotkey = hotkey.ss58_address().to_string();
    info!("Miner hotkey: {}", my_hotkey);

    let client = SubtensorClient::connect(config.endpoint()).await?;
    let metagraph = sync_metagraph(&client, config.netuid, &config.network).await?;

    let uid = metagraph
        .get_uid(&my_hotkey)
        .ok_or_else(|| NotRegistered::new(&my_hotkey, config.netuid))?;
    info!("Running miner on uid {}", uid);

    // Fill disk for every hotkey currently in the metagraph.
    let allocations = plan_allocations(&config, &my_hotkey, &metagraph)?;
    if !config.no_prompt && !store::confirm_generation(&allocations)? {
        info!("Allocation declined, exiting");
        return Ok(());
    }
    store::generate_all(&allocations, config.workers, config.restart, true).await?;
    store::verify_all(&allocations)?;

    let mut open_stores = HashMap::new();
    for alloc in &allocations {
        open_stores.insert(alloc.validator.clone(), Arc::new(ChunkDb::open(&alloc.path)?));
    }
    let stores: StoreMap = Arc::new(RwLock::new(open_stores));

    // Announce the endpoint.
    let mut axon_config = AxonConfig::new().with_port(config.axon_port);
    if let Some(ip) = &config.axon_external_ip {
        axon_config = axon_config.with_external_ip(ip.clone());
    }
    if let Some(port) = config.axon_external_port {
        axon_config = axon_config.with_external_port(port);
    }

    let mut axon = Axon::new(hotkey.clone(), axon_config);
    let axon_info = axon.info(metagraph.block);
    if !axon_info.is_serving() {
        warn!(
            "Announcing non-routable axon endpoint {}:{}; set --axon.external_ip",
            axon_info.ip, axon_info.port
        );
    }
    let signer = PairSigner::from_keypair(&hotkey);
    extrinsics::serve_axon(
        &client,
        &signer,
        config.netuid,
        &axon_info,
        ExtrinsicWait::Included,
    )
    .await?;

    let handler_stores = Arc::clone(&stores);
    axon.attach(
        RETRIEVE_SYNAPSE,
        Arc::new(move |synapse| {
            let stores = Arc::clone(&handler_stores);
            Box::pin(async move { handle_retrieve(stores, synapse).await })
        }),
    );

    // Keep allocating for validators that register later.
    tokio::spawn(resync_loop(config.clone(), my_hotkey, client, Arc::clone(&stores)));

    axon.serve().await
}

fn plan_allocations(
    config: &NeuronConfig,
    my_hotkey: &str,
    metagraph: &Metagraph,
) -> SubnetResult<Vec<Allocation>> {
    store::allocate(
        &config.db_root(),
        &config.wallet_name,
        &config.wallet_hotkey,
        my_hotkey,
        metagraph,
        config.threshold,
        false,
    )
}

/// Answer one `Retrieve` challenge from the requesting validator's
/// database. Unknown validators and out-of-range keys get an empty
/// `data` back.
async fn handle_retrieve(stores: StoreMap, mut synapse: Synapse) -> Synapse {
    let validator = match synapse
        .dendrite
        .as_ref()
        .and_then(|d| d.hotkey.clone())
    {
        Some(hotkey) => hotkey,
        None => return synapse,
    };

    let db = match stores.read().await.get(&validator).cloned() {
        Some(db) => db,
        None => {
            debug!("No database for validator {}", validator);
            return synapse;
        }
    };

    let mut retrieve = match Retrieve::from_synapse(&synapse) {
        Some(retrieve) => retrieve,
        None => return synapse,
    };
    let index = match retrieve.chunk_index() {
        Some(index) => index,
        None => return synapse,
    };

    let chunk = tokio::task::spawn_blocking(move || db.get_chunk(index)).await;

    match chunk {
        Ok(Ok(Some(data))) => {
            debug!("Serving chunk {} to {}", index, validator);
            retrieve.set_data(&data);
            synapse.set_field(
                "data",
                serde_json::Value::String(retrieve.data.clone().unwrap_or_default()),
            );
        }
        Ok(Ok(None)) => debug!("Chunk {} not held for {}", index, validator),
        Ok(Err(e)) => warn!("Store read failed for {}: {}", validator, e),
        Err(e) => warn!("Store task failed for {}: {}", validator, e),
    }
    synapse
}

/// Periodically resync the metagraph and generate databases for
/// validators that arrived after startup.
async fn resync_loop(
    config: NeuronConfig,
    my_hotkey: String,
    client: SubtensorClient,
    stores: StoreMap,
) {
    let interval = std::time::Duration::from_secs(RESYNC_INTERVAL_BLOCKS * BLOCK_TIME_SECS);
    loop {
        tokio::time::sleep(interval).await;

        let metagraph = match sync_metagraph(&client, config.netuid, &config.network).await {
            Ok(metagraph) => metagraph,
            Err(e) => {
                warn!("Metagraph resync failed: {}", e);
                continue;
            }
        };

        let known: HashSet<String> = stores.read().await.keys().cloned().collect();
        let allocations = match plan_allocations(&config, &my_hotkey, &metagraph) {
            Ok(allocations) => allocations,
            Err(e) => {
                warn!("Reallocation failed: {}", e);
                continue;
            }
        };
        let fresh: Vec<Allocation> = allocations
            .into_iter()
            .filter(|alloc| !known.contains(&alloc.validator))
            .collect();
        if fresh.is_empty() {
            continue;
        }

        info!("Allocating for {} new validators", fresh.len());
        if let Err(e) = store::generate_all(&fresh, config.workers, false, false).await {
            warn!("Generation for new validators failed: {}", e);
            continue;
        }
        let mut stores = stores.write().await;
        for alloc in fresh {
            match ChunkDb::open(&alloc.path) {
                Ok(db) => {
                    stores.insert(alloc.validator.clone(), Arc::new(db));
                }
                Err(e) => warn!(
                    "Could not open new database {}: {}",
                    alloc.path.display(),
                    e
                ),
            }
        }
    }
}
