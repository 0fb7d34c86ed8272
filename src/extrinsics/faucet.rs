//! Test-network faucet.

use crate::chain::{ExtrinsicWait, PairSigner, SubtensorClient};
use crate::errors::SubnetResult;
use crate::queries::SUBTENSOR_MODULE;
use subxt::dynamic::Value;
use tracing::info;

use super::pow;

/// Faucet proof-of-work difficulty on test chains.
const FAUCET_DIFFICULTY: u64 = 10_000;

/// Attempts per faucet solve before refreshing the block hash.
const MAX_POW_ATTEMPTS: u64 = 50_000_000;

/// Solve the faucet proof of work and claim test TAO.
///
/// Dispatch: `faucet(block_number, nonce, work)`. Only exists on
/// fast-blocks test chains; mainnet rejects it.
pub async fn run_faucet(
    client: &SubtensorClient,
    signer: &PairSigner,
    wait_for: ExtrinsicWait,
) -> SubnetResult<String> {
    let (block_number, block_hash) = client.finalized_block().await?;
    info!(
        "Solving faucet proof of work against block {}",
        block_number
    );
    let key = signer.account_id().0;
    let solution = pow::solve(
        block_number,
        block_hash,
        &key,
        FAUCET_DIFFICULTY,
        MAX_POW_ATTEMPTS,
    )?;

    let args = vec![
        Value::u128(solution.block_number as u128),
        Value::u128(solution.nonce as u128),
        Value::from_bytes(&solution.work),
    ];

    let hash = client
        .submit_extrinsic(SUBTENSOR_MODULE, "faucet", args, signer, wait_for)
        .await?;
    info!("Faucet claim included in {}", hash);
    Ok(hash)
}
