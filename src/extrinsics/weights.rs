//! Weight submission.

use crate::chain::{ExtrinsicWait, PairSigner, SubtensorClient};
use crate::errors::{SubnetError, SubnetResult};
use crate::queries::SUBTENSOR_MODULE;
use crate::utils::weights::normalize_weights;
use subxt::dynamic::Value;
use tracing::info;

/// Normalize float scores and submit them as u16 fixed-point weights.
///
/// Dispatch: `set_weights(netuid, uids, weights, version_key)`.
pub async fn set_weights(
    client: &SubtensorClient,
    signer: &PairSigner,
    netuid: u16,
    uids: &[u64],
    scores: &[f32],
    version_key: u64,
    wait_for: ExtrinsicWait,
) -> SubnetResult<String> {
    let (weight_uids, weight_vals) =
        normalize_weights(uids, scores).map_err(|e| SubnetError::other(e.to_string()))?;
    if weight_uids.is_empty() {
        return Err(SubnetError::other("no nonzero weights to set"));
    }

    let uid_values: Vec<Value> = weight_uids
        .iter()
        .map(|uid| Value::u128(*uid as u128))
        .collect();
    let weight_values: Vec<Value> = weight_vals
        .iter()
        .map(|w| Value::u128(*w as u128))
        .collect();

    let args = vec![
        Value::u128(netuid as u128),
        Value::unnamed_composite(uid_values),
        Value::unnamed_composite(weight_values),
        Value::u128(version_key as u128),
    ];

    let hash = client
        .submit_extrinsic(SUBTENSOR_MODULE, "set_weights", args, signer, wait_for)
        .await?;
    info!(
        "Set weights for {} uids on netuid {} in {}",
        weight_uids.len(),
        netuid,
        hash
    );
    Ok(hash)
}
