//! Subnet creation.

use crate::chain::{ExtrinsicWait, PairSigner, SubtensorClient};
use crate::errors::SubnetResult;
use crate::queries::SUBTENSOR_MODULE;
use parity_scale_codec::Encode;
use sp_core::crypto::AccountId32;
use subxt::dynamic::Value;
use tracing::info;

/// Create a new subnet, locking the current lock cost.
///
/// Dispatch: `register_network(hotkey, mechid)`.
pub async fn register_network(
    client: &SubtensorClient,
    signer: &PairSigner,
    hotkey: &AccountId32,
    mechid: u16,
    wait_for: ExtrinsicWait,
) -> SubnetResult<String> {
    let args = vec![
        Value::from_bytes(hotkey.encode()),
        Value::u128(mechid as u128),
    ];

    let hash = client
        .submit_extrinsic(SUBTENSOR_MODULE, "register_network", args, signer, wait_for)
        .await?;
    info!("Registered network in {}", hash);
    Ok(hash)
}
