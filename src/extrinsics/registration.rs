//! Neuron registration.

use crate::chain::{ExtrinsicWait, PairSigner, SubtensorClient};
use crate::errors::SubnetResult;
use crate::queries::SUBTENSOR_MODULE;
use crate::utils::ss58;
use parity_scale_codec::Encode;
use sp_core::crypto::AccountId32;
use subxt::dynamic::Value;
use tracing::info;

use super::pow::PowSolution;

/// Register a hotkey on a subnet with a proof of work.
///
/// Dispatch: `register(netuid, block_number, nonce, work, hotkey, coldkey)`.
pub async fn register(
    client: &SubtensorClient,
    signer: &PairSigner,
    netuid: u16,
    solution: &PowSolution,
    hotkey: &AccountId32,
    coldkey: &AccountId32,
    wait_for: ExtrinsicWait,
) -> SubnetResult<String> {
    let args = vec![
        Value::u128(netuid as u128),
        Value::u128(solution.block_number as u128),
        Value::u128(solution.nonce as u128),
        Value::from_bytes(&solution.work),
        Value::from_bytes(hotkey.encode()),
        Value::from_bytes(coldkey.encode()),
    ];

    let hash = client
        .submit_extrinsic(SUBTENSOR_MODULE, "register", args, signer, wait_for)
        .await?;
    info!("Registered on netuid {} in {}", netuid, hash);
    Ok(hash)
}

/// Register a hotkey on a subnet by burning the registration cost.
///
/// Dispatch: `burned_register(netuid, hotkey)`.
pub async fn burned_register(
    client: &SubtensorClient,
    signer: &PairSigner,
    netuid: u16,
    hotkey: &AccountId32,
    wait_for: ExtrinsicWait,
) -> SubnetResult<String> {
    let args = vec![
        Value::u128(netuid as u128),
        Value::from_bytes(hotkey.encode()),
    ];

    let hash = client
        .submit_extrinsic(SUBTENSOR_MODULE, "burned_register", args, signer, wait_for)
        .await?;
    info!("Burned-registered on netuid {} in {}", netuid, hash);
    Ok(hash)
}

/// Whether a hotkey is registered on a subnet.
pub async fn is_registered(
    client: &SubtensorClient,
    netuid: u16,
    hotkey: &str,
) -> SubnetResult<bool> {
    let key_bytes = ss58::ss58_decode(hotkey)?;
    let value = client
        .storage(
            SUBTENSOR_MODULE,
            "Uids",
            vec![Value::u128(netuid as u128), Value::from_bytes(key_bytes)],
        )
        .await?;
    Ok(value.is_some())
}
