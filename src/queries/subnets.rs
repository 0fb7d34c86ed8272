//! Subnet registry queries.

use crate::chain::SubtensorClient;
use crate::errors::{ChainQueryError, SubnetResult};
use crate::utils::decode;
use subxt::dynamic::Value;

use super::metagraph::SUBTENSOR_MODULE;

/// Whether a subnet exists.
pub async fn subnet_exists(client: &SubtensorClient, netuid: u16) -> SubnetResult<bool> {
    let value = client
        .storage(
            SUBTENSOR_MODULE,
            "NetworksAdded",
            vec![Value::u128(netuid as u128)],
        )
        .await?;
    match value {
        Some(v) => decode::decode_bool(&v).map_err(|e| {
            ChainQueryError::new(SUBTENSOR_MODULE, "NetworksAdded", e.to_string()).into()
        }),
        None => Ok(false),
    }
}

/// Total number of registered subnets.
pub async fn total_networks(client: &SubtensorClient) -> SubnetResult<u16> {
    let value = client
        .storage(SUBTENSOR_MODULE, "TotalNetworks", vec![])
        .await?
        .ok_or_else(|| ChainQueryError::new(SUBTENSOR_MODULE, "TotalNetworks", "not found"))?;
    decode::decode_u16(&value).map_err(|e| {
        ChainQueryError::new(SUBTENSOR_MODULE, "TotalNetworks", e.to_string()).into()
    })
}

/// Current TAO cost of creating a subnet, in RAO.
pub async fn lock_cost(client: &SubtensorClient) -> SubnetResult<u128> {
    let value = client
        .runtime_api(
            "SubnetRegistrationRuntimeApi",
            "get_network_registration_cost",
            vec![],
        )
        .await?
        .ok_or_else(|| {
            ChainQueryError::new(
                "SubnetRegistrationRuntimeApi",
                "get_network_registration_cost",
                "no result",
            )
        })?;
    decode::decode_u128(&value)
        .or_else(|_| decode::decode_u64(&value).map(|v| v as u128))
        .map_err(|e| {
            ChainQueryError::new(
                "SubnetRegistrationRuntimeApi",
                "get_network_registration_cost",
                e.to_string(),
            )
            .into()
        })
}

/// Current burned-registration cost for a subnet, in RAO.
pub async fn burn_cost(client: &SubtensorClient, netuid: u16) -> SubnetResult<u128> {
    let value = client
        .storage(SUBTENSOR_MODULE, "Burn", vec![Value::u128(netuid as u128)])
        .await?;
    match value {
        Some(v) => decode::decode_u128(&v)
            .or_else(|_| decode::decode_u64(&v).map(|n| n as u128))
            .map_err(|e| ChainQueryError::new(SUBTENSOR_MODULE, "Burn", e.to_string()).into()),
        None => Ok(0),
    }
}

/// Minimum weights version key accepted by a subnet.
pub async fn weights_version_key(client: &SubtensorClient, netuid: u16) -> SubnetResult<u64> {
    let value = client
        .storage(
            SUBTENSOR_MODULE,
            "WeightsVersionKey",
            vec![Value::u128(netuid as u128)],
        )
        .await?;
    Ok(value
        .and_then(|v| decode::decode_u64(&v).ok())
        .unwrap_or(0))
}

/// Registration difficulty for a subnet.
pub async fn difficulty(client: &SubtensorClient, netuid: u16) -> SubnetResult<u64> {
    let value = client
        .storage(
            SUBTENSOR_MODULE,
            "Difficulty",
            vec![Value::u128(netuid as u128)],
        )
        .await?;
    Ok(value
        .and_then(|v| decode::decode_u64(&v).ok())
        .unwrap_or(0))
}
