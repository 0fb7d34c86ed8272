//! Metagraph sync from chain storage.

use crate::axon::AxonInfo;
use crate::chain::SubtensorClient;
use crate::errors::{ChainQueryError, SubnetResult};
use crate::metagraph::Metagraph;
use crate::utils::{decode, networking, ss58};
use subxt::dynamic::Value;
use tracing::{debug, warn};

pub const SUBTENSOR_MODULE: &str = "SubtensorModule";

/// Number of registered neurons in a subnet.
pub async fn subnet_n(client: &SubtensorClient, netuid: u16) -> SubnetResult<u16> {
    let value = client
        .storage(
            SUBTENSOR_MODULE,
            "SubnetworkN",
            vec![Value::u128(netuid as u128)],
        )
        .await?;
    match value {
        Some(v) => decode::decode_u16(&v)
            .map_err(|e| ChainQueryError::new(SUBTENSOR_MODULE, "SubnetworkN", e.to_string()).into()),
        None => Ok(0),
    }
}

/// Hotkey registered at a uid.
pub async fn hotkey_for_uid(
    client: &SubtensorClient,
    netuid: u16,
    uid: u16,
) -> SubnetResult<Option<String>> {
    let value = client
        .storage(
            SUBTENSOR_MODULE,
            "Keys",
            vec![Value::u128(netuid as u128), Value::u128(uid as u128)],
        )
        .await?;
    match value {
        Some(v) => {
            let bytes = decode::decode_account_bytes(&v).map_err(|e| {
                ChainQueryError::new(SUBTENSOR_MODULE, "Keys", e.to_string())
            })?;
            Ok(Some(ss58::ss58_encode(&bytes)))
        }
        None => Ok(None),
    }
}

/// Coldkey owning a hotkey.
pub async fn owner(client: &SubtensorClient, hotkey: &str) -> SubnetResult<Option<String>> {
    let key_bytes = ss58::ss58_decode(hotkey)?;
    let value = client
        .storage(
            SUBTENSOR_MODULE,
            "Owner",
            vec![Value::from_bytes(key_bytes)],
        )
        .await?;
    match value {
        Some(v) => {
            let bytes = decode::decode_account_bytes(&v).map_err(|e| {
                ChainQueryError::new(SUBTENSOR_MODULE, "Owner", e.to_string())
            })?;
            Ok(Some(ss58::ss58_encode(&bytes)))
        }
        None => Ok(None),
    }
}

/// Total stake on a hotkey, in RAO.
pub async fn total_hotkey_stake(client: &SubtensorClient, hotkey: &str) -> SubnetResult<u64> {
    let key_bytes = ss58::ss58_decode(hotkey)?;
    let value = client
        .storage(
            SUBTENSOR_MODULE,
            "TotalHotkeyStake",
            vec![Value::from_bytes(key_bytes)],
        )
        .await?;
    Ok(value
        .and_then(|v| decode::decode_u64(&v).ok())
        .unwrap_or(0))
}

/// Served axon record for a hotkey on a subnet.
pub async fn axon_for_hotkey(
    client: &SubtensorClient,
    netuid: u16,
    hotkey: &str,
) -> SubnetResult<Option<AxonInfo>> {
    let key_bytes = ss58::ss58_decode(hotkey)?;
    let value = client
        .storage(
            SUBTENSOR_MODULE,
            "Axons",
            vec![Value::u128(netuid as u128), Value::from_bytes(key_bytes)],
        )
        .await?;

    match value {
        Some(v) => match decode::decode_axon_fields(&v) {
            Ok((block, version, ip, port, ip_type, protocol)) => Ok(Some(AxonInfo {
                block,
                version,
                ip: networking::int_to_ip(ip, ip_type),
                port,
                ip_type,
                protocol,
                placeholder1: 0,
                placeholder2: 0,
            })),
            Err(e) => {
                warn!("Undecodable axon record for {}: {}", hotkey, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Validator permit for a uid.
pub async fn validator_permit(
    client: &SubtensorClient,
    netuid: u16,
    uid: u16,
) -> SubnetResult<bool> {
    let value = client
        .storage(
            SUBTENSOR_MODULE,
            "ValidatorPermit",
            vec![Value::u128(netuid as u128), Value::u128(uid as u128)],
        )
        .await?;
    Ok(value
        .and_then(|v| decode::decode_bool(&v).ok())
        .unwrap_or(false))
}

/// Last weight-update block for a uid.
pub async fn last_update(client: &SubtensorClient, netuid: u16, uid: u16) -> SubnetResult<u64> {
    let value = client
        .storage(
            SUBTENSOR_MODULE,
            "LastUpdate",
            vec![Value::u128(netuid as u128), Value::u128(uid as u128)],
        )
        .await?;
    Ok(value
        .and_then(|v| decode::decode_u64(&v).ok())
        .unwrap_or(0))
}

/// Build a full metagraph snapshot from chain storage.
pub async fn sync_metagraph(
    client: &SubtensorClient,
    netuid: u16,
    network: &str,
) -> SubnetResult<Metagraph> {
    let mut metagraph = Metagraph::new(netuid, network);
    metagraph.block = client.block_number().await?;
    metagraph.n = subnet_n(client, netuid).await?;

    for uid in 0..metagraph.n {
        let hotkey = match hotkey_for_uid(client, netuid, uid).await? {
            Some(hotkey) => hotkey,
            None => {
                // A registered count without a key entry means the sync
                // raced a deregistration; skip the hole.
                debug!("No hotkey at uid {} on netuid {}", uid, netuid);
                continue;
            }
        };

        let coldkey = owner(client, &hotkey).await?.unwrap_or_default();
        let stake = total_hotkey_stake(client, &hotkey).await?;
        let axon = axon_for_hotkey(client, netuid, &hotkey).await?;
        let permit = validator_permit(client, netuid, uid).await?;
        let updated = last_update(client, netuid, uid).await?;

        metagraph.uids.push(uid);
        metagraph.hotkeys.push(hotkey);
        metagraph.coldkeys.push(coldkey);
        metagraph.stake.push(stake);
        metagraph.axons.push(axon);
        metagraph.validator_permit.push(permit);
        metagraph.last_update.push(updated);
    }

    debug!(
        "Synced metagraph netuid={} n={} block={}",
        netuid, metagraph.n, metagraph.block
    );
    Ok(metagraph)
}
