//! Axon endpoint announcement.

use crate::axon::AxonInfo;
use crate::chain::{ExtrinsicWait, PairSigner, SubtensorClient};
use crate::errors::{SubnetError, SubnetResult};
use crate::queries::SUBTENSOR_MODULE;
use crate::utils::networking;
use subxt::dynamic::Value;
use tracing::info;

/// Publish an axon endpoint on chain.
///
/// Dispatch: `serve_axon(netuid, version, ip, port, ip_type, protocol,
/// placeholder1, placeholder2)` with the ip as its integer form.
pub async fn serve_axon(
    client: &SubtensorClient,
    signer: &PairSigner,
    netuid: u16,
    axon: &AxonInfo,
    wait_for: ExtrinsicWait,
) -> SubnetResult<String> {
    let ip_int = networking::ip_to_int(&axon.ip)
        .ok_or_else(|| SubnetError::invalid_address(format!("bad axon ip {}", axon.ip)))?;

    let args = vec![
        Value::u128(netuid as u128),
        Value::u128(axon.version as u128),
        Value::u128(ip_int),
        Value::u128(axon.port as u128),
        Value::u128(axon.ip_type as u128),
        Value::u128(axon.protocol as u128),
        Value::u128(axon.placeholder1 as u128),
        Value::u128(axon.placeholder2 as u128),
    ];

    let hash = client
        .submit_extrinsic(SUBTENSOR_MODULE, "serve_axon", args, signer, wait_for)
        .await?;
    info!(
        "Announced axon {}:{} on netuid {} in {}",
        axon.ip, axon.port, netuid, hash
    );
    Ok(hash)
}
