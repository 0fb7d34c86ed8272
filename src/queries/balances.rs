//! Account balance queries.

use crate::chain::SubtensorClient;
use crate::errors::SubnetResult;
use crate::utils::ss58;

/// Free balance of an SS58 address in RAO.
pub async fn balance(client: &SubtensorClient, address: &str) -> SubnetResult<u128> {
    let public = ss58::ss58_decode(address)?;
    let account = ss58::bytes_to_account(&public)?;
    client.account_balance(&account).await
}
