//! Subtensor chain client.
//!
//! Wraps a dynamic subxt client: storage queries, runtime constants, and
//! signed extrinsic submission. Queries use the dynamic API so the crate
//! does not need regenerated metadata for every runtime upgrade.

pub mod connection;
pub mod signer;

use crate::errors::{ChainQueryError, ExtrinsicFailed, SubnetResult};
use crate::utils::decode;
use sp_core::crypto::AccountId32;
use subxt::{dynamic::Value, PolkadotConfig};
use tracing::debug;

pub use connection::{connect, connect_with_budget};
pub use signer::{signer_from_seed, PairSigner};

/// How long to wait before considering an extrinsic settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtrinsicWait {
    /// Fire and forget.
    None,
    /// Wait for inclusion in a block.
    Included,
    /// Wait for finalization.
    Finalized,
}

/// Client for a subtensor chain endpoint.
pub struct SubtensorClient {
    api: subxt::OnlineClient<PolkadotConfig>,
    endpoint: String,
}

impl SubtensorClient {
    /// Connect to the given websocket endpoint, retrying transient failures.
    pub async fn connect(endpoint: impl Into<String>) -> SubnetResult<Self> {
        let endpoint = endpoint.into();
        let api = connection::connect(&endpoint).await?;
        Ok(Self { api, endpoint })
    }

    pub fn api(&self) -> &subxt::OnlineClient<PolkadotConfig> {
        &self.api
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query a storage entry at the latest block.
    pub async fn storage(
        &self,
        module: &str,
        entry: &str,
        keys: Vec<Value>,
    ) -> SubnetResult<Option<Value>> {
        let storage_query = subxt::dynamic::storage(module, entry, keys);
        let storage = self.api.storage().at_latest().await?;
        let value = storage.fetch(&storage_query).await?;

        match value {
            Some(thunk) => match thunk.to_value() {
                Ok(v) => Ok(Some(v.remove_context())),
                Err(e) => Err(ChainQueryError::new(module, entry, e.to_string()).into()),
            },
            None => Ok(None),
        }
    }

    /// Call a runtime API method at the latest block.
    pub async fn runtime_api(
        &self,
        api: &str,
        method: &str,
        params: Vec<Value>,
    ) -> SubnetResult<Option<Value>> {
        let api_call = subxt::dynamic::runtime_api_call(api, method, params);
        let result = self
            .api
            .runtime_api()
            .at_latest()
            .await?
            .call(api_call)
            .await?;

        match result.to_value() {
            Ok(v) => Ok(Some(v.remove_context())),
            Err(e) => Err(ChainQueryError::new(api, method, e.to_string()).into()),
        }
    }

    /// Free balance of an account in RAO.
    pub async fn account_balance(&self, account: &AccountId32) -> SubnetResult<u128> {
        use parity_scale_codec::Encode;

        let account_value = Value::from_bytes(account.encode());
        let value = self
            .storage("System", "Account", vec![account_value])
            .await?;

        match value {
            Some(v) => decode::decode_free_balance(&v)
                .map_err(|e| ChainQueryError::new("System", "Account", e.to_string()).into()),
            None => Ok(0),
        }
    }

    /// Sign, submit, and optionally watch an extrinsic. Returns the
    /// extrinsic hash as a hex string.
    pub async fn submit_extrinsic(
        &self,
        module: &str,
        function: &str,
        args: Vec<Value>,
        signer: &PairSigner,
        wait_for: ExtrinsicWait,
    ) -> SubnetResult<String> {
        let call_name = format!("{}.{}", module, function);
        let call = subxt::dynamic::tx(module, function, args);

        debug!("Submitting extrinsic {}", call_name);
        let mut tx_client = self
            .api
            .tx()
            .sign_and_submit_then_watch_default(&call, signer)
            .await?;

        match wait_for {
            ExtrinsicWait::Included => {
                let in_block = loop {
                    match tx_client.next().await {
                        Some(Ok(status)) => match status {
                            subxt::tx::TxStatus::InBestBlock(in_block)
                            | subxt::tx::TxStatus::InFinalizedBlock(in_block) => break in_block,
                            subxt::tx::TxStatus::Error { message } => {
                                return Err(ExtrinsicFailed::new(call_name, message).into())
                            }
                            subxt::tx::TxStatus::Invalid { message } => {
                                return Err(ExtrinsicFailed::new(
                                    call_name,
                                    format!("invalid: {}", message),
                                )
                                .into())
                            }
                            subxt::tx::TxStatus::Dropped { message } => {
                                return Err(ExtrinsicFailed::new(
                                    call_name,
                                    format!("dropped: {}", message),
                                )
                                .into())
                            }
                            _ => continue,
                        },
                        Some(Err(e)) => {
                            return Err(ExtrinsicFailed::new(call_name, e.to_string()).into())
                        }
                        None => {
                            return Err(ExtrinsicFailed::new(
                                call_name,
                                "status stream ended unexpectedly",
                            )
                            .into())
                        }
                    }
                };
                Ok(format!("{:?}", in_block.extrinsic_hash()))
            }
            ExtrinsicWait::Finalized => {
                let finalized = tx_client.wait_for_finalized_success().await?;
                Ok(format!("{:?}", finalized.extrinsic_hash()))
            }
            ExtrinsicWait::None => Ok(format!("{:?}", tx_client.extrinsic_hash())),
        }
    }

    /// Latest finalized block number and hash.
    pub async fn finalized_block(&self) -> SubnetResult<(u64, sp_core::H256)> {
        let finalized_head = self.api.backend().latest_finalized_block_ref().await?;
        let hash = finalized_head.hash();
        let header = self.api.backend().block_header(hash).await?;

        match header {
            Some(header) => Ok((header.number as u64, sp_core::H256(hash.0))),
            None => {
                Err(ChainQueryError::new("System", "BlockHeader", "header not found").into())
            }
        }
    }

    /// Latest finalized block number.
    pub async fn block_number(&self) -> SubnetResult<u64> {
        let finalized_head = self.api.backend().latest_finalized_block_ref().await?;
        let header = self
            .api
            .backend()
            .block_header(finalized_head.hash())
            .await?;

        match header {
            Some(header) => Ok(header.number as u64),
            None => {
                Err(ChainQueryError::new("System", "BlockHeader", "header not found").into())
            }
        }
    }
}
