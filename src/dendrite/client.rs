//! The dendrite HTTP client.
//!
//! Signs and posts synapses to axon endpoints. Timeouts and refused
//! connections come back as status-coded synapses rather than errors,
//! so callers can score unreachable peers the same way they score
//! failed ones.

use crate::axon::AxonInfo;
use crate::errors::{RequestFailed, SubnetResult};
use crate::protocol::{
    headers, signing_message, Retrieve, Synapse, TerminalInfo, PROTOCOL_VERSION,
};
use crate::wallet::Keypair;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// A validator-side client for calling axons.
pub struct Dendrite {
    keypair: Keypair,
    client: reqwest::Client,
    uuid: String,
    external_ip: Option<String>,
}

impl Dendrite {
    pub fn new(keypair: Keypair) -> SubnetResult<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(5))
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| RequestFailed::new("<client>", e.to_string()))?;

        Ok(Self {
            keypair,
            client,
            uuid: uuid::Uuid::new_v4().to_string(),
            external_ip: None,
        })
    }

    pub fn with_external_ip(mut self, ip: impl Into<String>) -> Self {
        self.external_ip = Some(ip.into());
        self
    }

    pub fn hotkey(&self) -> &str {
        self.keypair.ss58_address()
    }

    /// Call an axon with the default timeout.
    pub async fn call(
        &self,
        target: &AxonInfo,
        target_hotkey: &str,
        synapse: Synapse,
    ) -> SubnetResult<Synapse> {
        self.call_with_timeout(target, target_hotkey, synapse, DEFAULT_TIMEOUT)
            .await
    }

    /// Call an axon. Returns a synapse with dendrite status 408 on
    /// timeout and 503 when the endpoint refuses the connection; other
    /// transport failures are errors.
    pub async fn call_with_timeout(
        &self,
        target: &AxonInfo,
        target_hotkey: &str,
        mut synapse: Synapse,
        timeout: Duration,
    ) -> SubnetResult<Synapse> {
        let name = synapse.name.clone().unwrap_or_default();
        let url = format!("{}/{}", target.url(), name);

        let nonce = nanos_now();
        let body_hash = synapse.body_hash();
        let message = signing_message(nonce, self.hotkey(), target_hotkey, &body_hash);
        let signature = format!("0x{}", hex::encode(self.keypair.sign(message.as_bytes())));

        let mut dendrite_info = TerminalInfo::new();
        dendrite_info.ip = Some(
            self.external_ip
                .clone()
                .unwrap_or_else(|| "0.0.0.0".to_string()),
        );
        dendrite_info.version = Some(PROTOCOL_VERSION);
        dendrite_info.nonce = Some(nonce);
        dendrite_info.uuid = Some(self.uuid.clone());
        dendrite_info.hotkey = Some(self.hotkey().to_string());
        dendrite_info.signature = Some(signature.clone());
        synapse.dendrite = Some(dendrite_info);
        synapse.timeout = Some(timeout.as_secs_f64());
        synapse.computed_body_hash = Some(body_hash.clone());

        debug!("Calling {} at {}", name, url);
        let request = self
            .client
            .post(&url)
            .timeout(timeout)
            .header(headers::NAME, &name)
            .header(headers::TIMEOUT, timeout.as_secs_f64().to_string())
            .header(headers::BODY_HASH, &body_hash)
            .header(
                headers::DENDRITE_IP,
                self.external_ip.as_deref().unwrap_or("0.0.0.0"),
            )
            .header(headers::DENDRITE_VERSION, PROTOCOL_VERSION.to_string())
            .header(headers::DENDRITE_NONCE, nonce.to_string())
            .header(headers::DENDRITE_UUID, &self.uuid)
            .header(headers::DENDRITE_HOTKEY, self.hotkey())
            .header(headers::DENDRITE_SIGNATURE, &signature)
            .json(&synapse);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                debug!("Timeout calling {}", url);
                return Ok(error_synapse(synapse, 408, "Timeout"));
            }
            Err(e) if e.is_connect() => {
                debug!("Connection refused by {}", url);
                return Ok(error_synapse(synapse, 503, "Service unavailable"));
            }
            Err(e) => return Err(RequestFailed::new(url, e.to_string()).into()),
        };

        let http_status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RequestFailed::new(&url, e.to_string()))?;

        let mut result: Synapse = match serde_json::from_slice(&body) {
            Ok(result) => result,
            Err(e) => {
                warn!("Unparseable response from {}: {}", url, e);
                return Ok(error_synapse(
                    synapse,
                    422,
                    &format!("Malformed response: {}", e),
                ));
            }
        };

        let code = result
            .axon
            .as_ref()
            .and_then(|a| a.status_code)
            .unwrap_or(http_status.as_u16() as i32);
        let message = result
            .axon
            .as_ref()
            .and_then(|a| a.status_message.clone())
            .unwrap_or_else(|| http_status.to_string());
        let mut dendrite_info = result.dendrite.take().unwrap_or_default();
        dendrite_info.status_code = Some(code);
        dendrite_info.status_message = Some(message);
        result.dendrite = Some(dendrite_info);

        Ok(result)
    }

    /// Challenge an axon for one chunk.
    pub async fn retrieve(
        &self,
        target: &AxonInfo,
        target_hotkey: &str,
        request: Retrieve,
        timeout: Duration,
    ) -> SubnetResult<(Synapse, Option<Retrieve>)> {
        let synapse = request.into_synapse();
        let response = self
            .call_with_timeout(target, target_hotkey, synapse, timeout)
            .await?;
        let retrieve = Retrieve::from_synapse(&response);
        Ok((response, retrieve))
    }
}

fn error_synapse(mut synapse: Synapse, code: i32, message: &str) -> Synapse {
    let mut dendrite_info = synapse.dendrite.take().unwrap_or_default();
    dendrite_info.status_code = Some(code);
    dendrite_info.status_message = Some(message.to_string());
    synapse.dendrite = Some(dendrite_info);
    synapse
}

fn nanos_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
