//! Wire protocol types for miner/validator traffic.
//!
//! Messages travel as JSON synapses over HTTP, with terminal metadata
//! mirrored into `bt_header_*` headers so receivers can verify the
//! sender before parsing the body.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Route name for chunk retrieval.
pub const RETRIEVE_SYNAPSE: &str = "Retrieve";

/// Protocol version advertised in terminal headers.
pub const PROTOCOL_VERSION: u64 = 100;

/// HTTP header names used to carry terminal metadata.
pub mod headers {
    pub const NAME: &str = "name";
    pub const TIMEOUT: &str = "bt_header_timeout";
    pub const TOTAL_SIZE: &str = "total_size";
    pub const HEADER_SIZE: &str = "header_size";
    pub const BODY_HASH: &str = "computed_body_hash";
    pub const DENDRITE_IP: &str = "bt_header_dendrite_ip";
    pub const DENDRITE_PORT: &str = "bt_header_dendrite_port";
    pub const DENDRITE_VERSION: &str = "bt_header_dendrite_version";
    pub const DENDRITE_NONCE: &str = "bt_header_dendrite_nonce";
    pub const DENDRITE_UUID: &str = "bt_header_dendrite_uuid";
    pub const DENDRITE_HOTKEY: &str = "bt_header_dendrite_hotkey";
    pub const DENDRITE_SIGNATURE: &str = "bt_header_dendrite_signature";
    pub const AXON_STATUS_CODE: &str = "bt_header_axon_status_code";
    pub const AXON_STATUS_MESSAGE: &str = "bt_header_axon_status_message";
    pub const AXON_PROCESS_TIME: &str = "bt_header_axon_process_time";
    pub const AXON_VERSION: &str = "bt_header_axon_version";
    pub const AXON_NONCE: &str = "bt_header_axon_nonce";
    pub const AXON_HOTKEY: &str = "bt_header_axon_hotkey";
    pub const AXON_SIGNATURE: &str = "bt_header_axon_signature";
}

/// Hex SHA-256 of a request body.
pub fn compute_body_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// The message a dendrite signs for a request:
/// `{nonce}.{dendrite_hotkey}.{axon_hotkey}.{body_hash}`.
pub fn signing_message(
    nonce: u64,
    dendrite_hotkey: &str,
    axon_hotkey: &str,
    body_hash: &str,
) -> String {
    format!(
        "{}.{}.{}.{}",
        nonce, dendrite_hotkey, axon_hotkey, body_hash
    )
}

/// Endpoint metadata for one side of an exchange.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TerminalInfo {
    pub status_code: Option<i32>,
    pub status_message: Option<String>,
    /// Processing time in seconds.
    pub process_time: Option<f64>,
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub version: Option<u64>,
    /// Nonce for replay protection.
    pub nonce: Option<u64>,
    pub uuid: Option<String>,
    /// Hotkey SS58 address.
    pub hotkey: Option<String>,
    pub signature: Option<String>,
}

impl TerminalInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, code: i32, message: &str) -> Self {
        self.status_code = Some(code);
        self.status_message = Some(message.to_string());
        self
    }
}

/// The base message envelope.
///
/// Custom payload fields ride in `extra` and are flattened into the
/// JSON object, which keeps the envelope compatible across synapse
/// types without a schema per route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synapse {
    /// Route name.
    pub name: Option<String>,
    /// Request timeout in seconds.
    pub timeout: Option<f64>,
    pub total_size: Option<u64>,
    pub header_size: Option<u64>,
    /// Sender terminal.
    pub dendrite: Option<TerminalInfo>,
    /// Receiver terminal.
    pub axon: Option<TerminalInfo>,
    pub computed_body_hash: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Synapse {
    fn default() -> Self {
        Self {
            name: None,
            timeout: Some(12.0),
            total_size: Some(0),
            header_size: Some(0),
            dendrite: Some(TerminalInfo::default()),
            axon: Some(TerminalInfo::default()),
            computed_body_hash: None,
            extra: HashMap::new(),
        }
    }
}

impl Synapse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: f64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_success(&self) -> bool {
        self.dendrite
            .as_ref()
            .and_then(|d| d.status_code)
            .map(|code| code == 200)
            .unwrap_or(false)
    }

    pub fn is_timeout(&self) -> bool {
        self.dendrite
            .as_ref()
            .and_then(|d| d.status_code)
            .map(|code| code == 408)
            .unwrap_or(false)
    }

    pub fn set_field(&mut self, key: &str, value: serde_json::Value) {
        self.extra.insert(key.to_string(), value);
    }

    pub fn get_field(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }

    /// Hex SHA-256 of the serialized payload fields, excluding the
    /// terminals so signing and hashing do not chase each other.
    pub fn body_hash(&self) -> String {
        let mut hasher = Sha256::new();
        let mut keys: Vec<&String> = self.extra.keys().collect();
        keys.sort();
        for key in keys {
            hasher.update(key.as_bytes());
            if let Ok(bytes) = serde_json::to_vec(&self.extra[key.as_str()]) {
                hasher.update(&bytes);
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// A chunk retrieval exchange.
///
/// The validator fills `key` with the chunk index to challenge; the
/// miner answers with the chunk bytes base64 encoded in `data`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Retrieve {
    /// Chunk index, as a decimal string to match the store key format.
    pub key: String,
    /// Base64-encoded chunk bytes, set by the responding miner.
    pub data: Option<String>,
}

impl Retrieve {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data: None,
        }
    }

    /// Chunk index parsed from the key.
    pub fn chunk_index(&self) -> Option<u32> {
        self.key.parse().ok()
    }

    /// Attach raw chunk bytes as the response payload.
    pub fn set_data(&mut self, bytes: &[u8]) {
        self.data = Some(BASE64.encode(bytes));
    }

    /// Decode the response payload back into chunk bytes.
    pub fn data_bytes(&self) -> Option<Vec<u8>> {
        self.data.as_ref().and_then(|d| BASE64.decode(d).ok())
    }

    /// Wrap into a synapse envelope for transmission.
    pub fn into_synapse(self) -> Synapse {
        let mut synapse = Synapse::new().with_name(RETRIEVE_SYNAPSE);
        synapse.set_field("key", serde_json::Value::String(self.key));
        match self.data {
            Some(data) => synapse.set_field("data", serde_json::Value::String(data)),
            None => synapse.set_field("data", serde_json::Value::Null),
        }
        synapse
    }

    /// Extract from a synapse envelope. Returns `None` when the
    /// required `key` field is missing or not a string.
    pub fn from_synapse(synapse: &Synapse) -> Option<Self> {
        let key = synapse.get_field("key")?.as_str()?.to_string();
        let data = synapse
            .get_field("data")
            .and_then(|v| v.as_str())
            .map(String::from);
        Some(Self { key, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synapse_status() {
        let mut synapse = Synapse::new();
        synapse.dendrite = Some(TerminalInfo::new().with_status(200, "Success"));
        assert!(synapse.is_success());
        assert!(!synapse.is_timeout());

        synapse.dendrite = Some(TerminalInfo::new().with_status(408, "Timeout"));
        assert!(synapse.is_timeout());
        assert!(!synapse.is_success());
    }

    #[test]
    fn test_extra_fields_flatten() {
        let mut synapse = Synapse::new().with_name(RETRIEVE_SYNAPSE);
        synapse.set_field("key", serde_json::json!("42"));

        let json = serde_json::to_value(&synapse).unwrap();
        assert_eq!(json["name"], RETRIEVE_SYNAPSE);
        assert_eq!(json["key"], "42");

        let parsed: Synapse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.get_field("key"), Some(&serde_json::json!("42")));
    }

    #[test]
    fn test_retrieve_roundtrip() {
        let mut retrieve = Retrieve::new("7");
        retrieve.set_data(&[1, 2, 3, 4]);

        let synapse = retrieve.clone().into_synapse();
        let parsed = Retrieve::from_synapse(&synapse).unwrap();

        assert_eq!(parsed.key, "7");
        assert_eq!(parsed.chunk_index(), Some(7));
        assert_eq!(parsed.data_bytes().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_retrieve_missing_key() {
        let synapse = Synapse::new().with_name(RETRIEVE_SYNAPSE);
        assert!(Retrieve::from_synapse(&synapse).is_none());
    }

    #[test]
    fn test_body_hash_is_order_independent() {
        let mut a = Synapse::new();
        a.set_field("key", serde_json::json!("1"));
        a.set_field("data", serde_json::json!("abc"));

        let mut b = Synapse::new();
        b.set_field("data", serde_json::json!("abc"));
        b.set_field("key", serde_json::json!("1"));

        assert_eq!(a.body_hash(), b.body_hash());

        let mut c = Synapse::new();
        c.set_field("key", serde_json::json!("2"));
        assert_ne!(a.body_hash(), c.body_hash());
    }
}
