//! Axon endpoint metadata and server configuration.

use crate::utils::networking;
use serde::{Deserialize, Serialize};

/// Default port an axon listens on.
pub const DEFAULT_AXON_PORT: u16 = 8091;

/// TCP protocol marker in on-chain axon records.
pub const PROTOCOL_TCP: u8 = 4;

/// An axon endpoint as published on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AxonInfo {
    /// Block at which the endpoint was registered.
    pub block: u64,
    pub version: u32,
    pub ip: String,
    pub port: u16,
    /// 4 or 6.
    pub ip_type: u8,
    pub protocol: u8,
    pub placeholder1: u8,
    pub placeholder2: u8,
}

impl AxonInfo {
    /// Whether the record points at a reachable endpoint.
    pub fn is_serving(&self) -> bool {
        self.port != 0 && !self.ip.is_empty() && self.ip != "0.0.0.0" && self.ip != "::"
    }

    /// `http://ip:port` base URL for dendrite calls.
    pub fn url(&self) -> String {
        format!(
            "http://{}",
            networking::ip_str(&self.ip, self.port, self.ip_type)
        )
    }
}

/// Configuration for an axon server.
#[derive(Debug, Clone)]
pub struct AxonConfig {
    /// Address to bind on.
    pub ip: String,
    /// Port to bind on.
    pub port: u16,
    /// IP advertised on chain, when it differs from the bind address.
    pub external_ip: Option<String>,
    /// Port advertised on chain, when it differs from the bind port.
    pub external_port: Option<u16>,
    /// Reject requests whose dendrite signature does not verify.
    pub verify_signatures: bool,
}

impl Default for AxonConfig {
    fn default() -> Self {
        Self {
            ip: "0.0.0.0".to_string(),
            port: DEFAULT_AXON_PORT,
            external_ip: None,
            external_port: None,
            verify_signatures: true,
        }
    }
}

impl AxonConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = ip.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_external_ip(mut self, ip: impl Into<String>) -> Self {
        self.external_ip = Some(ip.into());
        self
    }

    pub fn with_external_port(mut self, port: u16) -> Self {
        self.external_port = Some(port);
        self
    }

    pub fn with_verify_signatures(mut self, verify: bool) -> Self {
        self.verify_signatures = verify;
        self
    }

    /// IP to publish on chain.
    pub fn serving_ip(&self) -> &str {
        self.external_ip.as_deref().unwrap_or(&self.ip)
    }

    /// Port to publish on chain.
    pub fn serving_port(&self) -> u16 {
        self.external_port.unwrap_or(self.port)
    }

    /// Bind address in `ip:port` form.
    pub fn bind_addr(&self) -> String {
        networking::ip_str(&self.ip, self.port, networking::get_ip_type(&self.ip))
    }
}
