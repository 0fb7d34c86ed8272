//! The axon HTTP server.
//!
//! Serves synapse routes over axum. Each attached handler owns one
//! route name; requests are verified against the dendrite signature in
//! the `bt_header_*` headers before the handler runs.

use crate::axon::info::{AxonConfig, AxonInfo, PROTOCOL_TCP};
use crate::errors::{SubnetError, SubnetResult};
use crate::protocol::{headers, signing_message, Synapse, TerminalInfo, PROTOCOL_VERSION};
use crate::utils::{networking, ss58};
use crate::wallet::Keypair;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use sp_core::{sr25519, Pair};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// A boxed async handler for one synapse route.
pub type SynapseHandler =
    Arc<dyn Fn(Synapse) -> Pin<Box<dyn Future<Output = Synapse> + Send>> + Send + Sync>;

/// Mutable server state shared with live connections.
#[derive(Debug, Default)]
pub struct AxonState {
    /// Hotkeys denied access.
    pub blacklist: HashSet<String>,
    /// Source addresses denied access.
    pub ip_blacklist: HashSet<IpAddr>,
}

struct AppContext {
    keypair: Keypair,
    hotkey: String,
    verify_signatures: bool,
    state: Arc<RwLock<AxonState>>,
    handlers: HashMap<String, SynapseHandler>,
}

/// A miner-side server accepting synapse requests.
pub struct Axon {
    keypair: Keypair,
    config: AxonConfig,
    state: Arc<RwLock<AxonState>>,
    handlers: HashMap<String, SynapseHandler>,
}

impl Axon {
    pub fn new(keypair: Keypair, config: AxonConfig) -> Self {
        Self {
            keypair,
            config,
            state: Arc::new(RwLock::new(AxonState::default())),
            handlers: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AxonConfig {
        &self.config
    }

    /// Register a handler under a route name. The route becomes
    /// `POST /{name}`.
    pub fn attach(&mut self, name: &str, handler: SynapseHandler) -> &mut Self {
        self.handlers.insert(name.to_string(), handler);
        self
    }

    pub async fn blacklist_hotkey(&self, hotkey: &str) {
        self.state.write().await.blacklist.insert(hotkey.to_string());
    }

    pub async fn unblacklist_hotkey(&self, hotkey: &str) {
        self.state.write().await.blacklist.remove(hotkey);
    }

    pub async fn blacklist_ip(&self, ip: IpAddr) {
        self.state.write().await.ip_blacklist.insert(ip);
    }

    /// The on-chain record advertising this server.
    pub fn info(&self, block: u64) -> AxonInfo {
        let ip = self.config.serving_ip().to_string();
        let ip_type = networking::get_ip_type(&ip);
        AxonInfo {
            block,
            version: PROTOCOL_VERSION as u32,
            ip,
            port: self.config.serving_port(),
            ip_type,
            protocol: PROTOCOL_TCP,
            placeholder1: 0,
            placeholder2: 0,
        }
    }

    /// Bind and serve until ctrl-c.
    pub async fn serve(self) -> SubnetResult<()> {
        let bind_addr = self.config.bind_addr();
        let context = Arc::new(AppContext {
            hotkey: self.keypair.ss58_address().to_string(),
            keypair: self.keypair,
            verify_signatures: self.config.verify_signatures,
            state: self.state,
            handlers: self.handlers,
        });

        let mut router = Router::new().route("/health", get(health));
        for name in context.handlers.keys() {
            router = router.route(&format!("/{}", name), post(handle_synapse));
        }
        let router = router
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any))
            .with_state(context);

        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| SubnetError::other(format!("bind {} failed: {}", bind_addr, e)))?;
        info!("Axon serving on {}", bind_addr);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SubnetError::other(format!("axon server error: {}", e)))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received, stopping axon");
    }
}

async fn health() -> &'static str {
    "OK"
}

fn header_str<'a>(header_map: &'a HeaderMap, name: &str) -> Option<&'a str> {
    header_map.get(name).and_then(|v| v.to_str().ok())
}

fn nanos_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Check the dendrite signature carried in the request headers.
///
/// The signed message is `{nonce}.{dendrite_hotkey}.{axon_hotkey}.{body_hash}`
/// where `body_hash` is the hash the sender computed over the payload.
fn verify_signature(
    header_map: &HeaderMap,
    axon_hotkey: &str,
    body_hash: &str,
) -> Result<(), String> {
    let hotkey = header_str(header_map, headers::DENDRITE_HOTKEY)
        .ok_or_else(|| "missing dendrite hotkey header".to_string())?;
    let nonce: u64 = header_str(header_map, headers::DENDRITE_NONCE)
        .ok_or_else(|| "missing dendrite nonce header".to_string())?
        .parse()
        .map_err(|_| "malformed dendrite nonce".to_string())?;
    let signature_hex = header_str(header_map, headers::DENDRITE_SIGNATURE)
        .ok_or_else(|| "missing dendrite signature header".to_string())?;

    let claimed_hash = header_str(header_map, headers::BODY_HASH).unwrap_or_default();
    if claimed_hash != body_hash {
        return Err("body hash mismatch".to_string());
    }

    let signature_hex = signature_hex.trim_start_matches("0x");
    let signature_bytes =
        hex::decode(signature_hex).map_err(|_| "malformed signature hex".to_string())?;
    let signature_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| "signature must be 64 bytes".to_string())?;
    let signature = sr25519::Signature::from_raw(signature_array);

    let public_bytes = ss58::ss58_decode(hotkey).map_err(|e| e.to_string())?;
    let public = sr25519::Public::from_raw(public_bytes);

    let message = signing_message(nonce, hotkey, axon_hotkey, body_hash);
    if sr25519::Pair::verify(&signature, message.as_bytes(), &public) {
        Ok(())
    } else {
        Err("signature verification failed".to_string())
    }
}

fn build_response(
    status: StatusCode,
    message: &str,
    context: &AppContext,
    dendrite_hotkey: Option<&str>,
    process_time: f64,
    mut synapse: Synapse,
) -> Response {
    let body_hash = synapse.body_hash();
    let nonce = nanos_now();
    let signature = context.keypair.sign(
        signing_message(
            nonce,
            &context.hotkey,
            dendrite_hotkey.unwrap_or_default(),
            &body_hash,
        )
        .as_bytes(),
    );

    let mut axon_info = TerminalInfo::new().with_status(status.as_u16() as i32, message);
    axon_info.process_time = Some(process_time);
    axon_info.version = Some(PROTOCOL_VERSION);
    axon_info.nonce = Some(nonce);
    axon_info.hotkey = Some(context.hotkey.clone());
    axon_info.signature = Some(format!("0x{}", hex::encode(signature)));
    synapse.axon = Some(axon_info.clone());
    synapse.computed_body_hash = Some(body_hash.clone());

    let body = serde_json::to_string(&synapse).unwrap_or_else(|_| "{}".to_string());

    let mut response_headers = HeaderMap::new();
    let header_values = [
        (headers::AXON_STATUS_CODE, status.as_u16().to_string()),
        (headers::AXON_STATUS_MESSAGE, message.to_string()),
        (headers::AXON_PROCESS_TIME, process_time.to_string()),
        (headers::AXON_VERSION, PROTOCOL_VERSION.to_string()),
        (headers::AXON_NONCE, nonce.to_string()),
        (headers::AXON_HOTKEY, context.hotkey.clone()),
        (
            headers::AXON_SIGNATURE,
            axon_info.signature.clone().unwrap_or_default(),
        ),
        (headers::BODY_HASH, body_hash),
    ];
    for (name, value) in header_values {
        if let Ok(value) = value.parse() {
            response_headers.insert(name, value);
        }
    }

    (status, response_headers, body).into_response()
}

async fn handle_synapse(
    State(context): State<Arc<AppContext>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    header_map: HeaderMap,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let dendrite_hotkey = header_str(&header_map, headers::DENDRITE_HOTKEY).map(String::from);

    {
        let state = context.state.read().await;
        if state.ip_blacklist.contains(&peer.ip()) {
            warn!("Rejected request from blacklisted ip {}", peer.ip());
            return build_response(
                StatusCode::FORBIDDEN,
                "Forbidden",
                &context,
                dendrite_hotkey.as_deref(),
                started.elapsed().as_secs_f64(),
                Synapse::new(),
            );
        }
        if let Some(hotkey) = dendrite_hotkey.as_deref() {
            if state.blacklist.contains(hotkey) {
                warn!("Rejected request from blacklisted hotkey {}", hotkey);
                return build_response(
                    StatusCode::FORBIDDEN,
                    "Forbidden",
                    &context,
                    dendrite_hotkey.as_deref(),
                    started.elapsed().as_secs_f64(),
                    Synapse::new(),
                );
            }
        }
    }

    let synapse: Synapse = match serde_json::from_slice(&body) {
        Ok(synapse) => synapse,
        Err(e) => {
            return build_response(
                StatusCode::BAD_REQUEST,
                &format!("Malformed synapse body: {}", e),
                &context,
                dendrite_hotkey.as_deref(),
                started.elapsed().as_secs_f64(),
                Synapse::new(),
            )
        }
    };

    if context.verify_signatures {
        if let Err(reason) = verify_signature(&header_map, &context.hotkey, &synapse.body_hash()) {
            warn!(
                "Signature rejection for {}: {}",
                dendrite_hotkey.as_deref().unwrap_or("<unknown>"),
                reason
            );
            return build_response(
                StatusCode::UNAUTHORIZED,
                &reason,
                &context,
                dendrite_hotkey.as_deref(),
                started.elapsed().as_secs_f64(),
                synapse,
            );
        }
    }

    let name = synapse
        .name
        .clone()
        .or_else(|| header_str(&header_map, headers::NAME).map(String::from))
        .unwrap_or_default();

    let handler = match context.handlers.get(&name) {
        Some(handler) => Arc::clone(handler),
        None => {
            return build_response(
                StatusCode::NOT_FOUND,
                &format!("Unknown synapse {}", name),
                &context,
                dendrite_hotkey.as_deref(),
                started.elapsed().as_secs_f64(),
                synapse,
            )
        }
    };

    debug!(
        "Handling {} from {}",
        name,
        dendrite_hotkey.as_deref().unwrap_or("<unknown>")
    );
    let result = handler(synapse).await;
    build_response(
        StatusCode::OK,
        "Success",
        &context,
        dendrite_hotkey.as_deref(),
        started.elapsed().as_secs_f64(),
        result,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_headers(keypair: &Keypair, axon_hotkey: &str, synapse: &Synapse) -> HeaderMap {
        let nonce = nanos_now();
        let body_hash = synapse.body_hash();
        let message = signing_message(nonce, keypair.ss58_address(), axon_hotkey, &body_hash);
        let signature = keypair.sign(message.as_bytes());

        let mut map = HeaderMap::new();
        map.insert(
            headers::DENDRITE_HOTKEY,
            keypair.ss58_address().parse().unwrap(),
        );
        map.insert(headers::DENDRITE_NONCE, nonce.to_string().parse().unwrap());
        map.insert(
            headers::DENDRITE_SIGNATURE,
            format!("0x{}", hex::encode(signature)).parse().unwrap(),
        );
        map.insert(headers::BODY_HASH, body_hash.parse().unwrap());
        map
    }

    #[test]
    fn test_verify_signature_accepts_valid() {
        let dendrite = Keypair::generate();
        let axon = Keypair::generate();

        let mut synapse = Synapse::new();
        synapse.set_field("key", serde_json::json!("3"));

        let header_map = request_headers(&dendrite, axon.ss58_address(), &synapse);
        assert!(
            verify_signature(&header_map, axon.ss58_address(), &synapse.body_hash()).is_ok()
        );
    }

    #[test]
    fn test_verify_signature_rejects_wrong_axon() {
        let dendrite = Keypair::generate();
        let axon = Keypair::generate();
        let other = Keypair::generate();

        let synapse = Synapse::new();
        let header_map = request_headers(&dendrite, axon.ss58_address(), &synapse);
        assert!(
            verify_signature(&header_map, other.ss58_address(), &synapse.body_hash()).is_err()
        );
    }

    #[test]
    fn test_verify_signature_rejects_tampered_body() {
        let dendrite = Keypair::generate();
        let axon = Keypair::generate();

        let synapse = Synapse::new();
        let header_map = request_headers(&dendrite, axon.ss58_address(), &synapse);

        let mut tampered = Synapse::new();
        tampered.set_field("key", serde_json::json!("99"));
        assert!(
            verify_signature(&header_map, axon.ss58_address(), &tampered.body_hash()).is_err()
        );
    }

    #[test]
    fn test_verify_signature_missing_headers() {
        let map = HeaderMap::new();
        assert!(verify_signature(&map, "axon", "hash").is_err());
    }

    #[tokio::test]
    async fn test_blacklist_updates() {
        let axon = Axon::new(Keypair::generate(), AxonConfig::default());
        axon.blacklist_hotkey("bad").await;
        assert!(axon.state.read().await.blacklist.contains("bad"));
        axon.unblacklist_hotkey("bad").await;
        assert!(!axon.state.read().await.blacklist.contains("bad"));
    }

    #[test]
    fn test_axon_info_uses_external_endpoint() {
        let config = AxonConfig::new()
            .with_port(8091)
            .with_external_ip("198.51.100.7")
            .with_external_port(9100);
        let axon = Axon::new(Keypair::generate(), config);

        let info = axon.info(42);
        assert_eq!(info.ip, "198.51.100.7");
        assert_eq!(info.port, 9100);
        assert_eq!(info.block, 42);
        assert!(info.is_serving());
    }
}
