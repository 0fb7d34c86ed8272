//! Networking utilities for axon endpoints and chain URLs.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Convert an on-chain IP integer to its string form.
pub fn int_to_ip(ip_int: u128, ip_type: u8) -> String {
    match ip_type {
        4 => {
            let ip = (ip_int as u32).to_be_bytes();
            Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]).to_string()
        }
        6 => {
            let bytes = ip_int.to_be_bytes();
            Ipv6Addr::from(bytes).to_string()
        }
        _ => "0.0.0.0".to_string(),
    }
}

/// Convert an IP string to the on-chain integer form.
pub fn ip_to_int(ip: &str) -> Option<u128> {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => Some(u32::from_be_bytes(v4.octets()) as u128),
        Ok(IpAddr::V6(v6)) => Some(u128::from_be_bytes(v6.octets())),
        Err(_) => None,
    }
}

/// IP version (4 or 6) of an address string, defaulting to 4.
pub fn get_ip_type(ip: &str) -> u8 {
    if ip.parse::<Ipv4Addr>().is_ok() {
        4
    } else if ip.parse::<Ipv6Addr>().is_ok() {
        6
    } else {
        4
    }
}

/// Format an IP with port, bracketing IPv6.
pub fn ip_str(ip: &str, port: u16, ip_type: u8) -> String {
    match ip_type {
        6 => format!("[{}]:{}", ip, port),
        _ => format!("{}:{}", ip, port),
    }
}

/// Normalize a chain endpoint to a full ws:// or wss:// URL.
pub fn format_ws_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
        return endpoint.to_string();
    }
    if endpoint.contains(":443") || endpoint.contains("opentensor") {
        format!("wss://{}", endpoint)
    } else {
        format!("ws://{}", endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_conversion() {
        let ip_int = 0x7F000001u128;
        let s = int_to_ip(ip_int, 4);
        assert_eq!(s, "127.0.0.1");
        assert_eq!(ip_to_int(&s).unwrap(), ip_int);
    }

    #[test]
    fn test_ipv6_roundtrip() {
        let addr = "::1";
        let n = ip_to_int(addr).unwrap();
        assert_eq!(int_to_ip(n, 6), "::1");
        assert_eq!(get_ip_type(addr), 6);
    }

    #[test]
    fn test_ws_endpoint_format() {
        assert_eq!(format_ws_endpoint("127.0.0.1:9946"), "ws://127.0.0.1:9946");
        assert_eq!(
            format_ws_endpoint("entrypoint-finney.opentensor.ai:443"),
            "wss://entrypoint-finney.opentensor.ai:443"
        );
        assert_eq!(format_ws_endpoint("wss://example.com"), "wss://example.com");
    }
}
