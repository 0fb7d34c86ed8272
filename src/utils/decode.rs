//! Decoding helpers for dynamic chain values.
//!
//! Dynamic storage queries come back as `subxt::dynamic::Value`. Rather than
//! pinning the runtime's type registry we scan the value's debug rendering
//! for the primitive tags, which survives metadata upgrades that reshuffle
//! type ids but keep the field layout.

use anyhow::{anyhow, Result};
use subxt::dynamic::Value;

fn parse_numeric(value: &Value, tag: &str) -> Result<u128> {
    let s = format!("{:?}", value);
    if let Some(i) = s.find(&format!("{}(", tag)) {
        let mut j = i + tag.len() + 1;
        let bytes = s.as_bytes();
        let mut num: u128 = 0;
        let mut found = false;
        while j < bytes.len() {
            let b = bytes[j];
            if b.is_ascii_digit() {
                found = true;
                num = num * 10 + (b - b'0') as u128;
                j += 1;
            } else {
                break;
            }
        }
        if found {
            return Ok(num);
        }
    }
    Err(anyhow!("Failed to parse {} from {:?}", tag, value))
}

/// Decode a u128 primitive.
pub fn decode_u128(value: &Value) -> Result<u128> {
    parse_numeric(value, "U128")
}

/// Decode a u64, accepting wider encodings.
pub fn decode_u64(value: &Value) -> Result<u64> {
    let n = parse_numeric(value, "U64").or_else(|_| parse_numeric(value, "U128"))?;
    u64::try_from(n).map_err(|_| anyhow!("value does not fit into u64"))
}

/// Decode a u16, accepting wider encodings.
pub fn decode_u16(value: &Value) -> Result<u16> {
    let n = parse_numeric(value, "U16")
        .or_else(|_| parse_numeric(value, "U64"))
        .or_else(|_| parse_numeric(value, "U128"))?;
    u16::try_from(n).map_err(|_| anyhow!("value does not fit into u16"))
}

/// Decode a bool; some runtimes surface booleans as U8(0/1).
pub fn decode_bool(value: &Value) -> Result<bool> {
    let s = format!("{:?}", value);
    if s.contains("true") {
        Ok(true)
    } else if s.contains("false") {
        Ok(false)
    } else {
        let n = parse_numeric(value, "U8")?;
        Ok(n != 0)
    }
}

/// Extract the next primitive of `tag` starting at `from`, returning the
/// parsed value and the scan position after it.
fn extract_numeric(s: &str, from: usize, tag: &str) -> Option<(u128, usize)> {
    let needle = format!("{}(", tag);
    let pos = s[from..].find(&needle)? + from;
    let start = pos + needle.len();
    let end = s[start..].find(')')? + start;
    let num = s[start..end].trim().parse::<u128>().ok()?;
    Some((num, end))
}

/// Decode a 32-byte account id from a composite of byte primitives.
pub fn decode_account_bytes(value: &Value) -> Result<[u8; 32]> {
    let s = format!("{:?}", value);
    let mut bytes = Vec::with_capacity(32);

    // Account ids render as 32 consecutive byte primitives; the tag width
    // depends on how the metadata types the array elements.
    for tag in ["U8", "U128"] {
        bytes.clear();
        let mut pos = 0;
        while bytes.len() < 32 {
            match extract_numeric(&s, pos, tag) {
                Some((num, end)) if num <= 255 => {
                    bytes.push(num as u8);
                    pos = end;
                }
                _ => break,
            }
        }
        if bytes.len() == 32 {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&bytes);
            return Ok(arr);
        }
    }

    Err(anyhow!("No 32-byte sequence in {:?}", value))
}

/// Decode the on-chain AxonInfo struct.
///
/// Field layout: block u64, version u32, ip u128, port u16, ip_type u8,
/// protocol u8, placeholder1 u8, placeholder2 u8.
pub fn decode_axon_fields(value: &Value) -> Result<(u64, u32, u128, u16, u8, u8)> {
    let s = format!("{:?}", value);

    let block = extract_numeric(&s, 0, "U64").ok_or_else(|| anyhow!("AxonInfo: missing block"))?;
    let version =
        extract_numeric(&s, block.1, "U32").ok_or_else(|| anyhow!("AxonInfo: missing version"))?;
    let ip =
        extract_numeric(&s, version.1, "U128").ok_or_else(|| anyhow!("AxonInfo: missing ip"))?;
    let port = extract_numeric(&s, ip.1, "U16").ok_or_else(|| anyhow!("AxonInfo: missing port"))?;
    let ip_type =
        extract_numeric(&s, port.1, "U8").ok_or_else(|| anyhow!("AxonInfo: missing ip_type"))?;
    let protocol = extract_numeric(&s, ip_type.1, "U8")
        .ok_or_else(|| anyhow!("AxonInfo: missing protocol"))?;

    Ok((
        block.0 as u64,
        version.0 as u32,
        ip.0,
        port.0 as u16,
        ip_type.0 as u8,
        protocol.0 as u8,
    ))
}

/// Extract the `free` balance from a System.Account value.
///
/// AccountInfo renders its balances in declaration order, so the first u128
/// after the nonce/consumers/providers/sufficients block is `data.free`.
pub fn decode_free_balance(value: &Value) -> Result<u128> {
    let s = format!("{:?}", value);
    // nonce, consumers, providers, sufficients are u32
    let mut pos = 0;
    for _ in 0..4 {
        if let Some((_, end)) = extract_numeric(&s, pos, "U32") {
            pos = end;
        }
    }
    extract_numeric(&s, pos, "U128")
        .map(|(n, _)| n)
        .ok_or_else(|| anyhow!("AccountInfo: missing free balance"))
}
