//! Weight normalization for on-chain submission.
//!
//! The chain expects weights as `Vec<u16>` fixed point where `u16::MAX`
//! represents 1.0, paired with `Vec<u16>` uids.

use anyhow::Result;

/// Scale factor: u16::MAX represents a weight of 1.0
pub const U16_MAX: u16 = 65535;

/// L1-normalize float scores and convert to the chain's u16 fixed point.
///
/// Zero-valued entries are dropped from the output. If every score is zero
/// the weight is spread evenly across all uids.
pub fn normalize_weights(uids: &[u64], weights: &[f32]) -> Result<(Vec<u16>, Vec<u16>)> {
    if uids.len() != weights.len() {
        return Err(anyhow::anyhow!(
            "uids and weights must have the same length"
        ));
    }

    if weights.is_empty() {
        return Ok((vec![], vec![]));
    }

    let sum: f32 = weights.iter().sum();
    let normalized: Vec<f32> = if sum.abs() > f32::EPSILON {
        weights.iter().map(|w| w / sum).collect()
    } else {
        let count = weights.len() as f32;
        vec![1.0 / count; weights.len()]
    };

    let scale = U16_MAX as f32;
    let mut out_uids = Vec::new();
    let mut out_vals = Vec::new();
    for (uid, w) in uids.iter().zip(normalized.iter()) {
        let uid = u16::try_from(*uid)
            .map_err(|_| anyhow::anyhow!("uid {} does not fit into u16", uid))?;
        let val = (w * scale) as u16;
        if val > 0 {
            out_uids.push(uid);
            out_vals.push(val);
        }
    }

    Ok((out_uids, out_vals))
}

/// Convert fixed-point weights back to floats.
pub fn denormalize_weights(weight_vals: &[u16]) -> Vec<f32> {
    let scale = U16_MAX as f64;
    weight_vals
        .iter()
        .map(|val| (*val as f64 / scale) as f32)
        .collect()
}
