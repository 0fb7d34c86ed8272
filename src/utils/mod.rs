//! Shared utilities.

pub mod decode;
pub mod networking;
pub mod ss58;
pub mod weights;

pub use networking::{format_ws_endpoint, get_ip_type, int_to_ip, ip_str, ip_to_int};
pub use ss58::{is_valid_ss58_address, ss58_decode, ss58_encode};
pub use weights::{denormalize_weights, normalize_weights, U16_MAX};
