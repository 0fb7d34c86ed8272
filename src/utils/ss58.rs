//! SS58 address helpers.

use crate::config::SS58_FORMAT;
use crate::errors::{SubnetError, SubnetResult};
use sp_core::crypto::{AccountId32, Ss58AddressFormat, Ss58Codec};

/// Encode a 32-byte public key as an SS58 address.
pub fn ss58_encode(public_key: &[u8; 32]) -> String {
    let account = AccountId32::from(*public_key);
    account.to_ss58check_with_version(Ss58AddressFormat::custom(SS58_FORMAT))
}

/// Decode an SS58 address to a 32-byte public key.
pub fn ss58_decode(address: &str) -> SubnetResult<[u8; 32]> {
    let account = AccountId32::from_ss58check(address)
        .map_err(|e| SubnetError::invalid_address(format!("Invalid SS58 address: {}", e)))?;
    Ok(account.into())
}

/// Check whether a string parses as an SS58 address.
pub fn is_valid_ss58_address(address: &str) -> bool {
    AccountId32::from_ss58check(address).is_ok()
}

/// Build an AccountId32 from raw bytes.
pub fn bytes_to_account(bytes: &[u8]) -> SubnetResult<AccountId32> {
    if bytes.len() != 32 {
        return Err(SubnetError::invalid_address(format!(
            "Invalid public key length: expected 32, got {}",
            bytes.len()
        )));
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(bytes);
    Ok(AccountId32::from(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ss58_roundtrip() {
        let pubkey = [7u8; 32];
        let address = ss58_encode(&pubkey);
        let decoded = ss58_decode(&address).unwrap();
        assert_eq!(pubkey, decoded);
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid_ss58_address(
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
        ));
        assert!(!is_valid_ss58_address("not-an-address"));
        assert!(!is_valid_ss58_address(""));
    }

    #[test]
    fn test_bytes_to_account_length() {
        assert!(bytes_to_account(&[0u8; 16]).is_err());
        assert!(bytes_to_account(&[0u8; 32]).is_ok());
    }
}
