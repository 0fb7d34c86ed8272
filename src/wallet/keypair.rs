//! SR25519 keypair wrapper used for signing and verification.

#![allow(unused_assignments)]

use crate::config::SS58_FORMAT;
use crate::wallet::mnemonic::{Mnemonic, MnemonicError};
use sp_core::{
    crypto::{Ss58AddressFormat, Ss58Codec},
    sr25519, Pair,
};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Errors that can occur during keypair operations.
#[derive(Debug, Error)]
pub enum KeypairError {
    #[error("Invalid seed length: expected 32 bytes, got {0}")]
    InvalidSeedLength(usize),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Mnemonic error: {0}")]
    Mnemonic(#[from] MnemonicError),

    #[error("Key derivation error: {0}")]
    DerivationError(String),
}

/// An SR25519 keypair.
///
/// The inner `sr25519::Pair` does not implement `Zeroize`; only the cached
/// public key is wiped on drop. Keep instances short-lived where possible.
#[derive(ZeroizeOnDrop)]
pub struct Keypair {
    #[zeroize(skip)]
    pair: sr25519::Pair,
    public_key: [u8; 32],
    #[zeroize(skip)]
    ss58_address: String,
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self {
            pair: self.pair.clone(),
            public_key: self.public_key,
            ss58_address: self.ss58_address.clone(),
        }
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("ss58_address", &self.ss58_address)
            .finish()
    }
}

impl Keypair {
    fn from_pair(pair: sr25519::Pair) -> Self {
        let public = pair.public();
        let public_key: [u8; 32] = public.0;
        let ss58_address =
            public.to_ss58check_with_version(Ss58AddressFormat::custom(SS58_FORMAT));
        Self {
            pair,
            public_key,
            ss58_address,
        }
    }

    /// Generate a random keypair.
    pub fn generate() -> Self {
        let (pair, _) = sr25519::Pair::generate();
        Self::from_pair(pair)
    }

    /// Derive a keypair from a BIP39 mnemonic phrase.
    pub fn from_mnemonic(mnemonic: &str, password: Option<&str>) -> Result<Self, KeypairError> {
        let mnemonic_obj = Mnemonic::from_phrase(mnemonic)?;
        Self::from_mnemonic_obj(&mnemonic_obj, password)
    }

    /// Derive a keypair from a parsed mnemonic, via substrate-standard derivation.
    pub fn from_mnemonic_obj(
        mnemonic: &Mnemonic,
        password: Option<&str>,
    ) -> Result<Self, KeypairError> {
        let pass = password.unwrap_or("");
        let (pair, _seed) = sr25519::Pair::from_phrase(mnemonic.phrase(), Some(pass))
            .map_err(|e| KeypairError::DerivationError(format!("{:?}", e)))?;
        Ok(Self::from_pair(pair))
    }

    /// Derive a keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8]) -> Result<Self, KeypairError> {
        if seed.len() != 32 {
            return Err(KeypairError::InvalidSeedLength(seed.len()));
        }
        let mut seed_arr = [0u8; 32];
        seed_arr.copy_from_slice(seed);
        let pair = sr25519::Pair::from_seed(&seed_arr);
        seed_arr.zeroize();
        Ok(Self::from_pair(pair))
    }

    /// Derive a keypair from a substrate URI such as `//Alice`.
    pub fn from_uri(uri: &str) -> Result<Self, KeypairError> {
        let pair = sr25519::Pair::from_string(uri, None)
            .map_err(|e| KeypairError::InvalidUri(format!("{:?}", e)))?;
        Ok(Self::from_pair(pair))
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }

    pub fn ss58_address(&self) -> &str {
        &self.ss58_address
    }

    /// The underlying pair, for integration with subxt signing.
    pub fn pair(&self) -> &sr25519::Pair {
        &self.pair
    }

    /// Sign a message, returning the 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.pair.sign(message).0
    }

    /// Verify a signature made by this keypair.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        Self::verify_with_public(message, signature, &self.public_key)
    }

    /// Verify a signature against an arbitrary public key.
    pub fn verify_with_public(message: &[u8], signature: &[u8], public_key: &[u8; 32]) -> bool {
        if signature.len() != 64 {
            return false;
        }
        let mut sig_arr = [0u8; 64];
        sig_arr.copy_from_slice(signature);

        let sig = sr25519::Signature::from_raw(sig_arr);
        let public = sr25519::Public::from_raw(*public_key);
        sr25519::Pair::verify(&sig, message, &public)
    }

    /// Raw keypair bytes for keyfile storage (64 bytes: seed + public key).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pair.to_raw_vec()
    }

    /// Restore a keypair from keyfile bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        let pair = sr25519::Pair::from_seed_slice(bytes)
            .map_err(|e| KeypairError::DerivationError(format!("{:?}", e)))?;
        Ok(Self::from_pair(pair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate() {
        let keypair = Keypair::generate();
        assert_eq!(keypair.public_key().len(), 32);
        assert!(keypair.ss58_address().starts_with('5'));
    }

    #[test]
    fn test_from_mnemonic_deterministic() {
        let a = Keypair::from_mnemonic(TEST_PHRASE, None).unwrap();
        let b = Keypair::from_mnemonic(TEST_PHRASE, None).unwrap();
        assert_eq!(a.ss58_address(), b.ss58_address());

        let c = Keypair::from_mnemonic(TEST_PHRASE, Some("password")).unwrap();
        assert_ne!(a.public_key(), c.public_key());
    }

    #[test]
    fn test_from_seed() {
        let keypair = Keypair::from_seed(&[42u8; 32]).unwrap();
        let again = Keypair::from_seed(&[42u8; 32]).unwrap();
        assert_eq!(keypair.public_key(), again.public_key());

        assert!(Keypair::from_seed(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_from_uri() {
        let alice = Keypair::from_uri("//Alice").unwrap();
        let bob = Keypair::from_uri("//Bob").unwrap();
        assert_ne!(alice.ss58_address(), bob.ss58_address());
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = Keypair::generate();
        let message = b"challenge";

        let signature = keypair.sign(message);
        assert!(keypair.verify(message, &signature));
        assert!(!keypair.verify(b"other", &signature));
        assert!(!keypair.verify(message, &[0u8; 32]));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let original = Keypair::generate();
        let restored = Keypair::from_bytes(&original.to_bytes()).unwrap();
        assert_eq!(original.public_key(), restored.public_key());

        let sig = original.sign(b"msg");
        assert!(restored.verify(b"msg", &sig));
    }
}
