//! BIP39 mnemonic generation and recovery.

#![allow(unused_assignments)]

use bip39::Mnemonic as Bip39Mnemonic;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Errors that can occur during mnemonic operations.
#[derive(Debug, Error)]
pub enum MnemonicError {
    #[error("Invalid word count: {0}. Must be 12, 15, 18, 21, or 24")]
    InvalidWordCount(usize),

    #[error("Invalid mnemonic phrase: {0}")]
    InvalidPhrase(String),

    #[error("Entropy generation failed: {0}")]
    EntropyError(String),
}

/// A BIP39 mnemonic phrase, zeroed from memory on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct Mnemonic {
    #[zeroize(skip)]
    inner: Bip39Mnemonic,
    phrase: String,
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never expose the phrase in debug output
        f.debug_struct("Mnemonic")
            .field("word_count", &self.word_count())
            .finish()
    }
}

impl Mnemonic {
    /// Generate a new 12-word mnemonic.
    pub fn generate() -> Self {
        Self::generate_with_words(12).unwrap_or_else(|_| unreachable!("12 words is always valid"))
    }

    /// Generate a mnemonic with 12, 15, 18, 21 or 24 words.
    pub fn generate_with_words(word_count: usize) -> Result<Self, MnemonicError> {
        let entropy_bits = match word_count {
            12 => 128,
            15 => 160,
            18 => 192,
            21 => 224,
            24 => 256,
            _ => return Err(MnemonicError::InvalidWordCount(word_count)),
        };

        let mut entropy = vec![0u8; entropy_bits / 8];
        {
            use rand::RngCore;
            rand::rng().fill_bytes(&mut entropy);
        }

        let inner = Bip39Mnemonic::from_entropy(&entropy)
            .map_err(|e| MnemonicError::EntropyError(e.to_string()))?;
        entropy.zeroize();

        let phrase = inner.to_string();
        Ok(Self { inner, phrase })
    }

    /// Parse an existing phrase.
    pub fn from_phrase(phrase: &str) -> Result<Self, MnemonicError> {
        let normalized = phrase
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let inner = Bip39Mnemonic::parse_normalized(&normalized)
            .map_err(|e| MnemonicError::InvalidPhrase(e.to_string()))?;
        let phrase = inner.to_string();
        Ok(Self { inner, phrase })
    }

    /// Validate a phrase without constructing a Mnemonic.
    pub fn validate(phrase: &str) -> bool {
        Self::from_phrase(phrase).is_ok()
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn word_count(&self) -> usize {
        self.phrase.split_whitespace().count()
    }

    /// Derive the 64-byte BIP39 seed.
    pub fn to_seed(&self, password: Option<&str>) -> [u8; 64] {
        self.inner.to_seed(password.unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_word_counts() {
        assert_eq!(Mnemonic::generate().word_count(), 12);
        assert_eq!(Mnemonic::generate_with_words(24).unwrap().word_count(), 24);
        assert!(Mnemonic::generate_with_words(13).is_err());
    }

    #[test]
    fn test_from_phrase() {
        let mnemonic = Mnemonic::from_phrase(TEST_PHRASE).unwrap();
        assert_eq!(mnemonic.phrase(), TEST_PHRASE);

        // extra whitespace is tolerated
        let padded = format!("  {}  ", TEST_PHRASE.replace(' ', "  "));
        assert_eq!(Mnemonic::from_phrase(&padded).unwrap().phrase(), TEST_PHRASE);
    }

    #[test]
    fn test_validate() {
        assert!(Mnemonic::validate(TEST_PHRASE));
        assert!(!Mnemonic::validate("definitely not a valid phrase"));
    }

    #[test]
    fn test_seed_is_deterministic_and_password_sensitive() {
        let m = Mnemonic::from_phrase(TEST_PHRASE).unwrap();
        assert_eq!(m.to_seed(None), m.to_seed(None));
        assert_ne!(m.to_seed(None), m.to_seed(Some("password")));
    }
}
