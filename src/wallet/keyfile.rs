//! Encrypted keyfile storage.
//!
//! Keyfiles are JSON documents holding an Argon2id-derived,
//! XSalsa20Poly1305-encrypted keypair:
//!
//! ```json
//! {
//!     "crypto": {
//!         "cipher": "secretbox",
//!         "ciphertext": "<base64>",
//!         "cipherparams": {"nonce": "<base64 24 bytes>"},
//!         "kdf": "argon2id",
//!         "kdfparams": {"salt": "<base64 16 bytes>", "n": 65536, "r": 1, "p": 4}
//!     },
//!     "version": 4
//! }
//! ```
//!
//! Unencrypted keyfiles store the raw keypair bytes hex encoded.

use crate::wallet::keypair::{Keypair, KeypairError};
use argon2::{Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use crypto_secretbox::{
    aead::{Aead, KeyInit},
    XSalsa20Poly1305,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zeroize::Zeroize;

/// Current keyfile format version.
pub const KEYFILE_VERSION: u32 = 4;

const ARGON2_TIME_COST: u32 = 1;
const ARGON2_MEMORY_COST: u32 = 65536; // 64 MiB
const ARGON2_PARALLELISM: u32 = 4;

/// Errors that can occur during keyfile operations.
#[derive(Debug, Error)]
pub enum KeyfileError {
    #[error("Keyfile not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid keyfile format: {0}")]
    InvalidFormat(String),

    #[error("Decryption failed: wrong password or corrupted keyfile")]
    DecryptionFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Keyfile already exists and overwrite is not enabled")]
    AlreadyExists,

    #[error("Keypair error: {0}")]
    Keypair(#[from] KeypairError),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Unsupported keyfile version: {0}")]
    UnsupportedVersion(u32),

    #[error("Password required for encrypted keyfile")]
    PasswordRequired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfParams {
    pub salt: String,
    #[serde(rename = "n")]
    pub memory_cost: u32,
    #[serde(rename = "r")]
    pub time_cost: u32,
    #[serde(rename = "p")]
    pub parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherParams {
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoData {
    pub cipher: String,
    pub ciphertext: String,
    pub cipherparams: CipherParams,
    pub kdf: String,
    pub kdfparams: KdfParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyfileJson {
    pub crypto: CryptoData,
    pub version: u32,
}

/// Encrypted key material with its salt and nonce.
#[derive(Debug, Clone)]
pub struct KeyfileData {
    pub encrypted_key: Vec<u8>,
    pub nonce: [u8; 24],
    pub salt: [u8; 16],
}

/// A keypair stored on disk, optionally password protected.
pub struct Keyfile {
    path: PathBuf,
    keypair: Option<Keypair>,
}

impl std::fmt::Debug for Keyfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyfile")
            .field("path", &self.path)
            .field("loaded", &self.keypair.is_some())
            .finish()
    }
}

impl Keyfile {
    /// Create a handle for the given path without touching disk.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            keypair: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Whether the on-disk file is in the encrypted JSON format.
    pub fn is_encrypted(&self) -> bool {
        if !self.exists() {
            return false;
        }
        match self.read_raw() {
            Ok(data) => serde_json::from_slice::<KeyfileJson>(&data).is_ok(),
            Err(_) => false,
        }
    }

    /// Load the keypair, decrypting with `password` if the file is encrypted.
    pub fn get_keypair(&self, password: Option<&str>) -> Result<Keypair, KeyfileError> {
        if let Some(ref kp) = self.keypair {
            return Ok(kp.clone());
        }

        if !self.exists() {
            return Err(KeyfileError::NotFound(self.path.clone()));
        }

        let data = self.read_raw()?;
        self.decrypt_keypair(&data, password)
    }

    /// Store a keypair, encrypting when a password is given.
    pub fn set_keypair(
        &mut self,
        keypair: Keypair,
        password: Option<&str>,
        overwrite: bool,
    ) -> Result<(), KeyfileError> {
        if self.exists() && !overwrite {
            return Err(KeyfileError::AlreadyExists);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let raw_key = keypair.to_bytes();

        let content = match password {
            Some(pass) => {
                let keyfile_data = self.encrypt(&raw_key, pass)?;
                self.to_json(&keyfile_data)?
            }
            None => {
                tracing::warn!(
                    "Storing keyfile without encryption at {:?}. \
                     Consider using a password.",
                    self.path
                );
                hex::encode(&raw_key).into_bytes()
            }
        };

        // Write to a temp file with restrictive permissions, then rename,
        // so the key bytes are never visible through a partially written
        // or world-readable file.
        let temp_path = self.path.with_extension("tmp");
        {
            #[cfg(unix)]
            let mut file = {
                use std::os::unix::fs::OpenOptionsExt;
                fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .mode(0o600)
                    .open(&temp_path)?
            };
            #[cfg(not(unix))]
            let mut file = fs::File::create(&temp_path)?;

            file.write_all(&content)?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;

        self.keypair = Some(keypair);
        Ok(())
    }

    /// Encrypt `data` with a fresh salt and nonce.
    pub fn encrypt(&self, data: &[u8], password: &str) -> Result<KeyfileData, KeyfileError> {
        let mut salt = [0u8; 16];
        let mut nonce = [0u8; 24];

        use rand::RngCore;
        let mut rng = rand::rng();
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce);

        let mut key = derive_key(password, &salt)?;

        let cipher = XSalsa20Poly1305::new_from_slice(&key)
            .map_err(|e| KeyfileError::EncryptionFailed(e.to_string()))?;

        let encrypted_key = cipher
            .encrypt(nonce.as_ref().into(), data)
            .map_err(|e| KeyfileError::EncryptionFailed(e.to_string()))?;

        key.zeroize();

        Ok(KeyfileData {
            encrypted_key,
            nonce,
            salt,
        })
    }

    /// Decrypt previously encrypted key material.
    pub fn decrypt(&self, data: &KeyfileData, password: &str) -> Result<Vec<u8>, KeyfileError> {
        let mut key = derive_key(password, &data.salt)?;

        let cipher = XSalsa20Poly1305::new_from_slice(&key).map_err(|e| {
            KeyfileError::EncryptionFailed(format!("Failed to create cipher: {}", e))
        })?;

        let decrypted = cipher
            .decrypt(data.nonce.as_ref().into(), data.encrypted_key.as_ref())
            .map_err(|_| KeyfileError::DecryptionFailed)?;

        key.zeroize();

        Ok(decrypted)
    }

    /// Re-encrypt the keyfile under a new password.
    pub fn check_and_update_encryption(
        &mut self,
        old_password: Option<&str>,
        new_password: &str,
    ) -> Result<(), KeyfileError> {
        let keypair = self.get_keypair(old_password)?;
        self.set_keypair(keypair, Some(new_password), true)
    }

    fn read_raw(&self) -> Result<Vec<u8>, KeyfileError> {
        let mut file = fs::File::open(&self.path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    fn to_json(&self, data: &KeyfileData) -> Result<Vec<u8>, KeyfileError> {
        let json = KeyfileJson {
            crypto: CryptoData {
                cipher: "secretbox".to_string(),
                ciphertext: BASE64.encode(&data.encrypted_key),
                cipherparams: CipherParams {
                    nonce: BASE64.encode(data.nonce),
                },
                kdf: "argon2id".to_string(),
                kdfparams: KdfParams {
                    salt: BASE64.encode(data.salt),
                    memory_cost: ARGON2_MEMORY_COST,
                    time_cost: ARGON2_TIME_COST,
                    parallelism: ARGON2_PARALLELISM,
                },
            },
            version: KEYFILE_VERSION,
        };

        serde_json::to_vec_pretty(&json).map_err(KeyfileError::Json)
    }

    fn decrypt_keypair(
        &self,
        data: &[u8],
        password: Option<&str>,
    ) -> Result<Keypair, KeyfileError> {
        if let Ok(json) = serde_json::from_slice::<KeyfileJson>(data) {
            return self.decrypt_from_json(&json, password);
        }

        // Unencrypted hex
        if let Ok(hex_str) = std::str::from_utf8(data) {
            if let Ok(key_bytes) = hex::decode(hex_str.trim()) {
                return Keypair::from_bytes(&key_bytes).map_err(KeyfileError::Keypair);
            }
        }

        Err(KeyfileError::InvalidFormat(
            "Could not parse keyfile data".to_string(),
        ))
    }

    fn decrypt_from_json(
        &self,
        json: &KeyfileJson,
        password: Option<&str>,
    ) -> Result<Keypair, KeyfileError> {
        if json.version > KEYFILE_VERSION {
            return Err(KeyfileError::UnsupportedVersion(json.version));
        }

        let password = password.ok_or(KeyfileError::PasswordRequired)?;

        let ciphertext = BASE64.decode(&json.crypto.ciphertext)?;
        let nonce_bytes = BASE64.decode(&json.crypto.cipherparams.nonce)?;
        let salt_bytes = BASE64.decode(&json.crypto.kdfparams.salt)?;

        if nonce_bytes.len() != 24 {
            return Err(KeyfileError::InvalidFormat(format!(
                "Invalid nonce length: expected 24, got {}",
                nonce_bytes.len()
            )));
        }
        if salt_bytes.len() != 16 {
            return Err(KeyfileError::InvalidFormat(format!(
                "Invalid salt length: expected 16, got {}",
                salt_bytes.len()
            )));
        }

        let mut nonce = [0u8; 24];
        let mut salt = [0u8; 16];
        nonce.copy_from_slice(&nonce_bytes);
        salt.copy_from_slice(&salt_bytes);

        let keyfile_data = KeyfileData {
            encrypted_key: ciphertext,
            nonce,
            salt,
        };

        let key_bytes = self.decrypt(&keyfile_data, password)?;
        Keypair::from_bytes(&key_bytes).map_err(KeyfileError::Keypair)
    }
}

fn derive_key(password: &str, salt: &[u8; 16]) -> Result<[u8; 32], KeyfileError> {
    let params = Params::new(
        ARGON2_MEMORY_COST,
        ARGON2_TIME_COST,
        ARGON2_PARALLELISM,
        Some(32),
    )
    .map_err(|e| KeyfileError::KeyDerivationFailed(e.to_string()))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| KeyfileError::KeyDerivationFailed(e.to_string()))?;

    Ok(key)
}
