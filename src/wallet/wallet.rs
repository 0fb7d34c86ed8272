//! Coldkey/hotkey wallet management.
//!
//! Wallets live on disk as:
//! ```text
//! ~/.bittensor/wallets/
//!   └── <wallet_name>/
//!       ├── coldkey
//!       ├── coldkeypub.txt
//!       └── hotkeys/
//!           └── <hotkey_name>
//! ```

use crate::wallet::keyfile::{Keyfile, KeyfileError};
use crate::wallet::keypair::{Keypair, KeypairError};
use crate::wallet::mnemonic::{Mnemonic, MnemonicError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const COLDKEY_FILENAME: &str = "coldkey";
const COLDKEYPUB_FILENAME: &str = "coldkeypub.txt";
const HOTKEYS_DIR: &str = "hotkeys";
const DEFAULT_HOTKEY_NAME: &str = "default";

/// Errors that can occur during wallet operations.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Coldkey not found for wallet: {0}")]
    ColdkeyNotFound(String),

    #[error("Hotkey not found: {0}")]
    HotkeyNotFound(String),

    #[error("Keyfile error: {0}")]
    Keyfile(#[from] KeyfileError),

    #[error("Keypair error: {0}")]
    Keypair(#[from] KeypairError),

    #[error("Mnemonic error: {0}")]
    Mnemonic(#[from] MnemonicError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid name: {0}")]
    InvalidName(String),
}

/// Reject names that would escape the wallet directory.
///
/// Disallows path separators, `..`, leading dots, and empty names.
fn sanitize_name(name: &str) -> Result<&str, WalletError> {
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(WalletError::InvalidName(format!(
            "Name '{}' contains invalid path characters",
            name
        )));
    }
    if name.trim().is_empty() {
        return Err(WalletError::InvalidName("Name cannot be empty".to_string()));
    }
    if name.starts_with('.') {
        return Err(WalletError::InvalidName(format!(
            "Name '{}' cannot start with a dot",
            name
        )));
    }
    Ok(name)
}

/// A wallet holding a coldkey (funds) and a hotkey (network identity).
pub struct Wallet {
    pub name: String,
    pub path: PathBuf,
    pub hotkey_name: String,
    coldkey: Keyfile,
    hotkey: Keyfile,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("hotkey_name", &self.hotkey_name)
            .finish()
    }
}

impl Wallet {
    /// Create a wallet handle without touching disk.
    ///
    /// `path` overrides the default base directory (`~/.bittensor/wallets`).
    /// Both names are sanitized against path traversal.
    pub fn new(name: &str, hotkey: &str, path: Option<&str>) -> Result<Self, WalletError> {
        let name = sanitize_name(name)?;
        let hotkey = sanitize_name(hotkey)?;

        let base_path = match path {
            Some(p) => PathBuf::from(p),
            None => default_wallet_path(),
        };

        let wallet_path = base_path.join(name);
        let coldkey_path = wallet_path.join(COLDKEY_FILENAME);
        let hotkey_path = wallet_path.join(HOTKEYS_DIR).join(hotkey);

        Ok(Self {
            name: name.to_string(),
            path: wallet_path,
            hotkey_name: hotkey.to_string(),
            coldkey: Keyfile::new(coldkey_path),
            hotkey: Keyfile::new(hotkey_path),
        })
    }

    /// Create a wallet with freshly generated coldkey and hotkey.
    pub fn create(name: &str, hotkey: &str, password: Option<&str>) -> Result<Self, WalletError> {
        let mut wallet = Self::new(name, hotkey, None)?;
        wallet.create_coldkey(password, None, false)?;
        wallet.create_hotkey(password, None, false)?;
        Ok(wallet)
    }

    /// Like [`Wallet::create`] but under a custom base path.
    pub fn create_at_path(
        name: &str,
        hotkey: &str,
        path: &str,
        password: Option<&str>,
    ) -> Result<Self, WalletError> {
        let mut wallet = Self::new(name, hotkey, Some(path))?;
        wallet.create_coldkey(password, None, false)?;
        wallet.create_hotkey(password, None, false)?;
        Ok(wallet)
    }

    /// Create or regenerate the coldkey. Returns the mnemonic phrase used.
    pub fn create_coldkey(
        &mut self,
        password: Option<&str>,
        mnemonic: Option<&str>,
        overwrite: bool,
    ) -> Result<String, WalletError> {
        let mnemonic_obj = match mnemonic {
            Some(phrase) => Mnemonic::from_phrase(phrase)?,
            None => Mnemonic::generate(),
        };

        let keypair = Keypair::from_mnemonic_obj(&mnemonic_obj, password)?;
        let phrase = mnemonic_obj.phrase().to_string();

        fs::create_dir_all(&self.path)?;

        self.coldkey
            .set_keypair(keypair.clone(), password, overwrite)?;
        self.save_coldkey_pub(&keypair)?;

        Ok(phrase)
    }

    /// Create or regenerate the hotkey. Returns the mnemonic phrase used.
    pub fn create_hotkey(
        &mut self,
        password: Option<&str>,
        mnemonic: Option<&str>,
        overwrite: bool,
    ) -> Result<String, WalletError> {
        let mnemonic_obj = match mnemonic {
            Some(phrase) => Mnemonic::from_phrase(phrase)?,
            None => Mnemonic::generate(),
        };

        let keypair = Keypair::from_mnemonic_obj(&mnemonic_obj, password)?;
        let phrase = mnemonic_obj.phrase().to_string();

        fs::create_dir_all(self.path.join(HOTKEYS_DIR))?;

        self.hotkey.set_keypair(keypair, password, overwrite)?;

        Ok(phrase)
    }

    pub fn coldkey(&self) -> &Keyfile {
        &self.coldkey
    }

    pub fn hotkey(&self) -> &Keyfile {
        &self.hotkey
    }

    pub fn coldkey_keypair(&self, password: Option<&str>) -> Result<Keypair, WalletError> {
        self.coldkey
            .get_keypair(password)
            .map_err(WalletError::Keyfile)
    }

    pub fn hotkey_keypair(&self, password: Option<&str>) -> Result<Keypair, WalletError> {
        self.hotkey
            .get_keypair(password)
            .map_err(WalletError::Keyfile)
    }

    /// Coldkey SS58 address, read from coldkeypub.txt when available so the
    /// encrypted coldkey does not need to be decrypted.
    pub fn coldkey_ss58(&self, password: Option<&str>) -> Result<String, WalletError> {
        let pub_path = self.path.join(COLDKEYPUB_FILENAME);
        if pub_path.exists() {
            if let Ok(content) = fs::read_to_string(&pub_path) {
                let address = content.trim().to_string();
                if !address.is_empty() {
                    return Ok(address);
                }
            }
        }

        let keypair = self.coldkey_keypair(password)?;
        Ok(keypair.ss58_address().to_string())
    }

    pub fn hotkey_ss58(&self, password: Option<&str>) -> Result<String, WalletError> {
        let keypair = self.hotkey_keypair(password)?;
        Ok(keypair.ss58_address().to_string())
    }

    pub fn coldkey_exists(&self) -> bool {
        self.coldkey.exists()
    }

    pub fn hotkey_exists(&self) -> bool {
        self.hotkey.exists()
    }

    pub fn exists(&self) -> bool {
        self.coldkey_exists() && self.hotkey_exists()
    }

    /// Regenerate a wallet's coldkey from its mnemonic phrase.
    pub fn regenerate_coldkey(
        name: &str,
        mnemonic: &str,
        password: Option<&str>,
    ) -> Result<Self, WalletError> {
        let mut wallet = Self::new(name, DEFAULT_HOTKEY_NAME, None)?;
        wallet.create_coldkey(password, Some(mnemonic), true)?;
        Ok(wallet)
    }

    /// Regenerate a hotkey from its mnemonic phrase.
    pub fn regenerate_hotkey(
        name: &str,
        hotkey_name: &str,
        mnemonic: &str,
        password: Option<&str>,
    ) -> Result<Self, WalletError> {
        let mut wallet = Self::new(name, hotkey_name, None)?;
        wallet.create_hotkey(password, Some(mnemonic), true)?;
        Ok(wallet)
    }

    /// Names of all hotkeys stored under this wallet.
    pub fn list_hotkeys(&self) -> Result<Vec<String>, WalletError> {
        let hotkeys_dir = self.path.join(HOTKEYS_DIR);
        if !hotkeys_dir.exists() {
            return Ok(Vec::new());
        }

        let mut hotkeys = Vec::new();
        for entry in fs::read_dir(&hotkeys_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    // skip leftover atomic-write temp files
                    if !name.ends_with(".tmp") {
                        hotkeys.push(name.to_string());
                    }
                }
            }
        }

        hotkeys.sort();
        Ok(hotkeys)
    }

    /// Point this handle at a different hotkey.
    pub fn use_hotkey(&mut self, hotkey_name: &str) -> Result<(), WalletError> {
        let hotkey_name = sanitize_name(hotkey_name)?;
        self.hotkey_name = hotkey_name.to_string();
        let hotkey_path = self.path.join(HOTKEYS_DIR).join(hotkey_name);
        self.hotkey = Keyfile::new(hotkey_path);
        Ok(())
    }

    fn save_coldkey_pub(&self, keypair: &Keypair) -> Result<(), WalletError> {
        let pub_path = self.path.join(COLDKEYPUB_FILENAME);
        let mut file = fs::File::create(&pub_path)?;
        writeln!(file, "{}", keypair.ss58_address())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&pub_path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

/// The default wallet base directory (`~/.bittensor/wallets`).
pub fn default_wallet_path() -> PathBuf {
    crate::config::default_wallet_dir()
}

/// Full path to a named wallet under the default directory.
pub fn wallet_path(name: &str) -> PathBuf {
    default_wallet_path().join(name)
}

/// Names of all wallets under the default directory.
pub fn list_wallets() -> Result<Vec<String>, WalletError> {
    list_wallets_at(&default_wallet_path())
}

/// Names of all wallets under `path`. A directory counts as a wallet
/// when it contains a coldkey file.
pub fn list_wallets_at(path: &Path) -> Result<Vec<String>, WalletError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut wallets = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            let coldkey_path = entry.path().join(COLDKEY_FILENAME);
            if coldkey_path.exists() {
                if let Some(name) = entry.file_name().to_str() {
                    wallets.push(name.to_string());
                }
            }
        }
    }

    wallets.sort();
    Ok(wallets)
}
