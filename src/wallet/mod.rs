//! Wallet management: BIP39 mnemonics, SR25519 keypairs, encrypted
//! keyfiles, and the coldkey/hotkey wallet layout on disk.
//!
//! Keyfiles use Argon2id for key derivation and XSalsa20Poly1305
//! (NaCl secretbox) for encryption; sensitive material is zeroized
//! on drop.

pub mod keyfile;
pub mod keypair;
pub mod mnemonic;
#[allow(clippy::module_inception)]
pub mod wallet;

pub use keyfile::{Keyfile, KeyfileData, KeyfileError, KeyfileJson, KEYFILE_VERSION};
pub use keypair::{Keypair, KeypairError};
pub use mnemonic::{Mnemonic, MnemonicError};
pub use wallet::{
    default_wallet_path, list_wallets, list_wallets_at, wallet_path, Wallet, WalletError,
};

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_full_wallet_workflow() {
        let dir = tempdir().unwrap();
        let base_path = dir.path().to_str().unwrap();

        let coldkey_mnemonic = Mnemonic::generate();
        let hotkey_mnemonic = Mnemonic::generate();

        let mut wallet = Wallet::new("test_wallet", "default", Some(base_path)).unwrap();
        wallet
            .create_coldkey(Some("password"), Some(coldkey_mnemonic.phrase()), false)
            .unwrap();
        wallet
            .create_hotkey(Some("password"), Some(hotkey_mnemonic.phrase()), false)
            .unwrap();

        assert!(wallet.exists());

        let coldkey = wallet.coldkey_keypair(Some("password")).unwrap();
        let hotkey = wallet.hotkey_keypair(Some("password")).unwrap();
        assert!(!coldkey.ss58_address().is_empty());
        assert!(!hotkey.ss58_address().is_empty());

        let message = b"test message";
        let signature = hotkey.sign(message);
        assert!(hotkey.verify(message, &signature));

        // recovery from the same mnemonic yields the same address
        let mut recovered = Wallet::new("recovered", "default", Some(base_path)).unwrap();
        recovered
            .create_coldkey(Some("password"), Some(coldkey_mnemonic.phrase()), false)
            .unwrap();

        let recovered_coldkey = recovered.coldkey_keypair(Some("password")).unwrap();
        assert_eq!(coldkey.ss58_address(), recovered_coldkey.ss58_address());
    }

    #[test]
    fn test_keyfile_json_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_keyfile");

        let keypair = Keypair::generate();
        let mut keyfile = Keyfile::new(&path);
        keyfile
            .set_keypair(keypair.clone(), Some("password"), false)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(json["version"], 4);
        assert_eq!(json["crypto"]["cipher"], "secretbox");
        assert_eq!(json["crypto"]["kdf"], "argon2id");
        assert!(json["crypto"]["ciphertext"].as_str().is_some());
        assert!(json["crypto"]["cipherparams"]["nonce"].as_str().is_some());
        assert!(json["crypto"]["kdfparams"]["salt"].as_str().is_some());
    }
}
