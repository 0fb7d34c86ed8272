//! Wallet integration tests
//!
//! Validates key derivation determinism, the on-disk wallet layout,
//! and keyfile encryption round trips.

use bittensor_db::wallet::{list_wallets_at, Keypair, Mnemonic, Wallet};

const KNOWN_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

#[test]
fn test_known_mnemonic_derivation() {
    let kp = Keypair::from_mnemonic(KNOWN_MNEMONIC, None).unwrap();
    assert_eq!(
        kp.ss58_address(),
        "5EPCUjPxiHAcNooYipQFWr9NmmXJKpNG5RhcntXwbtUySrgH"
    );
    assert_eq!(
        hex::encode(kp.public_key()),
        "66933bd1f37070ef87bd1198af3dacceb095237f803f3d32b173e6b425ed7972"
    );
}

#[test]
fn test_derivation_is_deterministic() {
    let a = Keypair::from_mnemonic(KNOWN_MNEMONIC, None).unwrap();
    let b = Keypair::from_mnemonic(KNOWN_MNEMONIC, None).unwrap();
    assert_eq!(a.ss58_address(), b.ss58_address());
    assert_eq!(a.public_key(), b.public_key());
}

#[test]
fn test_wallet_directory_layout() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_str().unwrap();

    let mut wallet = Wallet::new("store", "hk1", Some(base)).unwrap();
    wallet.create_coldkey(None, None, false).unwrap();
    wallet.create_hotkey(None, None, false).unwrap();

    assert!(dir.path().join("store").join("coldkey").exists());
    assert!(dir.path().join("store").join("coldkeypub.txt").exists());
    assert!(dir.path().join("store").join("hotkeys").join("hk1").exists());
}

#[test]
fn test_encrypted_keyfile_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_str().unwrap();

    let mut wallet = Wallet::new("secure", "default", Some(base)).unwrap();
    let phrase = wallet.create_coldkey(Some("hunter2"), None, false).unwrap();

    // Wrong or missing password fails, the right one decrypts.
    assert!(wallet.coldkey_keypair(None).is_err());
    assert!(wallet.coldkey_keypair(Some("wrong")).is_err());
    let coldkey = wallet.coldkey_keypair(Some("hunter2")).unwrap();

    // The mnemonic the wallet reports regenerates the same key.
    let regenerated = Keypair::from_mnemonic(&phrase, Some("hunter2")).unwrap();
    assert_eq!(coldkey.ss58_address(), regenerated.ss58_address());
}

#[test]
fn test_coldkey_address_readable_without_password() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_str().unwrap();

    let mut wallet = Wallet::new("pubread", "default", Some(base)).unwrap();
    wallet.create_coldkey(Some("secret"), None, false).unwrap();

    // coldkeypub.txt lets balance queries skip decryption.
    let address = wallet.coldkey_ss58(None).unwrap();
    assert!(address.starts_with('5'));
}

#[test]
fn test_list_wallets_and_hotkeys() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_str().unwrap();

    for name in ["alpha", "beta"] {
        let mut wallet = Wallet::new(name, "default", Some(base)).unwrap();
        wallet.create_coldkey(None, None, false).unwrap();
        wallet.create_hotkey(None, None, false).unwrap();
    }
    let mut extra = Wallet::new("alpha", "hk2", Some(base)).unwrap();
    extra.create_hotkey(None, None, false).unwrap();

    let mut names = list_wallets_at(dir.path()).unwrap();
    names.sort();
    assert_eq!(names, vec!["alpha", "beta"]);

    let alpha = Wallet::new("alpha", "default", Some(base)).unwrap();
    let mut hotkeys = alpha.list_hotkeys().unwrap();
    hotkeys.sort();
    assert_eq!(hotkeys, vec!["default", "hk2"]);
}

#[test]
fn test_mnemonic_word_counts() {
    for words in [12, 15, 18, 21, 24] {
        let mnemonic = Mnemonic::generate_with_words(words).unwrap();
        assert_eq!(mnemonic.word_count(), words);
        assert!(Mnemonic::validate(mnemonic.phrase()));
    }
    assert!(Mnemonic::generate_with_words(13).is_err());
    assert!(!Mnemonic::validate("not a real mnemonic phrase"));
}
