//! Wire protocol integration tests
//!
//! Validates the synapse envelope, body hashing, and the request
//! signing scheme end to end with real keypairs.

use bittensor_db::protocol::{
    compute_body_hash, signing_message, Retrieve, Synapse, TerminalInfo, PROTOCOL_VERSION,
    RETRIEVE_SYNAPSE,
};
use bittensor_db::wallet::Keypair;

#[test]
fn test_protocol_version() {
    assert_eq!(PROTOCOL_VERSION, 100);
}

#[test]
fn test_compute_body_hash_known_value() {
    // sha256("") is a fixed constant.
    assert_eq!(
        compute_body_hash(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(compute_body_hash(b"abc").len(), 64);
}

#[test]
fn test_signing_message_layout() {
    let message = signing_message(42, "5Dendrite", "5Axon", "deadbeef");
    assert_eq!(message, "42.5Dendrite.5Axon.deadbeef");
}

#[test]
fn test_sign_and_verify_request() {
    let dendrite_key = Keypair::generate();
    let axon_key = Keypair::generate();

    let synapse = Retrieve::new("3").into_synapse();
    let body_hash = synapse.body_hash();

    let message = signing_message(
        1_700_000_000,
        dendrite_key.ss58_address(),
        axon_key.ss58_address(),
        &body_hash,
    );
    let signature = dendrite_key.sign(message.as_bytes());

    assert!(dendrite_key.verify(message.as_bytes(), &signature));

    // A different axon hotkey invalidates the message.
    let other = signing_message(
        1_700_000_000,
        dendrite_key.ss58_address(),
        dendrite_key.ss58_address(),
        &body_hash,
    );
    assert!(!dendrite_key.verify(other.as_bytes(), &signature));
}

#[test]
fn test_body_hash_stable_across_serialization() {
    let mut synapse = Retrieve::new("9").into_synapse();
    synapse.dendrite = Some(TerminalInfo::new().with_status(200, "Success"));
    let before = synapse.body_hash();

    let json = serde_json::to_string(&synapse).unwrap();
    let parsed: Synapse = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.body_hash(), before);
}

#[test]
fn test_body_hash_ignores_terminals() {
    let mut a = Retrieve::new("5").into_synapse();
    let hash = a.body_hash();

    a.dendrite = Some(TerminalInfo::new().with_status(408, "Timeout"));
    a.axon = Some(TerminalInfo::new().with_status(503, "Unavailable"));
    assert_eq!(a.body_hash(), hash);
}

#[test]
fn test_retrieve_envelope_roundtrip() {
    let mut retrieve = Retrieve::new("12");
    retrieve.set_data(&[0xde, 0xad, 0xbe, 0xef]);

    let synapse = retrieve.into_synapse();
    assert_eq!(synapse.name.as_deref(), Some(RETRIEVE_SYNAPSE));

    let json = serde_json::to_string(&synapse).unwrap();
    let parsed: Synapse = serde_json::from_str(&json).unwrap();
    let recovered = Retrieve::from_synapse(&parsed).unwrap();

    assert_eq!(recovered.chunk_index(), Some(12));
    assert_eq!(recovered.data_bytes().unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
}

#[test]
fn test_unanswered_retrieve_has_null_data() {
    let synapse = Retrieve::new("0").into_synapse();
    let parsed = Retrieve::from_synapse(&synapse).unwrap();
    assert!(parsed.data.is_none());
    assert!(parsed.data_bytes().is_none());
}
