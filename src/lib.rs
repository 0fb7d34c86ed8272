pub mod axon;
pub mod chain;
pub mod cli;
pub mod config;
pub mod dendrite;
pub mod errors;
pub mod extrinsics;
pub mod logging;
pub mod metagraph;
pub mod neuron;
pub mod protocol;
pub mod queries;
pub mod store;
pub mod utils;
pub mod wallet;

pub use chain::{ExtrinsicWait, PairSigner, SubtensorClient};
pub use metagraph::Metagraph;
pub use queries::sync_metagraph;

// Re-export logging module
pub use logging::{init_logging, LogFormat, LoggingConfig};

// Re-export the wire protocol
pub use protocol::{Retrieve, Synapse, TerminalInfo, PROTOCOL_VERSION, RETRIEVE_SYNAPSE};

// Re-export the chunk store
pub use store::{
    allocate, available_space, chunk_hash, db_name, db_path, generate_all, generate_chunk,
    generate_chunk_proof, pair_seed, verify_all, Allocation, ChunkDb, CHUNK_SIZE, MIN_N_CHUNKS,
};

// Re-export the HTTP endpoints
pub use axon::{Axon, AxonConfig, AxonInfo, AxonState, DEFAULT_AXON_PORT};
pub use dendrite::Dendrite;

// Re-export wallet module for key management
pub use wallet::{
    default_wallet_path, list_wallets, list_wallets_at, wallet_path, Keyfile, KeyfileError,
    Keypair, KeypairError, Mnemonic, MnemonicError, Wallet, WalletError,
};

// Re-export error types
pub use errors::{
    AllocationError, ChainConnectionError, ChainQueryError, ChunkMismatch, ExtrinsicFailed,
    NotRegistered, PowFailed, RequestFailed, StoreError, SubnetError, SubnetResult, Unauthorized,
};
