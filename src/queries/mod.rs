//! Read-only chain queries, all through the dynamic storage API.

pub mod balances;
pub mod metagraph;
pub mod subnets;

pub use metagraph::{sync_metagraph, SUBTENSOR_MODULE};
