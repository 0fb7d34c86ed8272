//! Axon: the serving side of the synapse protocol.

pub mod info;
pub mod server;

pub use info::{AxonConfig, AxonInfo, DEFAULT_AXON_PORT, PROTOCOL_TCP};
pub use server::{Axon, AxonState, SynapseHandler};
