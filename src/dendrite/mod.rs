//! Dendrite: the calling side of the synapse protocol.

pub mod client;

pub use client::{Dendrite, DEFAULT_TIMEOUT};
