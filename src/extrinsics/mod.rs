//! Signed chain operations.

pub mod faucet;
pub mod pow;
pub mod registration;
pub mod serving;
pub mod subnet;
pub mod weights;

pub use faucet::run_faucet;
pub use pow::{solve, PowSolution};
pub use registration::{burned_register, is_registered, register};
pub use serving::serve_axon;
pub use subnet::register_network;
pub use weights::set_weights;
