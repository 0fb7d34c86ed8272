//! Command implementations, one module per category.

pub mod subnet;
pub mod wallet;
