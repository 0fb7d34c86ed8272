//! The miner and validator node loops.

pub mod config;
pub mod miner;
pub mod validator;

pub use config::NeuronConfig;

use crate::errors::SubnetResult;
use crate::wallet::{Keypair, Wallet};

/// Load the wallet's hotkey, prompting for a password when the
/// keyfile is encrypted.
pub fn load_hotkey(wallet: &Wallet) -> SubnetResult<Keypair> {
    let password = if wallet.hotkey().is_encrypted() {
        let prompt = format!(
            "Enter password for hotkey {}/{}",
            wallet.name, wallet.hotkey_name
        );
        Some(
            dialoguer::Password::new()
                .with_prompt(prompt)
                .interact()
                .map_err(|e| crate::errors::SubnetError::other(e.to_string()))?,
        )
    } else {
        None
    };
    Ok(wallet.hotkey_keypair(password.as_deref())?)
}
