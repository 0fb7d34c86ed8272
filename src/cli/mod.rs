//! The `stcli` command surface.
//!
//! Covers the operator workflow for running a storage node: create keys,
//! fund them from the test faucet, create or register on a subnet, and
//! inspect balances.

use clap::{Parser, Subcommand};

pub mod commands;
pub mod utils;

#[derive(Parser)]
#[command(name = "stcli")]
#[command(version)]
#[command(about = "Storage subnet operator CLI", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Network to connect to (finney, test, local, or a ws:// URL)
    #[arg(short, long, default_value = "local", global = true)]
    pub network: String,

    /// Custom RPC endpoint; overrides --network
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Skip confirmation prompts
    #[arg(long = "no_prompt", global = true)]
    pub no_prompt: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Wallet operations (create keys, balances)
    #[command(alias = "w")]
    Wallet(commands::wallet::WalletCommand),

    /// Subnet operations (create, register, faucet)
    #[command(alias = "sn")]
    Subnet(commands::subnet::SubnetCommand),
}

/// Parse arguments and dispatch.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Wallet(cmd) => commands::wallet::execute(cmd.clone(), &cli).await,
        Commands::Subnet(cmd) => commands::subnet::execute(cmd.clone(), &cli).await,
    }
}
