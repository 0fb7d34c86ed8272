//! Subnet commands: creation, registration, and the test faucet.

use crate::chain::{ExtrinsicWait, PairSigner, SubtensorClient};
use crate::cli::utils::{
    confirm, format_tao, print_error, print_info, print_success, print_warning,
    prompt_password_optional, resolve_endpoint, spinner,
};
use crate::cli::Cli;
use crate::config::DEFAULT_NETUID;
use crate::extrinsics::{self, pow};
use crate::queries::subnets;
use crate::utils::ss58;
use crate::wallet::Wallet;
use clap::{Args, Subcommand};
use sp_core::crypto::AccountId32;

/// Nonce budget for a registration proof of work.
const MAX_POW_ATTEMPTS: u64 = 50_000_000;

#[derive(Args, Clone)]
pub struct SubnetCommand {
    #[command(subcommand)]
    pub command: SubnetCommands,
}

#[derive(Subcommand, Clone)]
pub enum SubnetCommands {
    /// Show the current cost of creating a subnet
    LockCost,

    /// Create a new subnet (pays the lock cost)
    Create {
        /// Wallet name
        #[arg(short, long, default_value = "default")]
        name: String,
        /// Hotkey to own the subnet
        #[arg(short = 'k', long, default_value = "default")]
        hotkey: String,
    },

    /// Register a hotkey on a subnet
    Register {
        /// Wallet name
        #[arg(short, long, default_value = "default")]
        name: String,
        /// Hotkey to register
        #[arg(short = 'k', long, default_value = "default")]
        hotkey: String,
        /// Subnet uid
        #[arg(long, default_value_t = DEFAULT_NETUID)]
        netuid: u16,
        /// Pay the burn cost instead of solving proof of work
        #[arg(long)]
        burned: bool,
    },

    /// Request test-network TAO via the faucet
    Faucet {
        /// Wallet name
        #[arg(short, long, default_value = "default")]
        name: String,
        /// Number of faucet runs
        #[arg(long, default_value = "1")]
        runs: u32,
    },
}

pub async fn execute(cmd: SubnetCommand, cli: &Cli) -> anyhow::Result<()> {
    match cmd.command {
        SubnetCommands::LockCost => lock_cost(cli).await,
        SubnetCommands::Create { name, hotkey } => create(&name, &hotkey, cli).await,
        SubnetCommands::Register {
            name,
            hotkey,
            netuid,
            burned,
        } => register(&name, &hotkey, netuid, burned, cli).await,
        SubnetCommands::Faucet { name, runs } => faucet(&name, runs, cli).await,
    }
}

async fn connect(cli: &Cli) -> anyhow::Result<SubtensorClient> {
    let endpoint = resolve_endpoint(&cli.network, cli.endpoint.as_deref());
    let sp = spinner(&format!("Connecting to {}...", endpoint));
    let client = SubtensorClient::connect(endpoint).await?;
    sp.finish_and_clear();
    Ok(client)
}

/// Unlock the coldkey for signing, prompting for its password.
fn coldkey_signer(wallet: &Wallet) -> anyhow::Result<PairSigner> {
    let password = if wallet.coldkey().is_encrypted() {
        prompt_password_optional(&format!("Password for coldkey '{}'", wallet.name))
    } else {
        None
    };
    let coldkey = wallet.coldkey_keypair(password.as_deref())?;
    Ok(PairSigner::from_keypair(&coldkey))
}

fn hotkey_account(wallet: &Wallet) -> anyhow::Result<AccountId32> {
    let address = wallet.hotkey_ss58(None)?;
    let public = ss58::ss58_decode(&address)?;
    Ok(ss58::bytes_to_account(&public)?)
}

async fn lock_cost(cli: &Cli) -> anyhow::Result<()> {
    let client = connect(cli).await?;
    let cost = subnets::lock_cost(&client).await?;
    print_info(&format!("Current subnet lock cost: {}", format_tao(cost)));
    Ok(())
}

async fn create(name: &str, hotkey_name: &str, cli: &Cli) -> anyhow::Result<()> {
    let wallet = Wallet::new(name, hotkey_name, None)?;
    if !wallet.exists() {
        print_error(&format!(
            "Wallet '{}' with hotkey '{}' not found",
            name, hotkey_name
        ));
        return Err(anyhow::anyhow!("wallet not found"));
    }

    let client = connect(cli).await?;
    let cost = subnets::lock_cost(&client).await?;
    print_info(&format!("Creating a subnet locks {}", format_tao(cost)));
    if !confirm("Proceed with subnet creation?", cli.no_prompt) {
        print_info("Aborted");
        return Ok(());
    }

    let signer = coldkey_signer(&wallet)?;
    let hotkey = hotkey_account(&wallet)?;

    let sp = spinner("Submitting register_network...");
    let result =
        extrinsics::register_network(&client, &signer, &hotkey, 1, ExtrinsicWait::Finalized).await;
    sp.finish_and_clear();

    match result {
        Ok(hash) => {
            print_success("Subnet created!");
            print_info(&format!("Transaction: {}", hash));
            let total = subnets::total_networks(&client).await?;
            print_info(&format!("Total subnets on chain: {}", total));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Subnet creation failed: {}", e));
            Err(e.into())
        }
    }
}

async fn register(
    name: &str,
    hotkey_name: &str,
    netuid: u16,
    burned: bool,
    cli: &Cli,
) -> anyhow::Result<()> {
    let wallet = Wallet::new(name, hotkey_name, None)?;
    if !wallet.exists() {
        print_error(&format!(
            "Wallet '{}' with hotkey '{}' not found",
            name, hotkey_name
        ));
        return Err(anyhow::anyhow!("wallet not found"));
    }

    let client = connect(cli).await?;
    if !subnets::subnet_exists(&client, netuid).await? {
        print_error(&format!("Subnet {} does not exist", netuid));
        return Err(anyhow::anyhow!("subnet not found"));
    }

    let hotkey_address = wallet.hotkey_ss58(None)?;
    if extrinsics::is_registered(&client, netuid, &hotkey_address).await? {
        print_info(&format!(
            "Hotkey {} is already registered on subnet {}",
            hotkey_address, netuid
        ));
        return Ok(());
    }

    let signer = coldkey_signer(&wallet)?;
    let hotkey = hotkey_account(&wallet)?;
    let coldkey = AccountId32::new(signer.account_id().0);

    let result = if burned {
        let cost = subnets::burn_cost(&client, netuid).await?;
        print_info(&format!("Burned registration costs {}", format_tao(cost)));
        if !confirm("Proceed with burned registration?", cli.no_prompt) {
            print_info("Aborted");
            return Ok(());
        }
        let sp = spinner("Submitting burned_register...");
        let result = extrinsics::burned_register(
            &client,
            &signer,
            netuid,
            &hotkey,
            ExtrinsicWait::Finalized,
        )
        .await;
        sp.finish_and_clear();
        result
    } else {
        let difficulty = subnets::difficulty(&client, netuid).await?;
        let (block_number, block_hash) = client.finalized_block().await?;
        print_info(&format!(
            "Solving proof of work at difficulty {} against block {}",
            difficulty, block_number
        ));

        let sp = spinner("Solving proof of work...");
        let pow_key: [u8; 32] = hotkey.clone().into();
        let solution = tokio::task::spawn_blocking(move || {
            pow::solve(block_number, block_hash, &pow_key, difficulty, MAX_POW_ATTEMPTS)
        })
        .await??;
        sp.finish_and_clear();
        print_info(&format!("Found nonce {}", solution.nonce));

        let sp = spinner("Submitting register...");
        let result = extrinsics::register(
            &client,
            &signer,
            netuid,
            &solution,
            &hotkey,
            &coldkey,
            ExtrinsicWait::Finalized,
        )
        .await;
        sp.finish_and_clear();
        result
    };

    match result {
        Ok(hash) => {
            print_success(&format!(
                "Hotkey {} registered on subnet {}",
                hotkey_address, netuid
            ));
            print_info(&format!("Transaction: {}", hash));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Registration failed: {}", e));
            Err(e.into())
        }
    }
}

async fn faucet(name: &str, runs: u32, cli: &Cli) -> anyhow::Result<()> {
    let wallet = Wallet::new(name, "default", None)?;
    if !wallet.coldkey_exists() {
        print_error(&format!("Wallet '{}' not found", name));
        return Err(anyhow::anyhow!("wallet not found"));
    }

    let endpoint = resolve_endpoint(&cli.network, cli.endpoint.as_deref());
    if cli.network == "finney" || cli.network == "mainnet" {
        print_error("The faucet is only available on test networks");
        return Err(anyhow::anyhow!("faucet unavailable on mainnet"));
    }

    let sp = spinner(&format!("Connecting to {}...", endpoint));
    let client = SubtensorClient::connect(endpoint).await?;
    sp.finish_and_clear();

    let signer = coldkey_signer(&wallet)?;
    for run in 1..=runs {
        let sp = spinner(&format!("Faucet run {}/{}...", run, runs));
        let result = extrinsics::run_faucet(&client, &signer, ExtrinsicWait::Finalized).await;
        sp.finish_and_clear();
        match result {
            Ok(hash) => print_success(&format!("Faucet run {} landed in {}", run, hash)),
            Err(e) => {
                print_warning(&format!("Faucet run {} failed: {}", run, e));
                break;
            }
        }
    }

    let address = wallet.coldkey_ss58(None)?;
    let balance = crate::queries::balances::balance(&client, &address)
        .await
        .unwrap_or(0);
    print_info(&format!("Balance for {}: {}", address, format_tao(balance)));
    Ok(())
}
