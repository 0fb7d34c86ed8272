//! Wallet commands: key creation and balance inspection.

use crate::chain::SubtensorClient;
use crate::cli::utils::{
    confirm, create_table_with_headers, format_address, format_tao, print_error, print_info,
    print_success, print_warning, prompt_password, resolve_endpoint, spinner,
};
use crate::cli::Cli;
use crate::config::DEFAULT_NETUID;
use crate::extrinsics::is_registered;
use crate::queries::balances::balance as query_balance;
use crate::wallet::{list_wallets, Mnemonic, Wallet};
use clap::{Args, Subcommand};

#[derive(Args, Clone)]
pub struct WalletCommand {
    #[command(subcommand)]
    pub command: WalletCommands,
}

#[derive(Subcommand, Clone)]
pub enum WalletCommands {
    /// Create a new coldkey
    NewColdkey {
        /// Wallet name
        #[arg(short, long, default_value = "default")]
        name: String,
        /// Number of mnemonic words (12, 15, 18, 21, 24)
        #[arg(long, default_value = "12")]
        words: usize,
        /// Skip password encryption
        #[arg(long)]
        no_password: bool,
    },

    /// Create a new hotkey under an existing wallet
    NewHotkey {
        /// Wallet name
        #[arg(short, long, default_value = "default")]
        name: String,
        /// Hotkey name
        #[arg(short = 'k', long, default_value = "default")]
        hotkey: String,
        /// Number of mnemonic words (12, 15, 18, 21, 24)
        #[arg(long, default_value = "12")]
        words: usize,
        /// Skip password encryption
        #[arg(long)]
        no_password: bool,
    },

    /// List wallets and their hotkeys
    List {
        /// Custom wallet directory
        #[arg(long)]
        path: Option<String>,
    },

    /// Show coldkey balances
    Balance {
        /// Wallet name (default: all wallets)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show balances and subnet registrations
    Overview {
        /// Wallet name (default: all wallets)
        #[arg(short, long)]
        name: Option<String>,
        /// Subnet to check registrations on
        #[arg(long, default_value_t = DEFAULT_NETUID)]
        netuid: u16,
    },
}

pub async fn execute(cmd: WalletCommand, cli: &Cli) -> anyhow::Result<()> {
    match cmd.command {
        WalletCommands::NewColdkey {
            name,
            words,
            no_password,
        } => new_coldkey(&name, words, no_password, cli).await,
        WalletCommands::NewHotkey {
            name,
            hotkey,
            words,
            no_password,
        } => new_hotkey(&name, &hotkey, words, no_password).await,
        WalletCommands::List { path } => list(path.as_deref()).await,
        WalletCommands::Balance { name } => balance(name.as_deref(), cli).await,
        WalletCommands::Overview { name, netuid } => overview(name.as_deref(), netuid, cli).await,
    }
}

const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Prompt for a password twice, or return None with `--no_password`.
fn encryption_password(no_password: bool) -> anyhow::Result<Option<String>> {
    if no_password {
        return Ok(None);
    }
    let password = prompt_password("Enter password for key encryption");
    let confirmed = prompt_password("Confirm password");
    if password != confirmed {
        print_error("Passwords do not match");
        return Err(anyhow::anyhow!("password mismatch"));
    }
    Ok(Some(password))
}

async fn new_coldkey(name: &str, words: usize, no_password: bool, cli: &Cli) -> anyhow::Result<()> {
    if !VALID_WORD_COUNTS.contains(&words) {
        print_error("Word count must be 12, 15, 18, 21, or 24");
        return Err(anyhow::anyhow!("invalid word count"));
    }

    let mut wallet = Wallet::new(name, "default", None)?;
    let overwrite = if wallet.coldkey_exists() {
        print_warning(&format!("Wallet '{}' already has a coldkey", name));
        if !confirm("Overwrite existing coldkey?", cli.no_prompt) {
            print_info("Aborted");
            return Ok(());
        }
        true
    } else {
        false
    };

    let mnemonic = Mnemonic::generate_with_words(words)?;
    let password = encryption_password(no_password)?;

    wallet.create_coldkey(password.as_deref(), Some(mnemonic.phrase()), overwrite)?;
    let address = wallet.coldkey_ss58(password.as_deref())?;

    print_success(&format!("Coldkey created for wallet '{}'", name));
    println!();
    print_warning("Save this mnemonic phrase securely, it is the only backup!");
    println!("Coldkey address:  {}", address);
    println!("Coldkey mnemonic: {}", mnemonic.phrase());
    Ok(())
}

async fn new_hotkey(
    name: &str,
    hotkey_name: &str,
    words: usize,
    no_password: bool,
) -> anyhow::Result<()> {
    if !VALID_WORD_COUNTS.contains(&words) {
        print_error("Word count must be 12, 15, 18, 21, or 24");
        return Err(anyhow::anyhow!("invalid word count"));
    }

    let mut wallet = Wallet::new(name, hotkey_name, None)?;
    if !wallet.coldkey_exists() {
        print_error(&format!(
            "Wallet '{}' has no coldkey; run `stcli wallet new-coldkey` first",
            name
        ));
        return Err(anyhow::anyhow!("wallet not found"));
    }

    let mnemonic = Mnemonic::generate_with_words(words)?;
    // Hotkeys usually stay unencrypted so the neurons can start unattended.
    let password = if no_password {
        None
    } else {
        let pwd = prompt_password("Enter password for hotkey encryption (empty for none)");
        if pwd.is_empty() {
            None
        } else {
            Some(pwd)
        }
    };

    wallet.create_hotkey(password.as_deref(), Some(mnemonic.phrase()), false)?;
    let address = wallet.hotkey_ss58(password.as_deref())?;

    print_success(&format!(
        "Hotkey '{}' created for wallet '{}'",
        hotkey_name, name
    ));
    println!();
    print_warning("Save this mnemonic phrase securely!");
    println!("Hotkey address:  {}", address);
    println!("Hotkey mnemonic: {}", mnemonic.phrase());
    Ok(())
}

async fn list(path: Option<&str>) -> anyhow::Result<()> {
    let names = match path {
        Some(p) => crate::wallet::list_wallets_at(std::path::Path::new(p))?,
        None => list_wallets()?,
    };
    if names.is_empty() {
        print_info("No wallets found");
        return Ok(());
    }

    let mut table = create_table_with_headers(&["Wallet", "Coldkey", "Hotkeys"]);
    for name in &names {
        let wallet = match Wallet::new(name, "default", path) {
            Ok(wallet) => wallet,
            Err(_) => continue,
        };
        let address = wallet
            .coldkey_ss58(None)
            .map(|a| format_address(&a))
            .unwrap_or_else(|_| "<encrypted>".to_string());
        let hotkeys = wallet.list_hotkeys().unwrap_or_default().join(", ");
        table.add_row(vec![name.clone(), address, hotkeys]);
    }

    println!("{table}");
    Ok(())
}

/// Wallet handles for `--name` or every wallet on disk.
fn select_wallets(name: Option<&str>) -> anyhow::Result<Vec<Wallet>> {
    let wallets = match name {
        Some(n) => vec![Wallet::new(n, "default", None)?],
        None => list_wallets()?
            .iter()
            .filter_map(|n| Wallet::new(n, "default", None).ok())
            .collect(),
    };
    Ok(wallets)
}

async fn balance(name: Option<&str>, cli: &Cli) -> anyhow::Result<()> {
    let endpoint = resolve_endpoint(&cli.network, cli.endpoint.as_deref());
    let sp = spinner(&format!("Connecting to {}...", endpoint));
    let client = SubtensorClient::connect(endpoint).await?;
    sp.finish_and_clear();

    let wallets = select_wallets(name)?;
    if wallets.is_empty() {
        print_info("No wallets found");
        return Ok(());
    }

    let mut table = create_table_with_headers(&["Wallet", "Coldkey", "Free Balance"]);
    for wallet in &wallets {
        let address = match wallet.coldkey_ss58(None) {
            Ok(address) => address,
            Err(e) => {
                print_warning(&format!("Could not read coldkey for '{}': {}", wallet.name, e));
                continue;
            }
        };
        let sp = spinner(&format!("Fetching balance for {}...", format_address(&address)));
        let free = query_balance(&client, &address).await.unwrap_or(0);
        sp.finish_and_clear();
        table.add_row(vec![
            wallet.name.clone(),
            format_address(&address),
            format_tao(free),
        ]);
    }

    println!("\n{table}");
    Ok(())
}

async fn overview(name: Option<&str>, netuid: u16, cli: &Cli) -> anyhow::Result<()> {
    let endpoint = resolve_endpoint(&cli.network, cli.endpoint.as_deref());
    let sp = spinner(&format!("Connecting to {}...", endpoint));
    let client = SubtensorClient::connect(endpoint).await?;
    sp.finish_and_clear();

    let wallets = select_wallets(name)?;
    if wallets.is_empty() {
        print_info("No wallets found");
        return Ok(());
    }

    let mut table = create_table_with_headers(&[
        "Wallet",
        "Hotkey",
        "Address",
        "Registered",
        "Coldkey Balance",
    ]);
    for wallet in &wallets {
        let free = match wallet.coldkey_ss58(None) {
            Ok(address) => query_balance(&client, &address).await.unwrap_or(0),
            Err(_) => 0,
        };

        for hotkey_name in wallet.list_hotkeys().unwrap_or_default() {
            let handle = match Wallet::new(&wallet.name, &hotkey_name, None) {
                Ok(handle) => handle,
                Err(_) => continue,
            };
            let address = match handle.hotkey_ss58(None) {
                Ok(address) => address,
                Err(_) => continue,
            };
            let registered = is_registered(&client, netuid, &address)
                .await
                .unwrap_or(false);
            table.add_row(vec![
                wallet.name.clone(),
                hotkey_name,
                format_address(&address),
                if registered { "yes" } else { "no" }.to_string(),
                format_tao(free),
            ]);
        }
    }

    println!("\n{table}");
    Ok(())
}
