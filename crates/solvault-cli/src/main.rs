//! Solvault command-line wallet
//!
//! Every invocation is one session: the PIN unlocks the vault for the
//! duration of the command and the keypair is dropped on exit.

mod rpc_client;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use rpc_client::JsonRpcLedger;
use solvault_core::Error as VaultError;
use solvault_service::{Asset, TransferRequest, WalletService};
use solvault_storage::{Database, VaultStore};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "solvault", about = "Local PIN-vault wallet", version)]
struct Cli {
    /// Database path (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// PIN; prompted interactively when omitted
    #[arg(long, global = true)]
    pin: Option<String>,

    /// RPC endpoint override for this invocation
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set up a PIN and create (or import) a wallet
    Init {
        /// Import an existing secret key (JSON byte array) instead of generating
        #[arg(long)]
        import: Option<String>,
    },
    /// Show wallet and session status
    Status,
    /// Show the wallet address
    Address,
    /// Show native and token balances
    Balance {
        /// Re-query even when the cache is clean
        #[arg(long)]
        force: bool,
    },
    /// Show recent transaction signatures
    History,
    /// Send native tokens or a token mint
    Send {
        /// Recipient address (base58)
        recipient: String,
        /// Amount in decimal units
        amount: f64,
        /// Token mint to send instead of the native token
        #[arg(long)]
        mint: Option<String>,
        /// Decimals of the mint (discovered from holdings when omitted)
        #[arg(long)]
        decimals: Option<u8>,
    },
    /// Print the secret key as a JSON byte array
    Export,
    /// Change the PIN and re-encrypt the vault
    ChangePin,
    /// Show or set the saved RPC endpoint
    Endpoint {
        /// New endpoint URL; prints the current one when omitted
        url: Option<String>,
    },
    /// Check endpoint reachability
    Probe,
    /// Remove the stored wallet (PIN stays configured)
    Disconnect {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Wipe wallet, PIN, and session state
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let store = VaultStore::new(Arc::new(
        Database::open(&db_path).map_err(|e| anyhow!("{}", e))?,
    ));
    let endpoint = match &cli.endpoint {
        Some(url) => url.clone(),
        None => store.endpoint().map_err(|e| anyhow!("{}", e))?,
    };
    let rpc = Arc::new(JsonRpcLedger::new(endpoint.clone()).map_err(friendly)?);
    let service = WalletService::new(store, rpc);

    match cli.command {
        Command::Init { import } => init(&service, &cli.pin, import).await,
        Command::Status => status(&service),
        Command::Address => {
            let pubkey = unlock(&service, &cli.pin)?;
            println!("{}", pubkey);
            Ok(())
        }
        Command::Balance { force } => balance(&service, &cli.pin, force).await,
        Command::History => history(&service, &cli.pin).await,
        Command::Send {
            recipient,
            amount,
            mint,
            decimals,
        } => send(&service, &cli.pin, recipient, amount, mint, decimals).await,
        Command::Export => export(&service, &cli.pin),
        Command::ChangePin => change_pin(&service),
        Command::Endpoint { url } => match url {
            Some(url) => {
                service.set_endpoint(&url).map_err(friendly)?;
                println!("Endpoint saved: {}", url);
                Ok(())
            }
            None => {
                println!("{}", service.endpoint().map_err(friendly)?);
                Ok(())
            }
        },
        Command::Probe => {
            let slot = service.probe_endpoint().await.map_err(friendly)?;
            println!("Endpoint {} reachable at slot {}", endpoint, slot);
            Ok(())
        }
        Command::Disconnect { yes } => {
            if !yes && !confirm("Remove the stored wallet? The key is unrecoverable without a backup.")? {
                return Ok(());
            }
            service.disconnect().map_err(friendly)?;
            println!("Wallet removed.");
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes && !confirm("Wipe the wallet AND the PIN? This cannot be undone.")? {
                return Ok(());
            }
            service.reset().map_err(friendly)?;
            println!("Vault reset. Run `solvault init` to start over.");
            Ok(())
        }
    }
}

async fn init(
    service: &WalletService,
    pin_arg: &Option<String>,
    import: Option<String>,
) -> Result<()> {
    let status = service.status().map_err(friendly)?;
    if status.needs_pin_setup {
        let pin = match pin_arg {
            Some(pin) => pin.clone(),
            None => {
                let first = prompt("Choose a PIN (4-8 digits): ")?;
                let second = prompt("Repeat the PIN: ")?;
                if first != second {
                    bail!("PINs do not match");
                }
                first
            }
        };
        service.setup_pin(&pin).map_err(friendly)?;
    } else {
        let pin = match pin_arg {
            Some(pin) => pin.clone(),
            None => prompt("PIN: ")?,
        };
        // A wallet-less unlock is exactly the state init continues from
        match service.unlock(&pin) {
            Ok(Some(_)) => bail!("a wallet already exists; use `solvault disconnect` first"),
            Ok(None) => {}
            Err(e) => return Err(friendly(e)),
        }
    }

    let pubkey = match import {
        Some(json) => service.import_wallet_json(&json).map_err(friendly)?,
        None => service.generate_wallet().map_err(friendly)?,
    };
    println!("Wallet ready: {}", pubkey);
    println!("Back up the secret key with `solvault export` and store it safely.");
    Ok(())
}

fn status(service: &WalletService) -> Result<()> {
    let status = service.status().map_err(friendly)?;
    if status.needs_pin_setup {
        println!("No PIN configured. Run `solvault init`.");
    } else if status.has_wallet {
        println!("Wallet stored; PIN required to unlock.");
    } else {
        println!("PIN configured, no wallet stored. Run `solvault init`.");
    }
    println!("Endpoint: {}", service.endpoint().map_err(friendly)?);
    Ok(())
}

async fn balance(service: &WalletService, pin: &Option<String>, force: bool) -> Result<()> {
    unlock(service, pin)?;
    let snapshot = service.refresh_balances(force).await.map_err(friendly)?;
    println!(
        "{} SOL",
        snapshot.lamports as f64 / solvault_core::LAMPORTS_PER_SOL as f64
    );
    for token in &snapshot.tokens {
        println!(
            "{} (mint {})",
            token.amount as f64 / 10f64.powi(token.decimals as i32),
            token.mint
        );
    }
    Ok(())
}

async fn history(service: &WalletService, pin: &Option<String>) -> Result<()> {
    unlock(service, pin)?;
    let records = service.refresh_history(false).await.map_err(friendly)?;
    if records.is_empty() {
        println!("No transactions found.");
    }
    for record in records {
        match record.block_time {
            Some(time) => println!("{}  (block time {})", record.signature, time),
            None => println!("{}", record.signature),
        }
    }
    Ok(())
}

async fn send(
    service: &WalletService,
    pin: &Option<String>,
    recipient: String,
    amount: f64,
    mint: Option<String>,
    decimals: Option<u8>,
) -> Result<()> {
    unlock(service, pin)?;

    // The catalog lists the native token under a sentinel mint id
    let mint = mint.filter(|m| m != solvault_core::NATIVE_MINT);
    let request = match mint {
        None => TransferRequest {
            recipient,
            asset: Asset::Native,
            amount,
            decimals: 9,
        },
        Some(mint) => {
            let decimals = match decimals {
                Some(d) => d,
                None => {
                    let snapshot = service.refresh_balances(false).await.map_err(friendly)?;
                    snapshot
                        .tokens
                        .iter()
                        .find(|t| t.mint == mint)
                        .map(|t| t.decimals)
                        .ok_or_else(|| anyhow!("mint {} not held; pass --decimals", mint))?
                }
            };
            TransferRequest {
                recipient,
                asset: Asset::Token { mint },
                amount,
                decimals,
            }
        }
    };

    match service.transfer(&request).await {
        Ok(outcome) => {
            println!("Transfer confirmed: {}", outcome.signature);
            if outcome.rent_bumped {
                println!(
                    "Amount was raised to {} base units to keep the recipient account rent-exempt.",
                    outcome.amount_sent
                );
            }
            Ok(())
        }
        // Ambiguous outcome: must not read as a plain failure
        Err(e @ VaultError::ConfirmationTimeout { .. }) => {
            println!("{}", e.user_message());
            println!("Do NOT re-send until you have checked the signature status.");
            Err(anyhow!("confirmation timed out"))
        }
        Err(e) => Err(friendly(e)),
    }
}

fn export(service: &WalletService, pin: &Option<String>) -> Result<()> {
    unlock(service, pin)?;
    let secret = service.export_secret_key().map_err(friendly)?;
    println!("{}", &*secret);
    eprintln!("Anyone with this key controls the wallet. Store it offline.");
    Ok(())
}

fn change_pin(service: &WalletService) -> Result<()> {
    let old = prompt("Current PIN: ")?;
    let new = prompt("New PIN (4-8 digits): ")?;
    let repeat = prompt("Repeat the new PIN: ")?;
    if new != repeat {
        bail!("PINs do not match");
    }
    service.change_pin(&old, &new).map_err(friendly)?;
    println!("PIN changed.");
    Ok(())
}

// Unlock for this invocation, prompting for the PIN if not given
fn unlock(service: &WalletService, pin: &Option<String>) -> Result<solvault_core::Pubkey> {
    let status = service.status().map_err(friendly)?;
    if status.needs_pin_setup {
        bail!("no PIN configured; run `solvault init` first");
    }

    let pin = match pin {
        Some(pin) => pin.clone(),
        None => prompt("PIN: ")?,
    };
    match service.unlock(&pin) {
        Ok(Some(pubkey)) => Ok(pubkey),
        Ok(None) => Err(friendly(VaultError::NoWalletFound)),
        Err(e) => Err(friendly(e)),
    }
}

fn default_db_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "solvault", "solvault")
        .ok_or_else(|| anyhow!("could not determine a data directory; pass --db"))?;
    Ok(dirs.data_dir().join("vault.db"))
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [y/N] ", question))?;
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

fn friendly(e: VaultError) -> anyhow::Error {
    anyhow!("{}", e.user_message())
}
