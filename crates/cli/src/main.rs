//! Command Line Interface for the constant-product pool client.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cpamm_client_domain::{Address, Command, Snapshot, SwapDirection};
use cpamm_client_execution::prelude::*;
use cpamm_client_protocols::sandbox::{SandboxLedger, SandboxWallet};
use dotenv::dotenv;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Chain id reported by the sandbox wallet.
const SANDBOX_CHAIN_ID: u64 = 31337;

#[derive(Parser)]
#[command(name = "cpamm-client")]
#[command(about = "Constant-product pool client running against a seeded sandbox", long_about = None)]
struct Cli {
    /// Pool contract address
    #[arg(long, env = "POOL_ADDRESS", default_value = DEFAULT_POOL_ADDRESS, global = true)]
    pool: String,

    /// Token1 (TK1) contract address
    #[arg(long, env = "TOKEN1_ADDRESS", default_value = DEFAULT_TOKEN1_ADDRESS, global = true)]
    token1: String,

    /// Token2 (TK2) contract address
    #[arg(long, env = "TOKEN2_ADDRESS", default_value = DEFAULT_TOKEN2_ADDRESS, global = true)]
    token2: String,

    /// Seconds to wait for each transaction to become final
    #[arg(long, default_value_t = 120, global = true)]
    finality_timeout_secs: u64,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pool reserves and the account's share
    Snapshot,
    /// Swap TK1 for TK2 (or TK2 for TK1 with --reverse)
    Swap {
        /// Amount of the input token (e.g. 1.5)
        amount: String,

        /// Sell TK2 instead of TK1
        #[arg(long)]
        reverse: bool,
    },
    /// Deposit both tokens into the pool
    Add {
        /// Amount of TK1
        amount1: String,

        /// Amount of TK2
        amount2: String,
    },
    /// Burn pool shares for both tokens
    Remove {
        /// Shares to burn
        shares: String,
    },
}

/// Sandbox with the pool at the configured address and a funded account.
fn seeded_sandbox(pool: &PoolConfig) -> Result<SandboxLedger> {
    let account = Address::from_low_u64_be(0xa11ce);
    let other_provider = Address::from_low_u64_be(0xb0b);
    let token1 = pool.tokens.token1.address;
    let token2 = pool.tokens.token2.address;

    let ledger = SandboxLedger::new(pool.pool_address, token1, token2, account);
    ledger.mint(token1, account, "1000".parse()?);
    ledger.mint(token2, account, "1000".parse()?);
    ledger.seed_pool(
        "10000".parse()?,
        "20000".parse()?,
        &[(account, "100".parse()?), (other_provider, "9900".parse()?)],
    );
    Ok(ledger)
}

fn snapshot_json(snapshot: &Snapshot) -> Value {
    json!({
        "reserve1": snapshot.reserve1.to_string(),
        "reserve2": snapshot.reserve2.to_string(),
        "total_shares": snapshot.total_shares.to_string(),
        "caller_shares": snapshot.caller_shares.to_string(),
        "pool_share_percent": snapshot.pool_share_percent().to_string(),
    })
}

fn steps_json(summary: Option<&RunSummary>) -> Value {
    let steps: Vec<Value> = summary
        .map(|s| s.steps.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|step| {
            json!({
                "operation": step.operation.name(),
                "status": step.status,
                "tx_hash": step.tx_hash,
                "block": step.block,
            })
        })
        .collect();
    Value::Array(steps)
}

fn print_snapshot(pool: &PoolConfig, snapshot: &Snapshot) {
    let symbol1 = &pool.tokens.token1.symbol;
    let symbol2 = &pool.tokens.token2.symbol;

    println!("\n📊 Pool Snapshot");
    println!("════════════════════════════════════");
    println!("{symbol1} Reserve:     {}", snapshot.reserve1);
    println!("{symbol2} Reserve:     {}", snapshot.reserve2);
    println!("Total Shares:    {}", snapshot.total_shares);
    println!("Your Shares:     {}", snapshot.caller_shares);
    println!("Pool Share:      {}%", snapshot.pool_share_percent());
    println!("════════════════════════════════════");
}

fn print_steps(summary: Option<&RunSummary>) {
    let Some(summary) = summary else {
        return;
    };

    println!("\n🧾 Run {}", summary.run_id);
    println!(
        "{:<4} | {:<16} | {:<10} | {:<8}",
        "Step", "Operation", "Status", "Block"
    );
    println!("{}", "-".repeat(46));
    for (index, step) in summary.steps.iter().enumerate() {
        println!(
            "{:<4} | {:<16} | {:<10} | {:<8}",
            index,
            step.operation.name(),
            format!("{:?}", step.status),
            step.block.map(|b| b.to_string()).unwrap_or_default()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    run(Cli::parse()).await
}

/// Executes one CLI command; a failed run is returned as its [`RunFailure`].
async fn run(cli: Cli) -> Result<()> {
    let pool = PoolConfig::from_addresses(&cli.pool, &cli.token1, &cli.token2)?;
    let config = OrchestratorConfig::default()
        .with_finality_timeout(Duration::from_secs(cli.finality_timeout_secs));

    let ledger = seeded_sandbox(&pool)?;
    let wallet = Arc::new(SandboxWallet::new(ledger, SANDBOX_CHAIN_ID));
    let session = Arc::new(Session::new(wallet));
    let orchestrator = Orchestrator::new(session, pool.clone(), config);

    let initial = orchestrator
        .connect()
        .await
        .context("Failed to connect to the pool")?;

    let command = match &cli.command {
        Commands::Snapshot => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&snapshot_json(&initial))?);
            } else {
                print_snapshot(&pool, &initial);
            }
            return Ok(());
        }
        Commands::Swap { amount, reverse } => {
            let direction = if *reverse {
                SwapDirection::Token2ToToken1
            } else {
                SwapDirection::Token1ToToken2
            };
            Command::swap(amount, direction)
        }
        Commands::Add { amount1, amount2 } => Command::add_liquidity(amount1, amount2),
        Commands::Remove { shares } => Command::remove_liquidity(shares),
    }
    .context("Invalid amount")?;

    info!(command = %command.kind(), "Executing command");
    let result = orchestrator.run(command).await;
    let summary = orchestrator.lifecycle().latest().await;

    match result {
        Ok(snapshot) => {
            if cli.json {
                let output = json!({
                    "command": command.kind().to_string(),
                    "status": "completed",
                    "snapshot": snapshot_json(&snapshot),
                    "steps": steps_json(summary.as_ref()),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("✅ {} completed", command.kind());
                print_steps(summary.as_ref());
                print_snapshot(&pool, &snapshot);
            }
            Ok(())
        }
        Err(failure) => {
            if cli.json {
                let output = json!({
                    "command": failure.command.to_string(),
                    "status": "failed",
                    "message": failure.message,
                    "failed_step": failure.failed_step,
                    "steps": steps_json(summary.as_ref()),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("❌ {} failed", failure.command);
                print_steps(summary.as_ref());
            }
            Err(failure.into())
        }
    }
}
