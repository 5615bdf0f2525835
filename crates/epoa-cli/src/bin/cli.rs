use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use epoa_consensus::{governor, validation, SealWait, Sealer};
use epoa_core::{ChainConfig, Header};

#[derive(Parser)]
#[command(name = "epoa-cli")]
#[command(about = "ePoA elastic block period CLI", long_about = None)]
struct Cli {
    /// Genesis file holding the clique section
    #[arg(long, global = true, default_value = "genesis.json")]
    genesis: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration and governor mode
    Show,

    /// Compute the period required after a parent block
    Period {
        #[command(flatten)]
        parent: ParentArgs,
    },

    /// Check a child timestamp against its parent
    Verify {
        #[command(flatten)]
        parent: ParentArgs,

        /// Timestamp of the child header
        #[arg(long)]
        time: u64,
    },

    /// Plan the next local block and wait for its slot (Ctrl-C cancels)
    Seal {
        #[command(flatten)]
        parent: ParentArgs,
    },
}

#[derive(Args)]
struct ParentArgs {
    /// Parent block number
    #[arg(long)]
    number: u64,

    /// Parent timestamp (unix seconds)
    #[arg(long, default_value_t = 0)]
    parent_time: u64,

    /// Gas used by the parent
    #[arg(long)]
    gas_used: u64,

    /// Gas limit of the parent
    #[arg(long)]
    gas_limit: u64,
}

impl ParentArgs {
    fn header(&self) -> Header {
        Header::new(self.number, self.parent_time, self.gas_used, self.gas_limit)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let config = ChainConfig::from_genesis_file(&cli.genesis)
        .with_context(|| format!("loading {}", cli.genesis.display()))?;

    match cli.command {
        Commands::Show => {
            let summary = serde_json::json!({
                "config": config,
                "governor": config.governor_mode().as_str(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Period { parent } => {
            let decision = governor::decide(&config, Some(&parent.header()));
            info!(
                parent = parent.number,
                utilization = ?decision.utilization,
                period = decision.period,
                regime = decision.regime.as_str(),
                "computed block period"
            );
            println!("{}", decision.period);
        }
        Commands::Verify { parent, time } => {
            let parent = parent.header();
            let child = parent.child(time);
            match validation::verify_timestamp(&config, &child, &parent) {
                Ok(period) => println!("accepted (period {}s)", period),
                Err(err) => {
                    println!("rejected: {}", err);
                    bail!(err);
                }
            }
        }
        Commands::Seal { parent } => {
            let sealer = Sealer::new(config);
            let parent = parent.header();
            let plan = sealer.prepare(&parent);
            println!(
                "block {} at {} (period {}s, wait {}s)",
                plan.number,
                plan.timestamp,
                plan.period,
                plan.delay.as_secs()
            );

            let cancel = CancellationToken::new();
            let interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    interrupt.cancel();
                }
            });

            match sealer.wait(&plan, &cancel).await {
                SealWait::Ready => info!("Block {} may be sealed now", plan.number),
                SealWait::Cancelled => warn!("Seal of block {} cancelled", plan.number),
            }
        }
    }

    Ok(())
}
