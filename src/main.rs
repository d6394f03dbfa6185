use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use follow_gate::{
    config::HubConfig,
    ledger::{Address, HubAction, LedgerSnapshot, ProfileId},
    receipt::Receipt,
    Hub,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "follow-gate")]
#[command(about = "Replay hub actions through follower-only reference gating")]
struct Cli {
    /// Hub configuration (JSON). Defaults register the follower-only module.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and print every receipt plus the final snapshot
    Run {
        scenario: PathBuf,
        /// Exit non-zero if any step is rejected
        #[arg(long)]
        strict: bool,
    },

    /// Run a scenario, then report whether an address currently follows a profile
    Follower {
        scenario: PathBuf,
        #[arg(long)]
        profile: ProfileId,
        #[arg(long)]
        address: Address,
    },
}

#[derive(Deserialize)]
struct Scenario {
    steps: Vec<Step>,
}

#[derive(Deserialize)]
struct Step {
    sender: Address,
    action: HubAction,
    #[serde(default)]
    timestamp: Option<u64>,
}

#[derive(Serialize)]
struct RunReport<'a> {
    accepted: usize,
    rejected: usize,
    receipts: &'a [Receipt],
    snapshot: LedgerSnapshot,
}

#[derive(Serialize)]
struct FollowerReport {
    profile_id: ProfileId,
    address: Address,
    deployed: bool,
    balance: u64,
    follower: bool,
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse scenario {}", path.display()))
}

fn replay(hub: &mut Hub, scenario: Scenario, stop_on_rejection: bool) {
    for (idx, step) in scenario.steps.into_iter().enumerate() {
        let result = match step.timestamp {
            Some(timestamp) => hub.execute_at(&step.sender, step.action, timestamp),
            None => hub.execute(&step.sender, step.action),
        };
        if let Err(err) = result {
            if stop_on_rejection {
                tracing::warn!(step = idx, %err, "stopping scenario at first rejection");
                break;
            }
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => HubConfig::from_file(path).context("failed to load configuration")?,
        None => HubConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut hub = config.build_hub().context("failed to build hub")?;

    match cli.command {
        Commands::Run { scenario, strict } => {
            let scenario = load_scenario(&scenario)?;
            replay(&mut hub, scenario, config.stop_on_rejection);
            let accepted = hub.receipts().iter().filter(|r| r.is_accepted()).count();
            let rejected = hub.receipts().len() - accepted;
            let report = RunReport {
                accepted,
                rejected,
                receipts: hub.receipts(),
                snapshot: hub.snapshot(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            tracing::info!(accepted, rejected, "scenario finished");
            if strict && rejected > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Follower {
            scenario,
            profile,
            address,
        } => {
            let scenario = load_scenario(&scenario)?;
            replay(&mut hub, scenario, config.stop_on_rejection);
            let follows = hub.follows();
            let report = FollowerReport {
                profile_id: profile,
                deployed: follows.deployed(profile),
                balance: follows.balance_of(profile, &address),
                follower: follows.is_follower(profile, &address),
                address,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}
