//! fixmarket-demo - operate the demo mode flag and inspect reconciled feeds

use std::process;
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use fixmarket_demo::api::DemoFeed;
use fixmarket_demo::core::{AdAnalyticsRow, RepairerListing};
use fixmarket_demo::flag::{Actor, DemoModeFlag, Role};
use fixmarket_demo::storage::StoredRecord;
use fixmarket_demo::{Config, SyntheticCatalog};

#[derive(Parser)]
#[command(name = "fixmarket-demo")]
#[command(about = "Demo mode administration for the repair marketplace", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "fixmarket.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current demo mode flag
    Status,

    /// Turn demo mode on
    Enable {
        /// Acting account id
        #[arg(long)]
        actor: String,
        /// Acting account role (administrator, member)
        #[arg(long, default_value = "administrator")]
        role: String,
    },

    /// Turn demo mode off
    Disable {
        /// Acting account id
        #[arg(long)]
        actor: String,
        /// Acting account role (administrator, member)
        #[arg(long, default_value = "administrator")]
        role: String,
    },

    /// Print a reconciled feed as JSON
    List {
        /// Which collection to show
        #[arg(value_enum)]
        collection: Collection,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Collection {
    Repairers,
    Ads,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run_application().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run_application() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = fixmarket_demo::init(Some(cli.config.as_str())).context("failed to initialise")?;

    match cli.command {
        Commands::Status => {
            let flag = DemoModeFlag::from_config(&config).await?;
            let state = flag.state().await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Commands::Enable { actor, role } => set_flag(&config, actor, &role, true).await?,
        Commands::Disable { actor, role } => set_flag(&config, actor, &role, false).await?,
        Commands::List { collection } => match collection {
            Collection::Repairers => print_feed::<RepairerListing>(&config, "repairers").await?,
            Collection::Ads => print_feed::<AdAnalyticsRow>(&config, "ad_analytics").await?,
        },
    }

    Ok(())
}

async fn set_flag(config: &Config, actor: String, role: &str, enabled: bool) -> anyhow::Result<()> {
    let role = Role::from_str(role).map_err(|_| anyhow::anyhow!("unknown role '{}'", role))?;
    let actor = Actor { id: actor, role };
    let flag = DemoModeFlag::from_config(config).await?;
    let state = flag.set(&actor, enabled).await?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

async fn print_feed<T>(config: &Config, collection: &str) -> anyhow::Result<()>
where
    T: StoredRecord + SyntheticCatalog + Serialize,
{
    let feed = DemoFeed::<T>::from_config(config, collection).await?;
    let snapshot = feed.refresh().await;
    if let Some(error) = &snapshot.error {
        anyhow::bail!("could not load '{}': {}", collection, error);
    }
    println!("{}", serde_json::to_string_pretty(snapshot.records())?);
    Ok(())
}
