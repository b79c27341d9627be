mod leagues;
mod quote;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::leagues::{LeaguesCommands, ScheduleArgs};
use crate::quote::QuoteArgs;

#[derive(Debug, Parser)]
#[command(name = "leagueops")]
#[command(about = "League registration refund tooling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Calculate the refund or store credit owed for a cancellation
    Quote(QuoteArgs),
    /// Show the refund tier boundaries for a season
    Schedule(ScheduleArgs),
    /// Inspect the league catalog
    Leagues {
        #[command(subcommand)]
        command: LeaguesCommands,
    },
}

fn main() -> anyhow::Result<()> {
    let config = leagueops_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Quote(args)) => quote::run_quote(&config, &args)?,
        Some(Commands::Schedule(args)) => leagues::run_schedule(&config, &args)?,
        Some(Commands::Leagues {
            command: LeaguesCommands::List,
        }) => leagues::run_leagues_list(&config)?,
        None => println!("leagueops: run with --help to see available commands"),
    }

    Ok(())
}
