//! MITA CLI - Budget allocation and redistribution
//!
//! Usage:
//!   mita allocate --income 3000                      Base allocation
//!   mita recommend --income 6000 --goals travel      Personalized recommendation
//!   mita velocity --budget b.json --spent s.json -r 15
//!   mita redistribute --income 3000 --budget b.json --spent s.json --as-of 2024-06-15
//!   mita daily --budget b.json --month 2024-06       Daily calendar
//!   mita serve --port 3000                           Start the REST API

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();
    let json = cli.json;

    match cli.command {
        Commands::Allocate { income, tier } => {
            let engine = commands::build_engine(config_path, None)?;
            commands::cmd_allocate(&engine, income, tier.as_deref(), json)
        }
        Commands::Recommend {
            income,
            tier,
            goals,
            location,
            source,
        } => {
            let engine = commands::build_engine(config_path, Some(&source))?;
            let request = commands::build_request(income, tier.as_deref(), &goals, location)?;
            commands::cmd_recommend(&engine, &request, json).await
        }
        Commands::Velocity { period } => {
            let engine = commands::build_engine(config_path, None)?;
            commands::cmd_velocity(&engine, &period, json)
        }
        Commands::Redistribute {
            income,
            period,
            source,
        } => {
            let engine = commands::build_engine(config_path, Some(&source))?;
            commands::cmd_redistribute(&engine, income, &period, json).await
        }
        Commands::Daily {
            budget,
            month,
            as_of,
            spent,
        } => commands::cmd_daily(
            &budget,
            month.as_deref(),
            as_of.as_deref(),
            spent.as_deref(),
            json,
        ),
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => commands::cmd_config_show(config_path, json),
            Some(ConfigAction::Path) => commands::cmd_config_path(config_path),
            Some(ConfigAction::Init { force }) => commands::cmd_config_init(config_path, force),
        },
        Commands::Serve { port, host, source } => {
            let engine = commands::build_engine(config_path, Some(&source))?;
            commands::cmd_serve(engine, &host, port).await
        }
    }
}
