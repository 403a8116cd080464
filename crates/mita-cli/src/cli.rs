//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// MITA - Budget allocation and redistribution engine
#[derive(Parser)]
#[command(name = "mita")]
#[command(about = "Build, monitor and rebalance monthly budgets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Engine config override (TOML)
    ///
    /// Defaults to <data dir>/mita/config/budget.toml when present,
    /// otherwise the built-in configuration is used.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON instead of a human-readable summary
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Base allocation for a monthly income
    Allocate {
        /// Monthly income
        #[arg(short, long)]
        income: f64,

        /// Income tier override: low, lower_middle, middle, upper_middle, high
        #[arg(short, long)]
        tier: Option<String>,
    },

    /// Personalized recommendation using collaborator data when available
    Recommend {
        /// Monthly income
        #[arg(short, long)]
        income: f64,

        /// Income tier override
        #[arg(short, long)]
        tier: Option<String>,

        /// Financial goals (comma-separated, e.g. "emergency_fund,travel")
        #[arg(short, long, value_delimiter = ',')]
        goals: Vec<String>,

        /// Location (e.g. "Seattle, WA")
        #[arg(short, long)]
        location: Option<String>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Spending velocity per category
    Velocity {
        #[command(flatten)]
        period: PeriodArgs,
    },

    /// Velocity plus a redistribution plan
    Redistribute {
        /// Monthly income
        #[arg(short, long)]
        income: f64,

        #[command(flatten)]
        period: PeriodArgs,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Spread a budget across the days of a month
    Daily {
        /// Budget JSON file ({"category": amount, ...})
        #[arg(short, long)]
        budget: PathBuf,

        /// Month (YYYY-MM); defaults to the month of --as-of, else the current month
        #[arg(short, long)]
        month: Option<String>,

        /// Today's date (YYYY-MM-DD) for the remaining daily budget
        #[arg(long)]
        as_of: Option<String>,

        /// Spent-so-far JSON file; with --as-of, also shows the remaining daily budget
        #[arg(short, long)]
        spent: Option<PathBuf>,
    },

    /// Show or initialize the engine configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Budget, spending and period inputs shared by velocity commands
#[derive(Args)]
pub struct PeriodArgs {
    /// Budget JSON file ({"category": amount, ...})
    #[arg(short, long)]
    pub budget: PathBuf,

    /// Spent-so-far JSON file ({"category": amount, ...})
    #[arg(short, long)]
    pub spent: Option<PathBuf>,

    /// Days left in the period
    #[arg(short, long)]
    pub remaining_days: Option<u32>,

    /// Date (YYYY-MM-DD); uses its calendar month as the period
    #[arg(long)]
    pub as_of: Option<String>,
}

/// Where collaborator data comes from
#[derive(Args)]
pub struct SourceArgs {
    /// JSON snapshot with profile, history, behavior and peer data
    ///
    /// Overrides MITA_DATA_SOURCE / MITA_API_URL / MITA_DATA_FILE.
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Ignore configured collaborators and use defaults only
    #[arg(long, conflicts_with = "data")]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the resolved configuration
    Show,

    /// Print the override path
    Path,

    /// Write the built-in configuration to the override path for editing
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
