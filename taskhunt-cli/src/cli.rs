//! Command-line arguments

use clap::{Parser, Subcommand};

use crate::commands::config::ConfigCommands;
use crate::commands::tasks::TasksCommands;
use crate::output::OutputFormat;

/// Browse the TaskHunt benchmark task catalog
#[derive(Debug, Parser)]
#[command(name = "taskhunt")]
#[command(about = "Explore benchmark tasks from the command line", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Output format (defaults to the profile or settings value)
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log requests and cache activity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// API base URL, overrides the profile
    #[arg(long, global = true, env = taskhunt_sdk::API_URL_ENV)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List, inspect and search tasks
    Tasks(TasksCommands),

    /// Show catalog statistics
    Stats,

    /// Show the values available for each filter
    Filters,

    /// Manage CLI configuration and profiles
    Config(ConfigCommands),
}
