//! taskhunt: command-line browser for the TaskHunt task catalog

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod config;
mod context;
mod output;

use cli::{Cli, Commands};
use context::Context;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::new(&cli)?;
    init_tracing(ctx.verbose);
    tracing::debug!(
        profile = ctx.profile_name.as_deref().unwrap_or("default"),
        output = %ctx.output_format,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Tasks(cmd) => commands::tasks::execute(&ctx, cmd).await,
        Commands::Stats => commands::stats::stats(&ctx).await,
        Commands::Filters => commands::stats::filters(&ctx).await,
        Commands::Config(cmd) => commands::config::execute(&ctx, cmd).await,
    }
}

/// Logs go to stderr so they never mix with JSON or YAML output.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "taskhunt_sdk=debug,taskhunt=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
