//! CLI execution context

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use std::sync::Arc;
use std::time::Duration;
use taskhunt_sdk::{FilterStore, SdkConfig, TaskHuntClient, TaskQueries};
use tracing::debug;

use crate::cli::Cli;
use crate::config::{CliConfig, Profile, DEFAULT_API_URL};
use crate::output::{OutputFormat, OutputWriter};

/// Execution context for CLI commands
pub struct Context {
    /// CLI configuration
    pub config: CliConfig,

    /// Active profile name
    pub profile_name: Option<String>,

    /// Active profile
    pub profile: Profile,

    /// Output format
    pub output_format: OutputFormat,

    /// Output writer
    pub output: OutputWriter,

    /// Verbose mode
    pub verbose: bool,

    /// API URL override
    pub api_url_override: Option<String>,
}

impl Context {
    /// Create a new context from CLI arguments
    pub fn new(cli: &Cli) -> Result<Self> {
        Self::with_config(cli, CliConfig::load().unwrap_or_default())
    }

    /// Create a context from CLI arguments and an already loaded configuration
    pub fn with_config(cli: &Cli, config: CliConfig) -> Result<Self> {
        // Determine active profile
        let profile_name = cli.profile.clone().or_else(|| config.default_profile.clone());
        let profile = config
            .get_profile(profile_name.as_deref())
            .cloned()
            .unwrap_or_default();

        // Flag, then profile, then global settings
        let output_format = match cli.output {
            Some(format) => format,
            None => {
                let configured = profile
                    .output_format
                    .as_deref()
                    .unwrap_or(&config.settings.output_format);
                OutputFormat::from_str(configured, true).map_err(|e| {
                    anyhow::anyhow!("Invalid output format '{}' in configuration: {}", configured, e)
                })?
            }
        };
        let output = OutputWriter::new(output_format, cli.no_color || !config.settings.color);

        Ok(Self {
            verbose: cli.verbose || config.settings.verbose,
            api_url_override: cli.api_url.clone().filter(|url| !url.trim().is_empty()),
            config,
            profile_name,
            profile,
            output_format,
            output,
        })
    }

    /// Get the effective API URL
    pub fn api_url(&self) -> &str {
        self.api_url_override
            .as_deref()
            .or(self.profile.api_url.as_deref())
            .unwrap_or(DEFAULT_API_URL)
    }

    /// Create an SDK client
    pub fn create_client(&self) -> Result<TaskHuntClient> {
        let mut builder = SdkConfig::builder(self.api_url()).with_logging(self.verbose);
        if let Some(secs) = self.config.settings.timeout_secs {
            builder = builder.with_timeout(Duration::from_secs(secs));
        }

        // Add custom headers from profile
        for (name, value) in &self.profile.headers {
            builder = builder.with_header(name.clone(), value.clone());
        }

        debug!(
            api_url = %self.api_url(),
            profile = self.profile_name.as_deref().unwrap_or("default"),
            timeout_secs = ?self.config.settings.timeout_secs,
            "Creating API client"
        );
        TaskHuntClient::new(builder.build()).context("Failed to create API client")
    }

    /// Create a query layer over a fresh client, reading from `filters`
    pub fn create_queries(&self, filters: FilterStore) -> Result<TaskQueries<TaskHuntClient>> {
        Ok(TaskQueries::new(Arc::new(self.create_client()?), filters))
    }
}
