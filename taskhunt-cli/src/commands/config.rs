//! Configuration commands

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;

use crate::config::{CliConfig, Profile};
use crate::context::Context;
use crate::output::OutputFormat;

/// Configuration management commands
#[derive(Debug, Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration
    Show,

    /// Set a configuration value. A bare field (e.g. api_url) applies to
    /// the active profile.
    Set {
        /// Configuration key (e.g., settings.timeout_secs, profile.staging.api_url)
        key: String,

        /// Value to set
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// List all profiles
    Profiles,

    /// Set the default profile
    UseProfile {
        /// Profile name to use as default
        name: String,
    },

    /// Create a new profile
    CreateProfile {
        /// Profile name
        name: String,

        /// API URL for this profile
        #[arg(long = "url")]
        url: Option<String>,

        /// Copy settings from another profile
        #[arg(long)]
        from: Option<String>,
    },

    /// Delete a profile
    DeleteProfile {
        /// Profile name to delete
        name: String,

        /// Force deletion without confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,

    /// Reset configuration to defaults
    Reset {
        /// Force reset without confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Execute configuration commands
pub async fn execute(ctx: &Context, cmd: ConfigCommands) -> Result<()> {
    match cmd.command {
        ConfigSubcommand::Show => show(ctx).await,
        ConfigSubcommand::Set { key, value } => {
            set(ctx, &key, &value, ctx.profile_name.as_deref()).await
        }
        ConfigSubcommand::Get { key } => get(ctx, &key, ctx.profile_name.as_deref()).await,
        ConfigSubcommand::Profiles => list_profiles(ctx).await,
        ConfigSubcommand::UseProfile { name } => use_profile(ctx, &name).await,
        ConfigSubcommand::CreateProfile { name, url, from } => {
            create_profile(ctx, &name, url.as_deref(), from.as_deref()).await
        }
        ConfigSubcommand::DeleteProfile { name, force } => {
            delete_profile(ctx, &name, force).await
        }
        ConfigSubcommand::Path => show_path().await,
        ConfigSubcommand::Reset { force } => reset(ctx, force).await,
    }
}

async fn show(ctx: &Context) -> Result<()> {
    println!("{}", "Configuration".bold().underline());
    println!();

    println!("{}", "Settings:".cyan());
    println!("  output_format: {}", ctx.config.settings.output_format);
    println!("  color: {}", ctx.config.settings.color);
    println!("  verbose: {}", ctx.config.settings.verbose);
    match ctx.config.settings.timeout_secs {
        Some(secs) => println!("  timeout_secs: {}", secs),
        None => println!("  timeout_secs: not set"),
    }

    println!();
    println!("{}: {}", "Effective API URL".cyan(), ctx.api_url());
    println!("{}: {}", "Output format".cyan(), ctx.output_format);

    if let Some(default) = &ctx.config.default_profile {
        println!("{}: {}", "Default profile".cyan(), default);
    }

    println!();
    println!("{}", "Profiles:".cyan());

    if ctx.config.profiles.is_empty() {
        println!("  No profiles configured");
        return Ok(());
    }

    for name in ctx.config.list_profiles() {
        let Some(p) = ctx.config.profiles.get(name) else {
            continue;
        };
        if ctx.profile_name.as_deref() == Some(name) {
            print_active_profile(name, p);
        } else {
            println!("  [{}]", name);
            println!("    api_url: {}", p.api_url());
        }
    }

    Ok(())
}

fn print_active_profile(name: &str, profile: &Profile) {
    println!("  [{}]{}", name, " (active)".green());
    println!("    api_url: {}", profile.api_url());
    if let Some(format) = &profile.output_format {
        println!("    output_format: {}", format);
    }
    if !profile.headers.is_empty() {
        println!("    headers:");
        let mut headers: Vec<_> = profile.headers.iter().collect();
        headers.sort();
        for (k, v) in headers {
            println!("      {}: {}", k, v);
        }
    }
}

/// Resolve a key to a profile name and field. Accepts
/// `profile.<name>.<field>` or a bare field of the active profile.
fn profile_field<'a>(parts: &[&'a str], profile: Option<&'a str>) -> Option<(&'a str, &'a str)> {
    match (parts, profile) {
        (["profile", name, field], _) => Some((*name, *field)),
        ([field], Some(name)) => Some((name, *field)),
        _ => None,
    }
}

fn check_output_format(value: &str) -> Result<()> {
    OutputFormat::from_str(value, true)
        .map(|_| ())
        .map_err(|_| anyhow::anyhow!("Invalid output format: {} (expected table, json, yaml or compact)", value))
}

async fn set(ctx: &Context, key: &str, value: &str, profile: Option<&str>) -> Result<()> {
    let mut config = ctx.config.clone();
    let parts: Vec<&str> = key.split('.').collect();

    if let ["settings", setting] = parts.as_slice() {
        match *setting {
            "output_format" => {
                check_output_format(value)?;
                config.settings.output_format = value.to_lowercase();
            }
            "color" => config.settings.color = value.parse().context("Invalid boolean value")?,
            "verbose" => config.settings.verbose = value.parse().context("Invalid boolean value")?,
            "timeout_secs" => {
                config.settings.timeout_secs = match value {
                    "none" | "" => None,
                    secs => Some(secs.parse().context("Invalid number")?),
                }
            }
            _ => anyhow::bail!("Unknown setting: {}", setting),
        }
    } else if let ["profile", name, "headers", header] = parts.as_slice() {
        config
            .get_or_create_profile(name)
            .headers
            .insert(header.to_string(), value.to_string());
    } else if let Some((name, field)) = profile_field(&parts, profile) {
        let p = config.get_or_create_profile(name);
        match field {
            "api_url" => p.api_url = Some(value.to_string()),
            "output_format" => {
                check_output_format(value)?;
                p.output_format = Some(value.to_lowercase());
            }
            _ => anyhow::bail!("Unknown profile field: {}", field),
        }
    } else {
        anyhow::bail!("Unknown configuration key: {}", key);
    }

    config.save().context("Failed to save configuration")?;
    ctx.output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

async fn get(ctx: &Context, key: &str, profile: Option<&str>) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    let value = if let ["settings", setting] = parts.as_slice() {
        match *setting {
            "output_format" => ctx.config.settings.output_format.clone(),
            "color" => ctx.config.settings.color.to_string(),
            "verbose" => ctx.config.settings.verbose.to_string(),
            "timeout_secs" => ctx
                .config
                .settings
                .timeout_secs
                .map_or_else(|| "not set".to_string(), |secs| secs.to_string()),
            _ => anyhow::bail!("Unknown setting: {}", setting),
        }
    } else if let ["default_profile"] = parts.as_slice() {
        ctx.config
            .default_profile
            .clone()
            .unwrap_or_else(|| "not set".to_string())
    } else if let Some((name, field)) = profile_field(&parts, profile) {
        let p = ctx
            .config
            .get_profile(Some(name))
            .with_context(|| format!("Profile '{}' not found", name))?;
        match field {
            "api_url" => p.api_url().to_string(),
            "output_format" => p.output_format.clone().unwrap_or_default(),
            _ => anyhow::bail!("Unknown profile field: {}", field),
        }
    } else {
        anyhow::bail!("Unknown configuration key: {}", key);
    };

    println!("{}", value);
    Ok(())
}

async fn list_profiles(ctx: &Context) -> Result<()> {
    if ctx.config.profiles.is_empty() {
        ctx.output
            .info("No profiles configured. Run 'taskhunt config create-profile <name>' to create one.");
        return Ok(());
    }

    println!("{}", "Configured profiles:".bold());
    println!();

    for name in ctx.config.list_profiles() {
        let is_default = ctx.config.default_profile.as_deref() == Some(name);
        if is_default {
            println!("  {} {}", "→".green(), name.green().bold());
        } else {
            println!("    {}", name);
        }
    }

    Ok(())
}

async fn use_profile(ctx: &Context, name: &str) -> Result<()> {
    let mut config = ctx.config.clone();

    if !config.profiles.contains_key(name) {
        anyhow::bail!(
            "Profile '{}' not found. Run 'taskhunt config profiles' to list available profiles.",
            name
        );
    }

    config.set_default_profile(name);
    config.save().context("Failed to save configuration")?;

    ctx.output.success(&format!("Now using profile '{}'", name));
    Ok(())
}

async fn create_profile(
    ctx: &Context,
    name: &str,
    api_url: Option<&str>,
    from: Option<&str>,
) -> Result<()> {
    let mut config = ctx.config.clone();

    if config.profiles.contains_key(name) {
        anyhow::bail!("Profile '{}' already exists", name);
    }

    let mut new_profile = match from {
        Some(source) => config
            .profiles
            .get(source)
            .cloned()
            .with_context(|| format!("Source profile '{}' not found", source))?,
        None => Profile::default(),
    };

    if let Some(url) = api_url {
        new_profile.api_url = Some(url.to_string());
    }

    config.profiles.insert(name.to_string(), new_profile);
    config.save().context("Failed to save configuration")?;

    ctx.output.success(&format!("Created profile '{}'", name));

    if let Some(source) = from {
        ctx.output.info(&format!("Copied settings from '{}'", source));
    }

    Ok(())
}

async fn delete_profile(ctx: &Context, name: &str, force: bool) -> Result<()> {
    let mut config = ctx.config.clone();

    if !config.profiles.contains_key(name) {
        anyhow::bail!("Profile '{}' not found", name);
    }

    if !force {
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!("Delete profile '{}'?", name))
            .default(false)
            .interact()
            .context("Failed to get confirmation")?;

        if !confirm {
            ctx.output.info("Cancelled");
            return Ok(());
        }
    }

    config.remove_profile(name);
    config.save().context("Failed to save configuration")?;

    ctx.output.success(&format!("Deleted profile '{}'", name));
    Ok(())
}

async fn show_path() -> Result<()> {
    let path = CliConfig::config_path()?;
    let status = if path.exists() { "✓".green() } else { "✗".red() };
    println!("{} {}", status, path.display());
    Ok(())
}

async fn reset(ctx: &Context, force: bool) -> Result<()> {
    if !force {
        let confirm = dialoguer::Confirm::new()
            .with_prompt("Reset all configuration to defaults? This cannot be undone.")
            .default(false)
            .interact()
            .context("Failed to get confirmation")?;

        if !confirm {
            ctx.output.info("Cancelled");
            return Ok(());
        }
    }

    CliConfig::default()
        .save()
        .context("Failed to save configuration")?;

    ctx.output.success("Configuration reset to defaults");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_field_forms() {
        assert_eq!(
            profile_field(&["profile", "staging", "api_url"], None),
            Some(("staging", "api_url"))
        );
        assert_eq!(profile_field(&["api_url"], Some("dev")), Some(("dev", "api_url")));
        assert_eq!(profile_field(&["api_url"], None), None);
        assert_eq!(profile_field(&["settings", "color"], Some("dev")), None);
    }

    #[test]
    fn test_check_output_format() {
        assert!(check_output_format("json").is_ok());
        assert!(check_output_format("YAML").is_ok());
        assert!(check_output_format("xml").is_err());
    }
}
