use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use dashboard_core::Config;
use inquire::{Password, PasswordDisplayMode, Text};

use crate::{dashboard, server};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-dashboard",
    version,
    about = "Weather dashboard and API proxy"
)]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP proxy that hides the upstream API key.
    Serve {
        /// Address to listen on, e.g. "0.0.0.0:8080". Overrides `[server] bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Store the upstream API key in the config file.
    Configure,

    /// Interactive dashboard: featured cities, search and 7-day details.
    Dashboard,

    /// Show the detail view for one place and exit.
    Show {
        /// Place name, e.g. "Lisbon".
        place: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Serve { bind } => {
                let config = Config::load_from(&path)?.with_env();
                server::serve(&config, bind.as_deref()).await
            }
            Command::Configure => configure(&path),
            Command::Dashboard => {
                let config = Config::load_from(&path)?.with_env();
                dashboard::run_interactive(&config).await
            }
            Command::Show { place } => {
                let config = Config::load_from(&path)?.with_env();
                dashboard::show(&config, &place).await
            }
        }
    }
}

/// Prompt for the upstream credentials and persist them.
///
/// Loads the file without environment overrides so an exported key never
/// ends up written to disk.
fn configure(path: &Path) -> anyhow::Result<()> {
    let mut config = Config::load_from(path)?;

    let base_url = Text::new("Upstream API base URL:")
        .with_default(&config.upstream.base_url)
        .prompt()
        .context("Failed to read base URL")?;

    let api_key = Password::new("Upstream API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.upstream.base_url = base_url.trim().to_string();
    config.set_api_key(api_key.trim().to_string());
    config.save_to(path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}
