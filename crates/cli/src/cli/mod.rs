pub mod analyze;
pub mod config;
pub mod history;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use vr_domain::config::Config;
use vr_studio::{AccessGate, JsonFileStore, StateStore};

/// Vibe Ripper: deconstruct a still or clip into a visual DNA profile.
#[derive(Debug, Parser)]
#[command(name = "vibe-ripper", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze an image or video and print its visual DNA profile.
    Analyze {
        /// Path to the media file.
        path: PathBuf,
        /// Extra direction for the analysis (defaults to `analysis.default_guidance`).
        #[arg(long, short)]
        guidance: Option<String>,
        /// Also generate the five DNA-locked shot variants.
        #[arg(long)]
        expand: bool,
        /// Print the profile as JSON instead of the readable breakdown.
        #[arg(long)]
        json: bool,
    },
    /// Browse past analyses.
    #[command(subcommand)]
    History(HistoryCommand),
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Unlock the tool with the access secret.
    Unlock {
        secret: String,
    },
    /// Revoke access on this machine.
    Lock,
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List stored analyses, newest first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print one stored analysis by its index in `history list`.
    Show {
        index: usize,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
    /// Store the backend API key in the state file.
    SetKey {
        key: String,
    },
    /// Remove the stored API key.
    ClearKey,
}

// ── Shared helpers ────────────────────────────────────────────────────

/// Load the configuration from the path specified by `VR_CONFIG` (or
/// `config.toml` by default). Returns the parsed [`Config`] and the
/// path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("VR_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

/// Missing file means all defaults.
pub fn load_config_from(config_path: &str) -> anyhow::Result<Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

pub fn open_store(config: &Config) -> anyhow::Result<Arc<dyn StateStore>> {
    let store = JsonFileStore::new(&config.storage.state_path)?;
    Ok(Arc::new(store))
}

/// Fail unless the access gate is open.
pub fn ensure_access(config: &Config, store: Arc<dyn StateStore>) -> anyhow::Result<()> {
    let gate = AccessGate::new(&config.access, store);
    if !gate.is_granted()? {
        anyhow::bail!("access locked: run `vibe-ripper unlock <SECRET>` first");
    }
    Ok(())
}

pub fn unlock(config: &Config, store: Arc<dyn StateStore>, secret: &str) -> anyhow::Result<()> {
    let gate = AccessGate::new(&config.access, store);
    if !gate.is_enabled() {
        println!("Access gate is disabled");
        return Ok(());
    }
    if !gate.unlock(secret)? {
        anyhow::bail!("invalid access secret");
    }
    println!("Access granted");
    Ok(())
}

pub fn lock(config: &Config, store: Arc<dyn StateStore>) -> anyhow::Result<()> {
    AccessGate::new(&config.access, store).lock()?;
    println!("Locked");
    Ok(())
}
