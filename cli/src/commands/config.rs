use crate::error::{CliError, Result};
use crate::output::OutputManager;
use clap::Args;
use perf_monitor::MonitorConfig;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration action
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Parse and validate a configuration file
    Check {
        /// Configuration file path
        path: PathBuf,
    },

    /// Write the default configuration to a file
    Init {
        /// Output file path
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs, config_path: Option<&str>, output: OutputManager) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(config_path, &output),
        ConfigAction::Check { path } => check_config(&path, &output),
        ConfigAction::Init { path, force } => init_config(&path, force, &output),
    }
}

fn show_config(config_path: Option<&str>, output: &OutputManager) -> Result<()> {
    let config = match config_path {
        Some(path) => MonitorConfig::load_from_file(path)?,
        None => MonitorConfig::default(),
    };
    output.print_config(&config.apply_env_overrides()?)
}

fn check_config(path: &Path, output: &OutputManager) -> Result<()> {
    if !path.exists() {
        return Err(CliError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let config = MonitorConfig::load_from_file(path)?;
    info!(platform = %config.platform, "Configuration is valid");
    output.print_success(&format!("{} is valid (platform: {})", path.display(), config.platform));
    Ok(())
}

fn init_config(path: &Path, force: bool, output: &OutputManager) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::AlreadyExists {
            path: path.display().to_string(),
        });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    MonitorConfig::default().save_to_file(path)?;
    output.print_success(&format!("Wrote default configuration to {}", path.display()));
    Ok(())
}
