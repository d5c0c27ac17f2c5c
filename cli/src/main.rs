use clap::{CommandFactory, Parser, Subcommand};
use perf_monitor::MonitorConfig;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;

use commands::*;
use error::Result;
use output::{OutputFormat, OutputManager};

#[derive(Parser)]
#[command(name = "perfctl")]
#[command(about = "perfctl - Run, score and validate performance monitoring sessions")]
#[command(version)]
#[command(long_about = "
perfctl drives the performance monitor from the command line: it can replay a
synthetic workload and score it, validate recorded UI measurements for
cross-platform consistency, and manage the monitor configuration file.

Examples:
  perfctl simulate --seconds 5 --slow-every 30          # Score a janky 5 second session
  perfctl simulate --platform web --format json         # Machine-readable report
  perfctl validate measurements.json --component Card   # Consistency check for one component
  perfctl config init perf.toml                         # Write the default configuration
")]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormatArg,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, env = "PERFCTL_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormatArg {
    Text,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the monitor with a synthetic workload and print the report
    Simulate(SimulateArgs),

    /// Validate recorded UI measurements for cross-platform consistency
    Validate(ValidateArgs),

    /// Inspect or create monitor configuration files
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(&cli);

    if let Commands::Completions { shell } = cli.command {
        generate_completions(shell);
        return;
    }

    if let Err(e) = run_command(cli).await {
        eprintln!("{}", error::format_error(&e));
        process::exit(e.exit_code());
    }
}

async fn run_command(cli: Cli) -> Result<()> {
    let colored = !cli.no_color && !cli.quiet && console::Term::stdout().features().colors_supported();
    let output = OutputManager::new(OutputFormat::from(cli.format), colored, cli.quiet);

    match cli.command {
        Commands::Simulate(args) => {
            let config = load_config(cli.config.as_deref())?;
            commands::simulate::run(args, config, output).await
        }
        Commands::Validate(args) => {
            let config = load_config(cli.config.as_deref())?;
            commands::validate::run(args, config, output)
        }
        Commands::Config(args) => commands::config::run(args, cli.config.as_deref(), output),
        Commands::Completions { .. } => Ok(()),
    }
}

fn init_logging(cli: &Cli) {
    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else if cli.verbose {
        tracing::Level::INFO
    } else if cli.quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::WARN
    };

    // Logs go to stderr so JSON output on stdout stays parseable
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("perfctl={},perf_monitor={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    debug!("perfctl started");
}

/// File named by `--config` (or `PERFCTL_CONFIG`) when given, defaults
/// otherwise, then `PERF_*` environment overrides
fn load_config(path: Option<&str>) -> Result<MonitorConfig> {
    let config = match path {
        Some(path) => {
            let config = MonitorConfig::load_from_file(path)?;
            info!("Loaded configuration from: {}", path);
            config
        }
        None => MonitorConfig::default(),
    };
    Ok(config.apply_env_overrides()?)
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::{generate, Generator};
    use std::io;

    fn print_completions<G: Generator>(gen: G, cmd: &mut clap::Command) {
        generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    }

    let mut cmd = Cli::command();
    eprintln!("Generating completion file for {shell}...");
    print_completions(shell, &mut cmd);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_simulate_arguments() {
        let cli = Cli::try_parse_from([
            "perfctl",
            "simulate",
            "--seconds",
            "2",
            "--slow-every",
            "10",
            "--platform",
            "android",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(matches!(cli.format, OutputFormatArg::Json));
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.seconds, 2);
                assert_eq!(args.slow_every, 10);
                assert_eq!(args.platform, Some(perf_monitor::Platform::Android));
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_unknown_platform_is_rejected() {
        assert!(Cli::try_parse_from(["perfctl", "simulate", "--platform", "symbian"]).is_err());
    }

    #[test]
    fn test_load_missing_config_fails() {
        assert!(load_config(Some("/nonexistent/perfctl.toml")).is_err());
    }
}
