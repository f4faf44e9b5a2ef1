//! devready CLI - is the device ready for production?
//!
//! Runs network, discovery, broker, configuration and live-traffic checks
//! once and prints a readiness report.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use devready::checks::registry::CHECKS;
use devready::client::SystemExecutor;
use devready::config::{Overrides, Settings};
use devready::Runner;

/// devready - production validation for mDNS/MQTT devices
///
/// Without a subcommand the validation pass runs with the top-level flags.
#[derive(Debug, Parser)]
#[command(name = "devready")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    check: CheckArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Path to the settings file (defaults apply if it does not exist)
    #[arg(short, long, default_value = "devready.yaml")]
    settings: PathBuf,

    /// MQTT broker address (discovered via mDNS if omitted)
    #[arg(short, long)]
    broker: Option<String>,

    /// MQTT topic to monitor
    #[arg(short, long)]
    topic: Option<String>,

    /// Monitoring duration in seconds
    #[arg(short, long = "monitor-time")]
    monitor_time: Option<u64>,

    /// Skip MQTT monitoring
    #[arg(long)]
    no_monitor: bool,

    /// Path to the device configuration header
    #[arg(long)]
    device_config: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the validation pass (the default)
    Check(CheckArgs),

    /// Generate a default settings file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "devready.yaml")]
        output: PathBuf,
    },

    /// List available checks
    List,

    /// Validate a settings file
    Validate {
        /// Path to the settings file
        #[arg(short, long, default_value = "devready.yaml")]
        settings: PathBuf,
    },
}

fn setup_logging(verbose: bool, json: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.json);

    match cli.command.unwrap_or(Commands::Check(cli.check)) {
        Commands::Check(args) => run_validation(args).await,

        Commands::Init { output } => init_settings(&output).map(|()| ExitCode::SUCCESS),

        Commands::List => {
            list_checks();
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate { settings } => validate_settings(&settings).map(|()| ExitCode::SUCCESS),
    }
}

/// Run one validation pass
async fn run_validation(args: CheckArgs) -> Result<ExitCode> {
    let CheckArgs {
        settings: settings_path,
        broker,
        topic,
        monitor_time,
        no_monitor,
        device_config,
        format,
    } = args;
    let overrides = Overrides {
        broker,
        topic,
        monitor_secs: monitor_time,
        no_monitor,
        device_config,
    };

    let mut settings = Settings::load_or_default(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    settings.apply(overrides);
    settings.validate().context("Invalid settings after overrides")?;

    tracing::info!(
        broker = ?settings.broker.address,
        topic = %settings.monitor.topic,
        monitor_secs = settings.monitor.duration.as_secs(),
        skip_monitor = settings.monitor.skip,
        "Settings loaded"
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let runner = Runner::new(Arc::new(SystemExecutor::new()), settings, cancel)
        .with_echo(format == OutputFormat::Text);
    let summary = runner.run().await;

    if format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize report")?;
        println!("{json}");
    }

    if summary.interrupted {
        eprintln!("Validation interrupted by signal");
    }

    Ok(ExitCode::from(summary.exit_status()))
}

/// Cancel the run on SIGINT or SIGTERM
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::warn!("Received SIGINT, stopping validation"),
        () = terminate => tracing::warn!("Received SIGTERM, stopping validation"),
    }

    cancel.cancel();
}

/// Generate a default settings file
fn init_settings(output: &Path) -> Result<()> {
    let yaml = Settings::default()
        .to_yaml()
        .context("Failed to serialize settings")?;

    std::fs::write(output, &yaml)
        .with_context(|| format!("Failed to write settings to {}", output.display()))?;

    tracing::info!(path = %output.display(), "Settings file created");
    println!("Created {}", output.display());
    println!();
    println!("Edit the file to describe your device, then run:");
    println!("  devready check --settings {}", output.display());

    Ok(())
}

/// List available checks
fn list_checks() {
    println!("Available checks (in run order):");
    println!();

    for (name, check) in CHECKS.iter() {
        println!("  {name:12} - {}", check.description());
    }

    println!();
    println!("Skip live monitoring with:");
    println!("  devready check --no-monitor");
}

/// Validate a settings file
fn validate_settings(settings_path: &Path) -> Result<()> {
    tracing::info!(path = %settings_path.display(), "Validating settings");

    let settings = Settings::from_file(settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;

    println!("Settings are valid!");
    println!();
    match &settings.broker.address {
        Some(address) => println!("Broker: {address}:{}", settings.broker.port),
        None => println!("Broker: discovered via {}", settings.discovery.service_type),
    }
    println!(
        "Monitor: {} for {}s{}",
        settings.monitor.topic,
        settings.monitor.duration.as_secs(),
        if settings.monitor.skip { " (skipped)" } else { "" }
    );
    println!("Device config: {}", settings.device_config.path.display());
    println!("Network targets: {}", settings.network.targets.len());

    for target in &settings.network.targets {
        println!("  - {} ({})", target.name, target.address);
    }

    Ok(())
}
