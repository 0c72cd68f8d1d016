//! # Fabric Configuration Validator
//!
//! Command-line tool for validating runtime configuration across
//! environments before a runtime is started with it.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fabric_core::config::{ConfigManager, FabricConfig};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate fabric runtime configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate (development, test, production, ...)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: $FABRIC_CONFIG_DIR or config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate the merged configuration
    Validate,

    /// Print the merged configuration as JSON
    Show,

    /// List environments with an overlay in the configuration directory
    Environments,

    /// Print the built-in defaults as JSON
    Defaults,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::Validate) | None => validate(&cli),
        Some(Commands::Show) => show(&cli),
        Some(Commands::Environments) => list_environments(&cli),
        Some(Commands::Defaults) => print_json(&FabricConfig::default()),
    };

    match result {
        Ok(()) => {
            info!("Configuration validator finished");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {e:#}");
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> Result<std::sync::Arc<ConfigManager>> {
    ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)
        .with_context(|| format!("loading configuration for environment '{}'", cli.environment))
}

fn validate(cli: &Cli) -> Result<()> {
    println!("🔧 Validating fabric configuration");
    println!("Environment: {}", cli.environment);

    let manager = load(cli)?;
    let config = manager.config();
    println!("Config Directory: {}", manager.config_directory().display());
    println!();
    println!("✅ runtime.domain_uri = {}", config.runtime.domain_uri);
    println!("✅ runtime.local_zone = {}", config.runtime.local_zone);
    println!(
        "✅ deployer.transactional = {} (non-transactional zones: {:?})",
        config.deployer.transactional, config.deployer.non_transactional_zones
    );
    println!(
        "✅ generator: components {:?}, resources {:?}",
        config.generator.component_types, config.generator.resource_types
    );
    println!(
        "✅ logging: level {}, json {}",
        config.logging.level.as_deref().unwrap_or("<environment default>"),
        config.logging.json
    );
    println!("\n🎉 Configuration is valid");
    Ok(())
}

fn show(cli: &Cli) -> Result<()> {
    let manager = load(cli)?;
    print_json(manager.config())
}

fn print_json(config: &FabricConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("serializing configuration")?;
    println!("{json}");
    Ok(())
}

fn list_environments(cli: &Cli) -> Result<()> {
    let directory = cli
        .config_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("config"))
        .join("environments");
    if !directory.is_dir() {
        bail!("environments directory not found: {}", directory.display());
    }

    println!("📋 Available environments:");
    let mut environments: Vec<String> = std::fs::read_dir(&directory)
        .with_context(|| format!("reading {}", directory.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    environments.sort();
    for environment in environments {
        println!("  - {environment}");
    }
    Ok(())
}
