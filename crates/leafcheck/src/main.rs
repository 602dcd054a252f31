//! LeafCheck CLI - plant leaf disease detection with multi-provider AI fallback.
//!
//! LeafCheck takes leaf photographs and outputs a diagnosis report: the
//! disease label, confidence, which provider answered, and a treatment plan.
//!
//! # Usage
//!
//! ```bash
//! # Diagnose a single image
//! leafcheck detect leaf.jpg
//!
//! # Diagnose several images into a JSONL file
//! leafcheck detect a.jpg b.jpg --format jsonl --output reports.jsonl
//!
//! # Treatment advice for a known disease
//! leafcheck treat "Tomato Early Blight"
//!
//! # Show which providers are configured
//! leafcheck providers
//! ```

use clap::{Parser, Subcommand};
use leafcheck_core::Config;
use std::path::PathBuf;

mod cli;
mod logging;

/// LeafCheck - plant leaf disease detection with multi-provider AI fallback.
#[derive(Parser, Debug)]
#[command(name = "leafcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "LEAFCHECK_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Diagnose one or more leaf images
    Detect(cli::detect::DetectArgs),

    /// Derive a treatment plan for a disease name
    Treat(cli::treat::TreatArgs),

    /// Normalize free text into a canonical disease name
    Canonicalize(cli::canonicalize::CanonicalizeArgs),

    /// Show the resolved provider priority
    Providers(cli::providers::ProvidersArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

/// Config path in effect: `--config` (tilde-expanded) or the default location.
fn config_path(raw: Option<&str>) -> PathBuf {
    raw.map(Config::expand_path)
        .unwrap_or_else(Config::default_path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let path = config_path(cli.config.as_deref());

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = if path.exists() {
        match Config::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config from {}: {e}\n  \
                     Using default configuration. Check your config file with `leafcheck config path`.",
                    path.display()
                );
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("LeafCheck v{}", leafcheck_core::VERSION);

    match cli.command {
        Commands::Detect(args) => cli::detect::execute(args, config).await,
        Commands::Treat(args) => cli::treat::execute(args, config).await,
        Commands::Canonicalize(args) => cli::canonicalize::execute(args),
        Commands::Providers(args) => cli::providers::execute(args, config),
        Commands::Config(args) => cli::config::execute(args, config, &path),
    }
}
