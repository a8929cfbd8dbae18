//! Vision Check CLI - decide whether an image satisfies a challenge description.
//!
//! Prints exactly one JSON object on stdout and always exits 0 for analyses;
//! callers detect failure through the `success` field. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Analyze an image (auto provider selection with offline fallback)
//! vision-check analyze --image-url https://example.com/caps.jpg \
//!     --challenge "coletar 10 tampinhas de garrafa PET"
//!
//! # Force a single provider
//! vision-check analyze --image-url ... --challenge ... --provider openai
//!
//! # View configuration
//! vision-check config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Vision Check - verify images against challenge descriptions with vision LLMs.
#[derive(Parser, Debug)]
#[command(name = "vision-check")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging and pretty-printed output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "VISION_CHECK_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze an image against a challenge description
    Analyze(cli::analyze::AnalyzeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(vision_check_core::Config::expand_path);

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match load_config(config_path.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `vision-check config path`."
            );
            vision_check_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("vision-check v{}", vision_check_core::VERSION);

    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args, &config, cli.verbose).await,
        Commands::Config(args) => cli::config::execute(args, config_path).await,
    }
}

fn load_config(
    path: Option<&PathBuf>,
) -> Result<vision_check_core::Config, vision_check_core::ConfigError> {
    match path {
        Some(path) => vision_check_core::Config::load_or_default(path),
        None => vision_check_core::Config::load(),
    }
}
