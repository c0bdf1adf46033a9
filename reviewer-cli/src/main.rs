//! PR Reviewer CLI - runs and administers the reviewer assignment service

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reviewer_core::config::CliOverrides;
use reviewer_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{MigrateArgs, ServeArgs};

/// Assigns pull request reviewers from team membership
#[derive(Parser, Debug)]
#[command(name = "pr-reviewer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset (overrides config and env)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    #[command(visible_alias = "s")]
    Serve(ServeArgs),

    /// Apply the database schema and exit
    Migrate(MigrateArgs),

    /// Show the effective configuration
    Config,

    /// Show version information
    Version,
}

impl Commands {
    fn overrides(&self) -> CliOverrides {
        match self {
            Commands::Serve(args) => args.overrides(),
            Commands::Migrate(args) => args.overrides(),
            Commands::Config | Commands::Version => CliOverrides::default(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut overrides = cli
        .command
        .as_ref()
        .map(Commands::overrides)
        .unwrap_or_default();
    overrides.log_level = cli.log_level.clone();
    if cli.verbose && overrides.log_level.is_none() {
        overrides.log_level = Some("debug".to_string());
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.config.as_deref(), overrides)?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    if cli.verbose {
        tracing::debug!(
            bind = %config.bind_address(),
            db = %config.database.path.display(),
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Serve(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Migrate(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Config) => {
            println!("PR Reviewer Configuration");
            println!("=========================");
            println!();
            print!("{}", toml::to_string_pretty(&config)?);
            println!();
            let path = cli.config.or_else(Config::default_config_path);
            if let Some(path) = path {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        Some(Commands::Version) => {
            println!("pr-reviewer {}", env!("CARGO_PKG_VERSION"));
        }
        None => {
            println!("PR Reviewer - reviewer assignment service");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
