use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "floodgate",
    about = "Floodgate — closes registrations when sign-ups spike",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to floodgate.toml
    #[arg(short, long, global = true, env = "FLOODGATE_CONFIG", default_value = "floodgate.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample the instance, record the count, and open or close registrations.
    ///
    /// Meant to be run from cron, e.g. every five minutes:
    ///
    ///   */5 * * * * floodgate run --config /etc/floodgate.toml
    Run {
        /// Decide and report, but do not run the admin command
        #[arg(long)]
        dry_run: bool,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Show the most recent recorded samples
    History {
        /// Number of samples to show
        #[arg(short = 'n', long, default_value = "12")]
        limit: usize,
    },
    /// Drop samples older than [history].retention now
    Compact,
    /// Write a floodgate.toml scaffold
    Init {
        /// Where to write the scaffold
        #[arg(short, long, default_value = "floodgate.toml")]
        path: PathBuf,
        /// Base URL of the instance to watch
        #[arg(long, default_value = "https://example.social")]
        base_url: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("floodgate=info"));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Run { dry_run, format } => {
            commands::run::run(&cli.config, dry_run, &format)
        }
        Commands::History { limit } => {
            commands::history::show(&cli.config, limit)
        }
        Commands::Compact => {
            commands::history::compact(&cli.config)
        }
        Commands::Init { path, base_url, force } => {
            commands::init::init(&path, &base_url, force)
        }
    }
}
