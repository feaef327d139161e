/// Fitness Tracker MCP server binary
///
/// Parses flags (with environment variable fallbacks), configures logging on
/// stderr and serves MCP over stdin/stdout until the client disconnects.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use fitness_tracker_mcp::config::default_database_path;
use fitness_tracker_mcp::{Environment, FitnessTrackerServer, ServerConfig};

/// Command line arguments for the Fitness Tracker MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SQLite database file; defaults to fitness.db under ~/.fitness_tracker
    /// or the first other writable data directory
    #[arg(long, env = "FITNESS_TRACKER_DB")]
    database: Option<PathBuf>,

    /// Deployment environment; production hides internal error details
    #[arg(long, value_enum, env = "FITNESS_TRACKER_ENV", default_value_t = Environment::Development)]
    environment: Environment,

    /// Default lookback window in days for habit analytics (1-365)
    #[arg(long, env = "FITNESS_TRACKER_WINDOW_DAYS", default_value_t = 30)]
    window_days: u32,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("fitness_tracker_mcp={}", log_level))
        .with_writer(std::io::stderr) // stdout carries the protocol
        .init();

    info!("Starting Fitness Tracker MCP server");

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());

    let config = ServerConfig::new(db_path)
        .with_environment(args.environment)
        .with_window_days(args.window_days);

    let server = FitnessTrackerServer::new(config).await?;
    server.run().await?;

    info!("Fitness Tracker MCP server shutdown complete");
    Ok(())
}
