//! fleetload CLI - incremental GPS telemetry extraction.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "fleetload")]
#[command(about = "Incremental GPS telemetry extraction into a data warehouse", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Local warehouse directory (overrides WAREHOUSE_DIR)
    #[arg(long, global = true)]
    warehouse_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one extraction cycle and exit
    Run {
        /// Backfill start (YYYY-MM-DD HH:MM:SS, UTC)
        #[arg(short, long, requires = "end")]
        start: Option<String>,

        /// Backfill end (YYYY-MM-DD HH:MM:SS, UTC)
        #[arg(short, long, requires = "start")]
        end: Option<String>,
    },

    /// Serve the HTTP trigger; every request to / runs one cycle
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },

    /// Create and seed the control table
    Init,

    /// Show the control table
    Status,
}

fn init_tracing(verbose: u8, json: bool) {
    let default_filter = match verbose {
        0 => "fleetload=info",
        1 => "fleetload=debug",
        _ => "fleetload=trace",
    };
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()));

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before reading settings)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let warehouse_dir = cli.warehouse_dir;
    match cli.command {
        Commands::Run { start, end } => {
            commands::run::run(warehouse_dir, start.as_deref(), end.as_deref()).await
        }
        Commands::Serve { host, port } => commands::serve::serve(warehouse_dir, &host, port).await,
        Commands::Init => commands::init::init(warehouse_dir).await,
        Commands::Status => commands::status::status(warehouse_dir).await,
    }
}
