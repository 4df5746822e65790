mod color;
mod config;
mod home;
mod launch;
mod marker;
mod shutdown;
mod supervisor;
mod tap;

use clap::Parser;
use std::path::PathBuf;

use crate::color::Channel;
use crate::home::Homes;
use crate::supervisor::{ExitDetection, Outcome, Supervisor, SupervisorOpts};

/// Runs a chain application node and its consensus engine as one
/// supervised unit: both start together, the consensus output is
/// mirrored in color, and when either side goes down (or the
/// supervisor is interrupted) the other is killed and the pid marker
/// files are removed.
#[derive(Parser, Debug)]
#[command(name = "bandolier", version, about)]
pub struct Cli {
    /// Run the application node in debug mode (in-memory, no database)
    #[arg(long)]
    debug: bool,

    /// Application node home directory (default: ~/.band)
    #[arg(long, value_name = "DIR")]
    home: Option<PathBuf>,

    /// Consensus engine home directory (default: ~/.tendermint)
    #[arg(long, value_name = "DIR")]
    consensus_home: Option<PathBuf>,

    /// Application node binary
    #[arg(long, default_value = "band")]
    app_bin: String,

    /// Consensus engine binary
    #[arg(long, default_value = "tendermint")]
    consensus_bin: String,

    /// Config file path (default: <home>/config/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Which polled exit statuses count as a detected exit
    #[arg(long, value_enum, default_value = "non-zero-only")]
    exit_detection: ExitDetection,

    /// Resolve settings and print both launch commands, don't spawn
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (kill attempts, marker paths)
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "bandolier=debug"
    } else if cli.quiet {
        "bandolier=warn"
    } else {
        "bandolier=info"
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let homes = Homes::resolve(cli.home.as_deref(), cli.consensus_home.as_deref())
        .map_err(|e| e.to_string())?;
    tracing::debug!(
        app_home = %homes.app().display(),
        consensus_home = %homes.consensus().display(),
        "home directories resolved"
    );

    let config_path = cli.config.unwrap_or_else(|| homes.node_config());
    let node_config = config::load(&config_path).map_err(|e| e.to_string())?;
    tracing::info!(
        config = %config_path.display(),
        port = %node_config.port,
        db_path = %node_config.db_path,
        "configuration loaded"
    );

    let app = launch::app(&cli.app_bin, cli.debug, &node_config, &homes);
    let consensus = launch::consensus(&cli.consensus_bin, &homes);

    if cli.dry_run {
        println!("{}", color::paint(&app.rendered(), Channel::App));
        println!("{}", color::paint(&consensus.rendered(), Channel::Consensus));
        println!(
            "markers: {}<pid> and {}<pid> in the working directory",
            marker::APP_PID_PREFIX,
            marker::CONSENSUS_PID_PREFIX
        );
        return Ok(());
    }

    // Handlers go in before anything is spawned so an early interrupt
    // still reaches the teardown path.
    let mut shutdown = shutdown::install()
        .map_err(|e| format!("failed to install signal handlers: {e}"))?;

    let opts = SupervisorOpts {
        detection: cli.exit_detection,
        ..Default::default()
    };
    let mut sup = Supervisor::start(&app, &consensus, opts).map_err(|e| e.to_string())?;

    match sup.watch(&mut shutdown).await.map_err(|e| e.to_string())? {
        Outcome::AppExited(status) => {
            tracing::info!(status = %status, "application node exited, supervision ended");
        }
        Outcome::ConsensusExited(status) => {
            tracing::info!(status = %status, "consensus engine exited, supervision ended");
        }
        Outcome::Interrupted => {
            tracing::info!("interrupted, both nodes stopped");
        }
    }
    Ok(())
}
