/// Launch descriptors for the two supervised binaries: pure argv
/// construction plus the actual spawn.
use crate::config::NodeConfig;
use crate::home::Homes;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Everything needed to start one child process.
#[derive(Debug, Clone)]
pub struct Launch {
    /// Executable name or path.
    pub bin: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Whether stdout is piped back to the supervisor for mirroring.
    pub capture_stdout: bool,
}

impl Launch {
    /// Spawn the child in its own process group so the supervisor can
    /// later kill the whole group.
    pub fn spawn(&self) -> Result<Child, LaunchError> {
        let mut command = Command::new(&self.bin);
        command.args(&self.args).process_group(0);
        if self.capture_stdout {
            command.stdout(Stdio::piped());
        }
        command.spawn().map_err(|e| LaunchError::Spawn {
            bin: self.bin.clone(),
            source: e,
        })
    }

    /// One-line rendering of the command, for logs and `--dry-run`.
    pub fn rendered(&self) -> String {
        format!("{} {}", self.bin, self.args.join(" "))
    }
}

/// Launch descriptor for the application node.
///
/// Its console output is not captured; it inherits the supervisor's
/// stdio. Only the consensus engine is mirrored.
pub fn app(bin: &str, debug: bool, config: &NodeConfig, homes: &Homes) -> Launch {
    Launch {
        bin: bin.to_string(),
        args: app_args(debug, config, homes),
        capture_stdout: false,
    }
}

/// Launch descriptor for the consensus engine, stdout captured.
pub fn consensus(bin: &str, homes: &Homes) -> Launch {
    Launch {
        bin: bin.to_string(),
        args: consensus_args(homes),
        capture_stdout: true,
    }
}

/// Application node argv.
///
/// Debug mode runs in-memory: `-p <port> -v`. Normal mode adds the
/// persistent store: `--use-db --db-path <app-home>/<db_path> -p <port> -v`.
pub fn app_args(debug: bool, config: &NodeConfig, homes: &Homes) -> Vec<String> {
    let mut args = Vec::new();
    if !debug {
        args.push("--use-db".to_string());
        args.push("--db-path".to_string());
        args.push(homes.app_db(&config.db_path).to_string_lossy().into_owned());
    }
    args.push("-p".to_string());
    args.push(config.port.clone());
    args.push("-v".to_string());
    args
}

/// Consensus engine argv: `node --home <consensus-home>`.
pub fn consensus_args(homes: &Homes) -> Vec<String> {
    vec![
        "node".to_string(),
        "--home".to_string(),
        homes.consensus().to_string_lossy().into_owned(),
    ]
}

/// Errors that can occur when starting a child.
#[derive(Debug)]
pub enum LaunchError {
    /// The executable could not be started (missing, not executable).
    Spawn {
        bin: String,
        source: std::io::Error,
    },
}

impl std::fmt::Display for LaunchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchError::Spawn { bin, source } => {
                write!(f, "failed to spawn {bin}: {source}")
            }
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::Spawn { source, .. } => Some(source),
        }
    }
}
