/// Supervisor core: owns both children, their liveness markers, and the
/// consensus output tap, and runs the poll loop until one child goes
/// down or an interrupt arrives.
///
/// On every exit path the kill signals are sent before any marker file
/// is removed.
use crate::color::{self, Channel};
use crate::launch::{Launch, LaunchError};
use crate::marker::{MarkerError, PidMarker, APP_PID_PREFIX, CONSENSUS_PID_PREFIX};
use crate::shutdown::ShutdownSignal;
use crate::tap::StdoutTap;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Child;

/// When a polled exit status counts as the child being down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExitDetection {
    /// Only a non-success status (non-zero code, death by signal) is
    /// detected. A child exiting 0 goes unnoticed; kept as the default
    /// for drop-in compatibility with the scripts this tool replaces.
    NonZeroOnly,
    /// Any reported exit status is detected.
    AnyStatus,
}

/// Tunables for the watch loop.
#[derive(Debug, Clone)]
pub struct SupervisorOpts {
    /// Directory the liveness markers are written to.
    pub marker_dir: PathBuf,
    /// Exit-status policy for the poll arm.
    pub detection: ExitDetection,
    /// Delay between poll rounds.
    pub poll_interval: Duration,
}

impl Default for SupervisorOpts {
    fn default() -> Self {
        Self {
            marker_dir: PathBuf::from("."),
            detection: ExitDetection::NonZeroOnly,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// How a watch ended.
#[derive(Debug)]
pub enum Outcome {
    AppExited(ExitStatus),
    ConsensusExited(ExitStatus),
    Interrupted,
}

/// Which children a teardown signals.
enum Kill {
    Both,
    AppOnly,
    ConsensusOnly,
}

#[derive(Debug)]
pub struct Supervisor {
    app: Child,
    app_pid: u32,
    consensus: Child,
    consensus_pid: u32,
    app_marker: PidMarker,
    consensus_marker: PidMarker,
    tap: StdoutTap,
    opts: SupervisorOpts,
}

impl Supervisor {
    /// Spawn both children, then drop a liveness marker for each.
    ///
    /// The markers are written only after both spawns succeed, so a
    /// marker pair on disk always refers to a launched pair of
    /// processes. A spawn or marker failure propagates as-is; no
    /// partial cleanup is attempted.
    pub fn start(
        app: &Launch,
        consensus: &Launch,
        opts: SupervisorOpts,
    ) -> Result<Self, SupervisorError> {
        tracing::info!(command = %app.rendered(), "starting application node");
        let app_child = app.spawn()?;
        let app_pid = app_child.id().unwrap_or(0);
        tracing::info!(pid = app_pid, "application node started");

        tracing::info!(command = %consensus.rendered(), "starting consensus engine");
        let mut consensus_child = consensus.spawn()?;
        let consensus_pid = consensus_child.id().unwrap_or(0);
        tracing::info!(pid = consensus_pid, "consensus engine started");

        let stdout = consensus_child
            .stdout
            .take()
            .ok_or(SupervisorError::CaptureStdout)?;
        let tap = StdoutTap::new(stdout);

        let app_marker = PidMarker::create(&opts.marker_dir, APP_PID_PREFIX, app_pid)?;
        let consensus_marker =
            PidMarker::create(&opts.marker_dir, CONSENSUS_PID_PREFIX, consensus_pid)?;
        tracing::debug!(
            app = %app_marker.path().display(),
            consensus = %consensus_marker.path().display(),
            "liveness markers created"
        );

        Ok(Self {
            app: app_child,
            app_pid,
            consensus: consensus_child,
            consensus_pid,
            app_marker,
            consensus_marker,
            tap,
            opts,
        })
    }

    /// Run until one child's exit is detected or shutdown fires.
    ///
    /// Each round sleeps `poll_interval`, mirrors whatever the
    /// consensus engine printed, then checks both children with
    /// `try_wait`. The application node is checked first, matching the
    /// operational scripts this replaces.
    pub async fn watch(
        &mut self,
        shutdown: &mut ShutdownSignal,
    ) -> Result<Outcome, SupervisorError> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("interrupt received, stopping both nodes");
                    self.teardown(Kill::Both)?;
                    return Ok(Outcome::Interrupted);
                }
                _ = tokio::time::sleep(self.opts.poll_interval) => {
                    self.mirror();

                    let app_status = match self.poll_app() {
                        Ok(status) => status,
                        Err(e) => return Err(self.teardown_on_error(e)),
                    };
                    if let Some(status) = app_status {
                        if exit_detected(self.opts.detection, &status) {
                            tracing::info!(
                                status = %status,
                                "application node exited, stopping consensus engine"
                            );
                            self.teardown(Kill::ConsensusOnly)?;
                            return Ok(Outcome::AppExited(status));
                        }
                    }

                    let consensus_status = match self.poll_consensus() {
                        Ok(status) => status,
                        Err(e) => return Err(self.teardown_on_error(e)),
                    };
                    if let Some(status) = consensus_status {
                        if exit_detected(self.opts.detection, &status) {
                            tracing::info!(
                                status = %status,
                                "consensus engine exited, stopping application node"
                            );
                            self.teardown(Kill::AppOnly)?;
                            return Ok(Outcome::ConsensusExited(status));
                        }
                    }
                }
            }
        }
    }

    /// Drain the consensus output queued since the last round and print
    /// each line in its channel color. Returns the number of lines.
    fn mirror(&mut self) -> usize {
        let lines = self.tap.drain();
        for line in &lines {
            println!("{}", color::paint(line, Channel::Consensus));
        }
        lines.len()
    }

    fn poll_app(&mut self) -> Result<Option<ExitStatus>, SupervisorError> {
        self.app.try_wait().map_err(|e| SupervisorError::Poll {
            role: "application node",
            source: e,
        })
    }

    fn poll_consensus(&mut self) -> Result<Option<ExitStatus>, SupervisorError> {
        self.consensus.try_wait().map_err(|e| SupervisorError::Poll {
            role: "consensus engine",
            source: e,
        })
    }

    /// Best-effort full teardown for a fatal watch error, so even this
    /// exit path leaves no running children or stale markers. The
    /// original error is the one reported; a cleanup failure on top of
    /// it is only logged.
    fn teardown_on_error(&mut self, error: SupervisorError) -> SupervisorError {
        if let Err(e) = self.teardown(Kill::Both) {
            tracing::warn!(error = %e, "cleanup after fatal watch error failed");
        }
        error
    }

    /// Signal the selected children, stop the tap, then remove both
    /// markers. Kills are best-effort and never block; marker removal
    /// errors (other than the file already being gone) propagate, but
    /// only after the signals went out.
    fn teardown(&mut self, kill: Kill) -> Result<(), SupervisorError> {
        match kill {
            Kill::Both => {
                terminate(self.app_pid, "application node");
                terminate(self.consensus_pid, "consensus engine");
            }
            Kill::AppOnly => terminate(self.app_pid, "application node"),
            Kill::ConsensusOnly => terminate(self.consensus_pid, "consensus engine"),
        }
        self.tap.abort();

        let app = self.app_marker.remove();
        let consensus = self.consensus_marker.remove();
        app.and(consensus)?;
        Ok(())
    }
}

/// Whether a recorded exit status counts as a detected exit under the
/// given policy. Always an explicit match, never a truthiness test on
/// the raw status value.
fn exit_detected(detection: ExitDetection, status: &ExitStatus) -> bool {
    match detection {
        ExitDetection::NonZeroOnly => !status.success(),
        ExitDetection::AnyStatus => true,
    }
}

/// SIGKILL the child's process group without waiting for it to die.
/// The target may already be gone, so failures are logged, not raised.
fn terminate(pid: u32, role: &str) {
    if pid == 0 {
        return;
    }
    tracing::debug!(pid, role, "sending SIGKILL to process group");
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        tracing::warn!(pid, role, error = %e, "kill failed");
    }
}

/// Errors from supervisor startup and the watch loop.
#[derive(Debug)]
pub enum SupervisorError {
    Launch(LaunchError),
    Marker(MarkerError),
    /// The consensus engine was spawned without a captured stdout.
    CaptureStdout,
    /// `try_wait` itself failed (not a child exit).
    Poll {
        role: &'static str,
        source: std::io::Error,
    },
}

impl std::fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorError::Launch(e) => write!(f, "{}", e),
            SupervisorError::Marker(e) => write!(f, "{}", e),
            SupervisorError::CaptureStdout => {
                write!(f, "consensus engine stdout was not captured")
            }
            SupervisorError::Poll { role, source } => {
                write!(f, "failed to poll {role}: {source}")
            }
        }
    }
}

impl std::error::Error for SupervisorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SupervisorError::Launch(e) => Some(e),
            SupervisorError::Marker(e) => Some(e),
            SupervisorError::CaptureStdout => None,
            SupervisorError::Poll { source, .. } => Some(source),
        }
    }
}

impl From<LaunchError> for SupervisorError {
    fn from(e: LaunchError) -> Self {
        SupervisorError::Launch(e)
    }
}

impl From<MarkerError> for SupervisorError {
    fn from(e: MarkerError) -> Self {
        SupervisorError::Marker(e)
    }
}
