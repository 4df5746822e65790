/// Liveness marker files: one zero-byte file per supervised child, named
/// after its pid, written when supervision begins and removed on every
/// exit path. External tooling globs for these names, so the prefixes
/// are fixed.
use std::path::{Path, PathBuf};

/// Marker prefix for the application node.
pub const APP_PID_PREFIX: &str = "band-pid-";
/// Marker prefix for the consensus engine.
pub const CONSENSUS_PID_PREFIX: &str = "tm-pid-";

/// A single liveness marker on disk.
#[derive(Debug)]
pub struct PidMarker {
    path: PathBuf,
}

impl PidMarker {
    /// Create the marker file `<dir>/<prefix><pid>` (zero bytes).
    pub fn create(dir: &Path, prefix: &str, pid: u32) -> Result<Self, MarkerError> {
        let path = dir.join(format!("{prefix}{pid}"));
        std::fs::write(&path, b"").map_err(|e| MarkerError::Create {
            path: path.clone(),
            source: e,
        })?;
        Ok(Self { path })
    }

    /// Path of the marker file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the marker file.
    ///
    /// A marker that is already gone is not an error; anything else
    /// (permissions, read-only filesystem) propagates.
    pub fn remove(&self) -> Result<(), MarkerError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MarkerError::Remove {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

/// Errors from marker file operations.
#[derive(Debug)]
pub enum MarkerError {
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for MarkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerError::Create { path, source } => {
                write!(f, "failed to create marker {}: {source}", path.display())
            }
            MarkerError::Remove { path, source } => {
                write!(f, "failed to remove marker {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for MarkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarkerError::Create { source, .. } => Some(source),
            MarkerError::Remove { source, .. } => Some(source),
        }
    }
}
