use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Node configuration read from `<app-home>/config/config.toml`.
///
/// Only the keys the supervisor forwards are modeled; the file may carry
/// arbitrary other sections for the node binaries themselves.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeConfig {
    /// Listen port handed to the application node as one argv token.
    /// Accepted as either a TOML string or integer.
    #[serde(deserialize_with = "port_value")]
    pub port: String,
    /// Storage path, relative to the application home.
    pub db_path: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: "26658".to_string(),
            db_path: "data/db".to_string(),
        }
    }
}

/// Load the node configuration from a TOML file.
///
/// A missing or unparseable file is fatal to startup; missing keys fall
/// back to the defaults above.
pub fn load(path: &Path) -> Result<NodeConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Accept `port = "26658"` and `port = 26658` alike.
fn port_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

/// Errors that can occur while loading the node configuration.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_string_port() {
        let cfg: NodeConfig = toml::from_str("port = \"26657\"\ndb_path = \"data/db\"\n").unwrap();
        assert_eq!(cfg.port, "26657");
        assert_eq!(cfg.db_path, "data/db");
    }

    #[test]
    fn test_parse_integer_port() {
        let cfg: NodeConfig = toml::from_str("port = 26657\n").unwrap();
        assert_eq!(cfg.port, "26657");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let cfg: NodeConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, NodeConfig::default());
        assert_eq!(cfg.port, "26658");
        assert_eq!(cfg.db_path, "data/db");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        // The node binaries own the rest of the file
        let cfg: NodeConfig =
            toml::from_str("port = \"26658\"\nmoniker = \"validator-7\"\n[p2p]\nseeds = \"\"\n")
                .unwrap();
        assert_eq!(cfg.port, "26658");
    }

    #[test]
    fn test_float_port_is_rejected() {
        let err = toml::from_str::<NodeConfig>("port = 2.5\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = \"9000\"\ndb_path = \"state/rocks\"\n").unwrap();

        let cfg = load(&path).unwrap();
        assert_eq!(cfg.port, "9000");
        assert_eq!(cfg.db_path, "state/rocks");
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let err = load(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("nope.toml"));
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn test_load_invalid_toml_reports_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = [not toml").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse config"));
    }
}
