use std::path::{Path, PathBuf};

/// Home directories for the two supervised processes.
///
/// The application node keeps its config and storage under one home
/// (default `~/.band`), the consensus engine under another (default
/// `~/.tendermint`). Both can be overridden on the command line; the
/// defaults need a resolvable `$HOME`.
#[derive(Debug, Clone)]
pub struct Homes {
    app: PathBuf,
    consensus: PathBuf,
}

/// Directory name of the default application home under `$HOME`.
pub const APP_HOME_DIR: &str = ".band";
/// Directory name of the default consensus home under `$HOME`.
pub const CONSENSUS_HOME_DIR: &str = ".tendermint";

impl Homes {
    /// Resolve both homes, using `$HOME`-based defaults where no
    /// override is given.
    pub fn resolve(
        app_override: Option<&Path>,
        consensus_override: Option<&Path>,
    ) -> Result<Self, HomeError> {
        let app = match app_override {
            Some(dir) => dir.to_path_buf(),
            None => home_dir()?.join(APP_HOME_DIR),
        };
        let consensus = match consensus_override {
            Some(dir) => dir.to_path_buf(),
            None => home_dir()?.join(CONSENSUS_HOME_DIR),
        };
        Ok(Self { app, consensus })
    }

    /// The application node's home directory.
    pub fn app(&self) -> &Path {
        &self.app
    }

    /// The consensus engine's home directory.
    pub fn consensus(&self) -> &Path {
        &self.consensus
    }

    /// Path of the node config file under the application home.
    pub fn node_config(&self) -> PathBuf {
        self.app.join("config").join("config.toml")
    }

    /// Resolve the configured storage path against the application home.
    pub fn app_db(&self, db_path: &str) -> PathBuf {
        self.app.join(db_path)
    }
}

fn home_dir() -> Result<PathBuf, HomeError> {
    dirs::home_dir().ok_or(HomeError::HomeNotFound)
}

/// Errors from home-directory resolution.
#[derive(Debug)]
pub enum HomeError {
    /// `$HOME` could not be determined and no override was given.
    HomeNotFound,
}

impl std::fmt::Display for HomeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HomeError::HomeNotFound => {
                write!(f, "could not determine a home directory; pass --home and --consensus-home")
            }
        }
    }
}

impl std::error::Error for HomeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_are_used_verbatim() {
        let homes = Homes::resolve(
            Some(Path::new("/srv/chain/app")),
            Some(Path::new("/srv/chain/consensus")),
        )
        .unwrap();
        assert_eq!(homes.app(), Path::new("/srv/chain/app"));
        assert_eq!(homes.consensus(), Path::new("/srv/chain/consensus"));
    }

    #[test]
    fn test_defaults_land_under_home() {
        // CI always has a home directory; the suffixes are the contract
        let homes = Homes::resolve(None, None).unwrap();
        assert!(homes.app().ends_with(APP_HOME_DIR));
        assert!(homes.consensus().ends_with(CONSENSUS_HOME_DIR));
    }

    #[test]
    fn test_node_config_lives_under_app_home() {
        let homes =
            Homes::resolve(Some(Path::new("/srv/app")), Some(Path::new("/srv/tm"))).unwrap();
        assert_eq!(
            homes.node_config(),
            PathBuf::from("/srv/app/config/config.toml")
        );
    }

    #[test]
    fn test_app_db_joins_relative_path() {
        let homes =
            Homes::resolve(Some(Path::new("/srv/app")), Some(Path::new("/srv/tm"))).unwrap();
        assert_eq!(homes.app_db("data/db"), PathBuf::from("/srv/app/data/db"));
    }

    #[test]
    fn test_mixed_override_keeps_other_default() {
        let homes = Homes::resolve(Some(Path::new("/tmp/apphome")), None).unwrap();
        assert_eq!(homes.app(), Path::new("/tmp/apphome"));
        assert!(homes.consensus().ends_with(CONSENSUS_HOME_DIR));
    }
}
