use std::env;
use std::path::PathBuf;

/// Local storage configuration.
///
/// Reads from the `PLANBUDDY_DATA_DIR` environment variable, falling back to
/// the platform data directory (`~/.local/share/planbuddy` on Linux).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding one file per stored key.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Name of the per-user subdirectory under the platform data directory.
    pub const APP_DIR: &str = "planbuddy";

    /// Build a config from the environment.
    ///
    /// Priority: `PLANBUDDY_DATA_DIR` env var, then [`Self::default_data_dir`].
    pub fn from_env() -> Self {
        let data_dir = env::var_os("PLANBUDDY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_data_dir);
        Self { data_dir }
    }

    /// Build a config from an explicit directory (useful for tests and CLI flags).
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Platform data directory joined with [`Self::APP_DIR`]. Falls back to
    /// `./.planbuddy` when the platform directory is unknown.
    pub fn default_data_dir() -> PathBuf {
        match dirs::data_dir() {
            Some(dir) => dir.join(Self::APP_DIR),
            None => PathBuf::from(".").join(format!(".{}", Self::APP_DIR)),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
