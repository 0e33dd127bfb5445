//! Terminal configuration loaded from `~/.cinder/config.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Name of the per-user settings directory under the home directory.
pub const CONFIG_DIR: &str = ".cinder";

/// File name of the terminal configuration inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// User overrides for how terminal shells are launched.
///
/// Every field is optional; unset fields fall back to platform defaults
/// when the launch plan is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerminalConfig {
    /// Shell program, overriding both `$SHELL` and the platform default.
    pub shell: Option<String>,
    pub shell_args: Option<Vec<String>>,
    /// Working directory for new shells. Defaults to the home directory.
    pub cwd: Option<PathBuf>,
    pub term: Option<String>,
    /// Directories appended to the inherited search path.
    pub path_append: Option<Vec<PathBuf>>,
    pub env: BTreeMap<String, String>,
}

impl TerminalConfig {
    /// `~/.cinder/config.json`, or `None` when there is no home directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
