//! Configuration (expansion of §6's "read-only mapping" mention).
//!
//! A minimal TOML settings file naming only the `cnc.ports` extras the
//! command router's `list` action unions with the OS-discovered ports.
//! Grounded on the teacher's settings layer: `toml` to deserialize,
//! `dirs` to resolve a per-user config directory, optional-by-default so
//! a missing file is not an error.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cnc: CncConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CncConfig {
    #[serde(default)]
    pub ports: Vec<String>,
}

impl Config {
    /// Load from the default config path, falling back to an empty
    /// configuration (not an error) if the file does not exist or fails
    /// to parse.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load from an explicit path, used by tests and by `load()`.
    pub fn load_from(path: &PathBuf) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse cncbridge config, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cncbridge").join("cncbridge.toml"))
    }
}
