//! Application configuration handling.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Directory name used under the platform config and data roots.
pub const APP_DIR: &str = "ludoteca";

const DEFAULT_CONFIG: &str = "\
# ludoteca configuration
#
# data_dir: directory holding games.json and rentals.json.
# Defaults to the platform data directory when unset.
#data_dir = \"/path/to/data\"
";

/// Runtime configuration, layered from the config file and `LUDOTECA_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the two backing files.
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file path and environment.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(config_path()).required(false))
            .add_source(config::Environment::with_prefix("LUDOTECA"))
            .build()
            .context("failed to load configuration")?;
        let config = settings
            .try_deserialize()
            .context("failed to parse configuration")?;
        Ok(config)
    }

    /// Path of the game collection file.
    pub fn games_path(&self) -> PathBuf {
        self.data_dir.join("games.json")
    }

    /// Path of the rental collection file.
    pub fn rentals_path(&self) -> PathBuf {
        self.data_dir.join("rentals.json")
    }
}

/// Location of the user's config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backing_files_live_under_the_data_dir() {
        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/ludoteca-test"),
        };
        assert_eq!(
            config.games_path(),
            PathBuf::from("/tmp/ludoteca-test/games.json")
        );
        assert_eq!(
            config.rentals_path(),
            PathBuf::from("/tmp/ludoteca-test/rentals.json")
        );
    }

    #[test]
    fn default_data_dir_ends_with_the_app_dir() {
        let config = AppConfig::default();
        assert!(config.data_dir.ends_with(APP_DIR));
    }
}
