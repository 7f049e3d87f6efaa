//! Durable storage of the rotating refresh token.
//!
//! The refresh token is the only piece of state that outlives a run. It lives
//! next to the rest of the configuration in the TOML file, and
//! [`FileCredentialStore::persist`] rewrites just that key after every
//! successful renewal.

use crate::config::Config;
use crate::constants::PARTIAL_SUFFIX;
use crate::errors::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Source of the active configuration and sink for rotated refresh tokens.
pub trait CredentialStore {
    /// Returns the active configuration, including the latest refresh token.
    fn current(&self) -> &Config;

    /// Durably records `refresh_token` so the next run starts from it.
    ///
    /// Writing the same value twice leaves the durable state unchanged.
    fn persist(&mut self, refresh_token: &str) -> AppResult<()>;
}

/// [`CredentialStore`] backed by the TOML config file itself.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    config: Config,
}

impl FileCredentialStore {
    /// Loads and validates the config file at `path`.
    pub fn open(path: &Path) -> AppResult<Self> {
        let config = Config::from_toml_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mutable access to the run settings, for command-line overrides.
    pub fn run_settings_mut(&mut self) -> &mut crate::config::RunSettings {
        &mut self.config.run
    }
}

impl CredentialStore for FileCredentialStore {
    fn current(&self) -> &Config {
        &self.config
    }

    fn persist(&mut self, refresh_token: &str) -> AppResult<()> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            AppError::IoError(format!("Failed to read {}: {e}", self.path.display()))
        })?;
        let permissions = fs::metadata(&self.path)
            .map_err(|e| {
                AppError::IoError(format!("Failed to stat {}: {e}", self.path.display()))
            })?
            .permissions();
        let mut table: toml::Table = toml::from_str(&contents)?;
        table.insert(
            REFRESH_TOKEN_KEY.to_string(),
            toml::Value::String(refresh_token.to_string()),
        );
        let updated = toml::to_string(&table)
            .map_err(|e| AppError::ConfigError(format!("Failed to serialize config: {e}")))?;

        // Write next to the target and rename so a crash never truncates the config
        let mut tmp_path = self.path.as_os_str().to_owned();
        tmp_path.push(PARTIAL_SUFFIX);
        let tmp_path = PathBuf::from(tmp_path);

        fs::write(&tmp_path, updated).map_err(|e| {
            AppError::IoError(format!(
                "Failed to write temp file {}: {e}",
                tmp_path.display()
            ))
        })?;
        // The file holds secrets; the replacement keeps the original mode
        if let Err(e) = fs::set_permissions(&tmp_path, permissions) {
            let _ = fs::remove_file(&tmp_path);
            return Err(AppError::IoError(format!(
                "Failed to set permissions on {}: {e}",
                tmp_path.display()
            )));
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            AppError::IoError(format!(
                "Failed to rename temp file {} to {}: {e}",
                tmp_path.display(),
                self.path.display()
            ))
        })?;

        self.config.refresh_token = refresh_token.to_string();
        debug!(config = %self.path.display(), "Refresh token persisted");
        Ok(())
    }
}
