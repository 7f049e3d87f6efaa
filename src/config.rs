use crate::constants::*;
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Run settings with all values filled in (no Options).
///
/// Deserialized from the optional `[run]` table of the config file. Every field
/// has a default, so a config file may omit the table entirely.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    /// OAuth token endpoint used to trade in the refresh token
    pub auth_url: String,
    /// Org unit whose grades are exported (`parentOrgUnitId` filter)
    pub org_unit_id: u64,
    /// How many years back the export's `startDate` reaches
    pub lookback_years: u32,
    /// Directory receiving the report archives
    pub download_dir: PathBuf,
    /// Number of most recent archives kept after a run
    pub keep_reports: usize,
    /// Fixed delay between job status checks
    pub poll_interval_secs: u64,
    /// Ceiling on the time spent waiting for the job
    pub poll_timeout_secs: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            org_unit_id: DEFAULT_ORG_UNIT_ID,
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            keep_reports: DEFAULT_KEEP_REPORTS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }
}

impl RunSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

/// Tenant credentials and export parameters loaded from a TOML file.
///
/// `refresh_token` is the only value that changes between runs; it is
/// rewritten in place by [`crate::credentials::FileCredentialStore`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Tenant URL, e.g. `https://school.brightspace.com`
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// OAuth scope requested on every token renewal
    pub scope: String,
    pub refresh_token: String,
    /// Data set identifier of the "All Grades" export
    pub dataset_id: String,
    #[serde(default)]
    pub run: RunSettings,
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, the TOML is malformed,
    /// required keys are missing, unknown keys are present, or a value fails
    /// validation.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> AppResult<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        let required = [
            ("base_url", &self.base_url),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("scope", &self.scope),
            ("refresh_token", &self.refresh_token),
            ("dataset_id", &self.dataset_id),
        ];
        if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AppError::ConfigError(format!("{key} must not be empty")));
        }

        Url::parse(&self.base_url)?;
        Url::parse(&self.run.auth_url)?;

        if self.run.keep_reports == 0 {
            return Err(AppError::ConfigError(
                "keep_reports must be greater than 0".into(),
            ));
        }
        if self.run.poll_interval_secs == 0 {
            return Err(AppError::ConfigError(
                "poll_interval_secs must be greater than 0".into(),
            ));
        }
        if self.run.poll_timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "poll_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        base_url = "https://school.brightspace.com"
        client_id = "client"
        client_secret = "secret"
        scope = "datahub:dataexports:*"
        refresh_token = "rt-1"
        dataset_id = "ds-1"
    "#;

    #[test]
    fn default_run_settings() {
        let run = RunSettings::default();
        assert_eq!(run.keep_reports, 3);
        assert_eq!(run.poll_interval(), Duration::from_secs(60));
        assert_eq!(run.poll_timeout(), Duration::from_secs(7200));
        assert_eq!(run.lookback_years, 4);
        assert_eq!(run.download_dir, PathBuf::from("downloads"));
    }

    #[test]
    fn minimal_toml_is_parsed_and_defaults_apply() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.client_id, "client");
        assert_eq!(config.refresh_token, "rt-1");
        assert_eq!(config.run, RunSettings::default());
    }

    #[test]
    fn run_table_overrides_defaults() {
        let contents = format!(
            "{MINIMAL}\n[run]\nkeep_reports = 5\npoll_interval_secs = 10\ndownload_dir = \"out\"\n"
        );
        let config = Config::from_toml_str(&contents).unwrap();
        assert_eq!(config.run.keep_reports, 5);
        assert_eq!(config.run.poll_interval_secs, 10);
        assert_eq!(config.run.download_dir, PathBuf::from("out"));
        assert_eq!(config.run.poll_timeout_secs, 7200);
    }

    #[test]
    fn missing_required_toml_field_errors() {
        let contents = MINIMAL.replace("dataset_id = \"ds-1\"", "");
        assert!(matches!(
            Config::from_toml_str(&contents),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn empty_required_value_errors() {
        let contents = MINIMAL.replace("\"rt-1\"", "\"  \"");
        let err = Config::from_toml_str(&contents).unwrap_err();
        assert!(err.to_string().contains("refresh_token"));
    }

    #[test]
    fn unknown_key_errors() {
        let contents = format!("{MINIMAL}\nextra_flag = true\n");
        assert!(Config::from_toml_str(&contents).is_err());
    }

    #[test]
    fn zero_keep_reports_errors() {
        let contents = format!("{MINIMAL}\n[run]\nkeep_reports = 0\n");
        assert!(Config::from_toml_str(&contents).is_err());
    }

    #[test]
    fn invalid_base_url_errors() {
        let contents = MINIMAL.replace("https://school.brightspace.com", "not a url");
        assert!(matches!(
            Config::from_toml_str(&contents),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn missing_file_errors() {
        let err = Config::from_toml_file(Path::new("does-not-exist.toml")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
