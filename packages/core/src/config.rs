use std::env;
use std::path::PathBuf;

use crate::credentials::JsonSettingsFile;
use crate::scheduler::DEFAULT_POLL_INTERVAL;

pub const ENV_POLL_INTERVAL: &str = "POLL_INTERVAL_SECONDS";
pub const ENV_SETTINGS_PATH: &str = "DATADOG_SETTINGS_PATH";

/// Runtime settings for the binary. Credentials are resolved separately by
/// `CredentialStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub poll_interval_seconds: u64,
    pub settings_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let poll_interval_seconds = match lookup(ENV_POLL_INTERVAL) {
            Some(raw) => parse_interval(&raw)
                .map_err(|_| format!("{} must be a positive number", ENV_POLL_INTERVAL))?,
            None => DEFAULT_POLL_INTERVAL.as_secs(),
        };

        let settings_path = match lookup(ENV_SETTINGS_PATH).filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => JsonSettingsFile::default_path().map_err(|e| e.to_string())?,
        };

        Ok(Self {
            poll_interval_seconds,
            settings_path,
        })
    }

    /// Apply command-line values on top of the environment.
    pub fn with_overrides(
        mut self,
        poll_interval: Option<u64>,
        settings_path: Option<PathBuf>,
    ) -> Result<Self, String> {
        if let Some(secs) = poll_interval {
            if secs == 0 {
                return Err("--interval must be a positive number".into());
            }
            self.poll_interval_seconds = secs;
        }
        if let Some(path) = settings_path {
            self.settings_path = path;
        }
        Ok(self)
    }
}

fn parse_interval(raw: &str) -> Result<u64, ()> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(()),
        Ok(secs) => Ok(secs),
    }
}
