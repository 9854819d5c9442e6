//! API credential and region resolution.
//!
//! Values come from three layers, checked in order for each field on its
//! own: process environment, the persisted settings file, and (for the
//! region only) the US1 default. A blank value or an unrecognised region
//! code counts as "not set" and falls through to the next layer.
//!
//! The layers are resolved once, when the store is built. After that the
//! store only changes through `save`, so reads never touch the disk.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::region::RegionId;

pub const ENV_API_KEY: &str = "DATADOG_API_KEY";
pub const ENV_APP_KEY: &str = "DATADOG_APP_KEY";
pub const ENV_REGION: &str = "DATADOG_REGION";

/// Resolved credentials. Key material is only reachable through
/// [`Credentials::api_keys`] and never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    api_key: Option<String>,
    app_key: Option<String>,
    region: RegionId,
}

/// Both keys, present and non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeys {
    api_key: String,
    app_key: String,
}

impl Credentials {
    pub fn new(api_key: Option<String>, app_key: Option<String>, region: RegionId) -> Self {
        Self {
            api_key,
            app_key,
            region,
        }
    }

    pub fn region(&self) -> RegionId {
        self.region
    }

    /// `true` iff both keys are present and non-empty.
    pub fn is_valid(&self) -> bool {
        self.api_keys().is_some()
    }

    pub fn api_keys(&self) -> Option<ApiKeys> {
        match (non_empty(self.api_key.as_deref()), non_empty(self.app_key.as_deref())) {
            (Some(api_key), Some(app_key)) => Some(ApiKeys {
                api_key: api_key.to_string(),
                app_key: app_key.to_string(),
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &redacted(self.api_key.as_deref()))
            .field("app_key", &redacted(self.app_key.as_deref()))
            .field("region", &self.region)
            .finish()
    }
}

impl ApiKeys {
    pub fn new(api_key: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            app_key: app_key.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("api_key", &"<redacted>")
            .field("app_key", &"<redacted>")
            .finish()
    }
}

fn redacted(value: Option<&str>) -> &'static str {
    match non_empty(value) {
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ---- Persisted settings ----

/// The three persisted values, stored as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Backing store for persisted settings.
pub trait SettingsStore: Send + Sync {
    fn read(&self) -> Result<PersistedSettings, AppError>;
    fn write(&self, settings: &PersistedSettings) -> Result<(), AppError>;
}

/// Settings kept in a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonSettingsFile {
    path: PathBuf,
}

impl JsonSettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/datadog-alert-tracker/settings.json`
    pub fn default_path() -> Result<PathBuf, AppError> {
        let dir = dirs::config_dir()
            .ok_or_else(|| AppError::Settings("Could not find config directory".into()))?;
        Ok(dir.join("datadog-alert-tracker").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsFile {
    fn read(&self) -> Result<PersistedSettings, AppError> {
        if !self.path.exists() {
            return Ok(PersistedSettings::default());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|e| {
            AppError::Settings(format!(
                "Failed to parse {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn write(&self, settings: &PersistedSettings) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Settings(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// Process-local settings, for tests and embedders without a disk.
#[derive(Debug, Default)]
pub struct MemorySettings {
    inner: Mutex<PersistedSettings>,
}

impl MemorySettings {
    pub fn new(settings: PersistedSettings) -> Self {
        Self {
            inner: Mutex::new(settings),
        }
    }

    pub fn snapshot(&self) -> PersistedSettings {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SettingsStore for MemorySettings {
    fn read(&self) -> Result<PersistedSettings, AppError> {
        Ok(self.snapshot())
    }

    fn write(&self, settings: &PersistedSettings) -> Result<(), AppError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| AppError::Settings("settings lock poisoned".into()))?;
        *guard = settings.clone();
        Ok(())
    }
}

// ---- Store ----

/// Resolves and persists credentials.
pub struct CredentialStore {
    settings: Box<dyn SettingsStore>,
    current: Credentials,
}

impl CredentialStore {
    /// Store reading overrides from the process environment.
    pub fn new(settings: impl SettingsStore + 'static) -> Self {
        Self::with_env(settings, |name| std::env::var(name).ok())
    }

    /// Store reading overrides through `env`, a map in tests.
    pub fn with_env(
        settings: impl SettingsStore + 'static,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let current = resolve(&settings, &env);
        Self {
            settings: Box::new(settings),
            current,
        }
    }

    /// The current credentials.
    pub fn load(&self) -> Credentials {
        self.current.clone()
    }

    /// Overwrite all three persisted values.
    ///
    /// The new values take effect for this process even if writing them to
    /// the settings store fails; the write error is still returned.
    pub fn save(
        &mut self,
        api_key: &str,
        app_key: &str,
        region: RegionId,
    ) -> Result<(), AppError> {
        self.current = Credentials::new(
            Some(api_key.to_string()),
            Some(app_key.to_string()),
            region,
        );

        self.settings.write(&PersistedSettings {
            api_key: Some(api_key.to_string()),
            app_key: Some(app_key.to_string()),
            region: Some(region.code().to_string()),
        })?;

        tracing::info!(%region, "Credentials saved");
        Ok(())
    }

    pub fn has_valid_credentials(&self) -> bool {
        self.current.is_valid()
    }

    pub fn current_region(&self) -> RegionId {
        self.current.region()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

/// Field-by-field resolution, environment first.
fn resolve(settings: &dyn SettingsStore, env: &dyn Fn(&str) -> Option<String>) -> Credentials {
    let persisted = match settings.read() {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!("Ignoring unreadable persisted settings: {}", err);
            PersistedSettings::default()
        }
    };

    let api_key = first_set(&[&|| env(ENV_API_KEY), &|| persisted.api_key.clone()]);
    let app_key = first_set(&[&|| env(ENV_APP_KEY), &|| persisted.app_key.clone()]);
    let region = first_region(&[&|| env(ENV_REGION), &|| persisted.region.clone()])
        .unwrap_or_default();

    Credentials::new(api_key, app_key, region)
}

type Resolver<'a> = &'a dyn Fn() -> Option<String>;

/// First resolver yielding a non-blank value.
fn first_set(resolvers: &[Resolver<'_>]) -> Option<String> {
    resolvers
        .iter()
        .filter_map(|resolve| resolve())
        .find(|value| !value.trim().is_empty())
}

/// First resolver yielding a recognised region code.
fn first_region(resolvers: &[Resolver<'_>]) -> Option<RegionId> {
    resolvers
        .iter()
        .filter_map(|resolve| resolve())
        .find_map(|value| {
            let parsed = RegionId::parse(&value);
            if parsed.is_none() {
                tracing::debug!(value = %value, "Ignoring unrecognised region");
            }
            parsed
        })
}
