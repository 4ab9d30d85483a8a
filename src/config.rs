use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::batch::{BatchMode, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ROWS};
use crate::dispatch::PayloadKey;
use crate::error::GleanError;
use crate::normalize::profile::{DEFAULT_PROFILE, FieldProfile};

/// Config file read from the working directory when `GLEANER_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "gleaner.toml";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_REPORT_TITLE: &str = "FEEDBACK INTELLIGENCE REPORT";

/// Remote analysis endpoint settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: Option<String>,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub api_token: Option<String>,
    pub payload_key: PayloadKey,
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_token: None,
            payload_key: PayloadKey::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("url", &self.url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("payload_key", &self.payload_key)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Row batching settings. Deployment-specific, not part of the endpoint protocol.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub mode: BatchMode,
    pub size: usize,
    /// Total rows sent per run; `0` in the file means no cap.
    pub max_rows: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: BatchMode::default(),
            size: DEFAULT_BATCH_SIZE,
            max_rows: Some(DEFAULT_MAX_ROWS),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub batch: BatchConfig,
    /// Name of the profile used when a request does not pick one.
    pub profile: String,
    /// Deployment-defined profiles; these shadow built-ins of the same name.
    pub profiles: Vec<FieldProfile>,
    pub report_title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            batch: BatchConfig::default(),
            profile: DEFAULT_PROFILE.to_string(),
            profiles: Vec::new(),
            report_title: DEFAULT_REPORT_TITLE.to_string(),
        }
    }
}

impl Config {
    /// File (if any) first, then environment overrides. Never fails: problems
    /// are logged and the affected setting keeps its default.
    pub fn load() -> Self {
        let mut config = match config_path() {
            Some(path) => match Self::from_file(&path) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "loaded config file");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "ignoring config file: {e}");
                    Self::default()
                }
            },
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok());

        if config.endpoint.url.is_none() {
            tracing::warn!("GLEANER_ENDPOINT_URL not set, analyze unavailable");
        }
        config
    }

    pub fn from_file(path: &Path) -> Result<Self, GleanError> {
        let text = std::fs::read_to_string(path).map_err(|source| GleanError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, GleanError> {
        let mut config: Config =
            toml::from_str(text).map_err(|e| GleanError::Config(e.to_string()))?;
        config.profiles = std::mem::take(&mut config.profiles)
            .into_iter()
            .map(FieldProfile::validated)
            .collect::<Result<_, _>>()?;
        if config.batch.max_rows == Some(0) {
            config.batch.max_rows = None;
        }
        Ok(config)
    }

    /// Apply `GLEANER_*` overrides from `lookup` (the process environment in
    /// production). Unparseable values are logged and skipped.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("GLEANER_ENDPOINT_URL") {
            self.endpoint.url = Some(url);
        }
        if let Some(token) = get("GLEANER_API_TOKEN") {
            self.endpoint.api_token = Some(token);
        }
        if let Some(key) = get("GLEANER_PAYLOAD_KEY") {
            match key.to_lowercase().as_str() {
                "text" => self.endpoint.payload_key = PayloadKey::Text,
                "data" => self.endpoint.payload_key = PayloadKey::Data,
                other => tracing::warn!("GLEANER_PAYLOAD_KEY={other} not recognized, keeping {}", self.endpoint.payload_key.as_str()),
            }
        }
        if let Some(size) = get("GLEANER_BATCH_SIZE") {
            match size.parse::<usize>() {
                Ok(n) if n > 0 => self.batch.size = n,
                _ => tracing::warn!("GLEANER_BATCH_SIZE={size} is not a positive integer, ignoring"),
            }
        }
        if let Some(rows) = get("GLEANER_MAX_ROWS") {
            match rows.parse::<usize>() {
                Ok(0) => self.batch.max_rows = None,
                Ok(n) => self.batch.max_rows = Some(n),
                Err(_) => tracing::warn!("GLEANER_MAX_ROWS={rows} is not an integer, ignoring"),
            }
        }
        if let Some(mode) = get("GLEANER_MODE") {
            match mode.to_lowercase().as_str() {
                "batch" => self.batch.mode = BatchMode::Batch,
                "per_row" | "per-row" | "row" => self.batch.mode = BatchMode::PerRow,
                other => tracing::warn!("GLEANER_MODE={other} not recognized, ignoring"),
            }
        }
        if let Some(profile) = get("GLEANER_PROFILE") {
            self.profile = profile.to_lowercase();
        }
        if let Some(timeout) = get("GLEANER_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(n) if n > 0 => self.endpoint.timeout_secs = n,
                _ => tracing::warn!("GLEANER_TIMEOUT_SECS={timeout} is not a positive integer, ignoring"),
            }
        }
    }

    /// Look up a profile by name: deployment profiles first, then built-ins.
    /// `None` selects the configured default profile.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<FieldProfile, GleanError> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.profile)
            .to_lowercase();

        self.profiles
            .iter()
            .find(|p| p.name.to_lowercase() == name)
            .cloned()
            .or_else(|| FieldProfile::builtin(&name))
            .ok_or_else(|| {
                GleanError::Config(format!(
                    "unknown profile '{name}'; available: {}",
                    self.profile_names().join(", ")
                ))
            })
    }

    /// Every selectable profile name, deployment profiles first.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.iter().map(|p| p.name.to_lowercase()).collect();
        for builtin in crate::normalize::profile::BUILTIN_PROFILES {
            if !names.iter().any(|n| n == builtin) {
                names.push(builtin.to_string());
            }
        }
        names
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("GLEANER_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.exists().then_some(local)
}
