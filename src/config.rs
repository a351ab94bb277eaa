//! Configuration file handling
//!
//! The file is YAML. Each entry under `watchers` uses the same keys as the
//! AppDaemon app it replaces (`error`, `error_date`, `error_notify`, ...).

use crate::catalog::catalog_candidates;
use crate::host::HomeAssistantConfig;
use crate::notification::target::{Target, TargetSpec};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_TOKEN_ENV: &str = "HASS_TOKEN";
const DEFAULT_FRIENDLY_NAME: &str = "Robot";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub host: HostSettings,
    /// Poll interval for `watch`, seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Catalog path; relative paths are resolved against the config file
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub watchers: BTreeMap<String, WatcherSettings>,
    /// File this configuration was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: HostSettings::default(),
            poll_interval_secs: default_poll_interval(),
            catalog: None,
            watchers: BTreeMap::new(),
            source: None,
        }
    }
}

/// Home Assistant connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSettings {
    pub url: Option<String>,
    pub token: Option<String>,
    /// Environment variable holding the token when `token` is not set
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            token_env: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// One watcher as written in the file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatcherSettings {
    pub device: Option<String>,
    pub battery: Option<String>,
    pub progress: Option<String>,
    pub charge_status: Option<String>,
    pub friendly_name: Option<String>,
    /// Fault-code signal
    pub error: Option<String>,
    pub error_text: Option<String>,
    /// Fault-timestamp signal
    pub error_date: Option<String>,
    #[serde(default)]
    pub include_details: bool,
    #[serde(default)]
    pub error_notify: Vec<TargetSpec>,
    #[serde(default)]
    pub info_notify: Vec<TargetSpec>,
}

/// Resolved, immutable watcher configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatcherConfig {
    /// Key under `watchers`
    pub name: String,
    pub device: Option<String>,
    pub fault_signal: Option<String>,
    pub timestamp_signal: Option<String>,
    pub battery_signal: Option<String>,
    pub progress_signal: Option<String>,
    pub charge_signal: Option<String>,
    pub error_text_signal: Option<String>,
    pub friendly_name: String,
    pub include_details: bool,
    pub error_targets: Vec<Target>,
    pub info_targets: Vec<Target>,
}

impl WatcherConfig {
    pub fn from_settings(name: impl Into<String>, settings: &WatcherSettings) -> Self {
        let name = name.into();
        let friendly_name = settings
            .friendly_name
            .clone()
            .or_else(|| settings.device.clone())
            .unwrap_or_else(|| DEFAULT_FRIENDLY_NAME.to_string());

        Self {
            error_targets: resolve_targets(&name, "error_notify", &settings.error_notify),
            info_targets: resolve_targets(&name, "info_notify", &settings.info_notify),
            name,
            device: settings.device.clone(),
            fault_signal: non_empty(&settings.error),
            timestamp_signal: non_empty(&settings.error_date),
            battery_signal: non_empty(&settings.battery),
            progress_signal: non_empty(&settings.progress),
            charge_signal: non_empty(&settings.charge_status),
            error_text_signal: non_empty(&settings.error_text),
            friendly_name,
            include_details: settings.include_details,
        }
    }
}

fn resolve_targets(watcher: &str, key: &str, specs: &[TargetSpec]) -> Vec<Target> {
    specs
        .iter()
        .filter_map(|spec| {
            let target = spec.resolve();
            if target.is_none() {
                warn!(watcher, key, spec = ?spec, "Skipping notify target without an entity");
            }
            target
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn default_poll_interval() -> u64 {
    5
}

fn default_timeout() -> u64 {
    10
}

impl AppConfig {
    /// Load from `path`, or from the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("robot-alert");

        Ok(config_dir.join("config.yaml"))
    }

    /// Directory of the file this configuration came from
    pub fn config_dir(&self) -> Option<&Path> {
        self.source.as_deref().and_then(Path::parent)
    }

    /// Catalog paths to try, in order
    pub fn catalog_candidates(&self) -> Vec<PathBuf> {
        catalog_candidates(self.catalog.as_deref(), self.config_dir())
    }

    /// All watchers, in name order
    pub fn watcher_configs(&self) -> Vec<WatcherConfig> {
        self.watchers
            .iter()
            .map(|(name, settings)| WatcherConfig::from_settings(name, settings))
            .collect()
    }

    pub fn watcher(&self, name: &str) -> Option<WatcherConfig> {
        self.watchers
            .get(name)
            .map(|settings| WatcherConfig::from_settings(name, settings))
    }

    /// Access token from the file or from the configured environment variable
    pub fn host_token(&self) -> Option<String> {
        if let Some(token) = non_empty(&self.host.token) {
            return Some(token);
        }
        let var = self.host.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV);
        std::env::var(var).ok().filter(|t| !t.is_empty())
    }

    /// Home Assistant client configuration
    pub fn home_assistant(&self) -> Result<HomeAssistantConfig> {
        let base_url = non_empty(&self.host.url).context("host.url is not configured")?;
        let token = self.host_token().with_context(|| {
            format!(
                "No access token: set host.token or the {} environment variable",
                self.host.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV)
            )
        })?;

        Ok(HomeAssistantConfig {
            base_url,
            token,
            timeout_secs: self.host.timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::target::Backend;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
host:
  url: http://ha.local:8123
  token: secret
catalog: codes.json
watchers:
  garth:
    device: lawn_mower.garth
    battery: sensor.garth_battery
    progress: sensor.garth_progress
    charge_status: binary_sensor.garth_charging
    friendly_name: Garth mower
    error: sensor.garth_last_error_code
    error_text: sensor.garth_last_error
    error_date: sensor.garth_last_error_time
    error_notify:
      - entity: notify.my_office_speak
      - notify.pushover
      - entity: ""
    info_notify:
      - entity: notify.phone
        backend: pushover
  luba:
    device: lawn_mower.luba
"#;

    #[test]
    fn test_parse_watchers() {
        let config = AppConfig::from_yaml_str(SAMPLE).unwrap();
        let garth = config.watcher("garth").unwrap();

        assert_eq!(garth.friendly_name, "Garth mower");
        assert_eq!(garth.fault_signal.as_deref(), Some("sensor.garth_last_error_code"));
        assert_eq!(garth.timestamp_signal.as_deref(), Some("sensor.garth_last_error_time"));
        assert_eq!(
            garth.error_targets,
            vec![
                Target::with_backend("notify.my_office_speak", Backend::Speak),
                Target::with_backend("notify.pushover", Backend::Pushover),
            ]
        );
        assert_eq!(
            garth.info_targets,
            vec![Target::with_backend("notify.phone", Backend::Pushover)]
        );
        assert!(!garth.include_details);
    }

    #[test]
    fn test_friendly_name_defaults() {
        let config = AppConfig::from_yaml_str(SAMPLE).unwrap();
        let luba = config.watcher("luba").unwrap();
        assert_eq!(luba.friendly_name, "lawn_mower.luba");
        assert_eq!(luba.fault_signal, None);

        let bare = WatcherConfig::from_settings("x", &WatcherSettings::default());
        assert_eq!(bare.friendly_name, "Robot");
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_yaml_str("watchers: {}").unwrap();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.host.timeout_secs, 10);
        assert!(config.watcher_configs().is_empty());
        assert_eq!(AppConfig::default().poll_interval_secs, 5);
    }

    #[test]
    fn test_load_from_sets_source_and_catalog_candidates() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.config_dir(), Some(temp.path()));
        assert_eq!(config.catalog_candidates()[0], temp.path().join("codes.json"));
        assert_eq!(config.watcher_configs().len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let temp = tempdir().unwrap();
        let err = AppConfig::load_from(&temp.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_home_assistant_settings() {
        let config = AppConfig::from_yaml_str(SAMPLE).unwrap();
        let ha = config.home_assistant().unwrap();
        assert_eq!(ha.base_url, "http://ha.local:8123");
        assert_eq!(ha.token, "secret");

        let config = AppConfig::from_yaml_str("watchers: {}").unwrap();
        assert!(config.home_assistant().is_err());
    }

    #[test]
    fn test_blank_signal_ids_are_absent() {
        let settings = WatcherSettings {
            error: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(WatcherConfig::from_settings("x", &settings).fault_signal, None);
    }
}
