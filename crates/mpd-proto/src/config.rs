use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    /// Show the debug counters under the now-playing block.
    #[serde(default)]
    pub debug: bool,
}

/// Where the session collaborator should connect. Carried here so the
/// embedding process has one config file; the display itself never dials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Track fields shown for each queue entry, in order.
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,
    #[serde(default = "default_field_separator")]
    pub field_separator: String,
    /// Debounce window for bursts of change notifications.
    #[serde(default = "default_coalesce_delay_ms")]
    pub coalesce_delay_ms: u64,
    /// How often elapsed time is advanced locally while playing.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Bounded wait for each background task at shutdown before aborting it.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            field_separator: default_field_separator(),
            coalesce_delay_ms: default_coalesce_delay_ms(),
            tick_interval_secs: default_tick_interval_secs(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl DisplayConfig {
    pub fn coalesce_delay(&self) -> Duration {
        Duration::from_millis(self.coalesce_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6600
}

fn default_fields() -> Vec<String> {
    vec!["title".to_string(), "artist".to_string(), "album".to_string()]
}

fn default_field_separator() -> String {
    " * ".to_string()
}

fn default_coalesce_delay_ms() -> u64 {
    100
}

fn default_tick_interval_secs() -> u64 {
    2
}

fn default_shutdown_grace_ms() -> u64 {
    500
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "True" | "true" | "yes" | "on")
}

impl Config {
    /// Load `<config_dir>/config.toml`, writing the defaults on first run,
    /// then fold in environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        let mut config = if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            config
        } else {
            Self::load_from(&config_path)?
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// `MPD_HOST`, `MPD_PORT` and `DEBUG` take precedence over the file.
    /// Unparsable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("MPD_HOST").filter(|h| !h.is_empty()) {
            self.connection.host = host;
        }
        if let Some(port) = lookup("MPD_PORT") {
            match port.parse() {
                Ok(port) => self.connection.port = port,
                Err(e) => tracing::warn!("ignoring MPD_PORT={:?}: {}", port, e),
            }
        }
        if let Some(debug) = lookup("DEBUG") {
            self.debug = is_truthy(&debug);
        }
    }
}
