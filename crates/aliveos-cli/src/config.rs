//! Configuration Vault – reads/writes `~/.aliveos/c2c.toml`.

use aliveos_runtime::LogFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted coordinator configuration stored in `~/.aliveos/c2c.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Per-topic capacity of the internal event bus.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    /// How often the readiness wait logs that Ego is not ready yet.
    #[serde(default = "default_ready_poll_interval_ms")]
    pub ready_poll_interval_ms: u64,

    /// Treat Ego as ready at startup instead of waiting for its
    /// announcement on the bus.  Off by default, so the first `Continue`
    /// waits for an `EgoReady` event (or `/ready` in the shell).
    #[serde(default = "default_ego_ready_on_start")]
    pub ego_ready_on_start: bool,

    /// Directory of `*.json` concept descriptors registered at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concepts_dir: Option<PathBuf>,

    #[serde(default)]
    pub log_format: LogFormat,

    /// OTLP/HTTP collector base URL.  Span export is off when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otlp_endpoint: Option<String>,
}

fn default_bus_capacity() -> usize {
    256
}
fn default_ready_poll_interval_ms() -> u64 {
    100
}
fn default_ego_ready_on_start() -> bool {
    false
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus_capacity: default_bus_capacity(),
            ready_poll_interval_ms: default_ready_poll_interval_ms(),
            ego_ready_on_start: default_ego_ready_on_start(),
            concepts_dir: None,
            log_format: LogFormat::default(),
            otlp_endpoint: None,
        }
    }
}

impl Config {
    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_interval_ms.max(1))
    }
}

/// Return the path to `~/.aliveos/c2c.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".aliveos").join("c2c.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("Failed to parse config: {}", e))
}

/// Apply environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ALIVEOS_BUS_CAPACITY` | `bus_capacity` |
/// | `ALIVEOS_READY_POLL_MS` | `ready_poll_interval_ms` |
/// | `ALIVEOS_CONCEPTS_DIR` | `concepts_dir` |
/// | `ALIVEOS_LOG_FORMAT` | `log_format` |
/// | `OTEL_EXPORTER_OTLP_ENDPOINT` | `otlp_endpoint` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("ALIVEOS_BUS_CAPACITY")
        && let Ok(capacity) = v.parse::<usize>()
        && capacity > 0
    {
        cfg.bus_capacity = capacity;
    }
    if let Ok(v) = std::env::var("ALIVEOS_READY_POLL_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.ready_poll_interval_ms = ms;
    }
    if let Ok(v) = std::env::var("ALIVEOS_CONCEPTS_DIR") {
        cfg.concepts_dir = Some(PathBuf::from(v));
    }
    if let Ok(v) = std::env::var("ALIVEOS_LOG_FORMAT")
        && let Ok(format) = v.parse::<LogFormat>()
    {
        cfg.log_format = format;
    }
    if let Ok(v) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        cfg.otlp_endpoint = Some(v);
    }
}

/// Save the config to disk, creating `~/.aliveos/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
