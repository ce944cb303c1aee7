// Local configuration for the engine and CLI.
//
// Config file: `~/.polysync/config.toml`
// Data (SQLite store): `<data_dir>/polysync.db`, `data_dir` defaults to `~/.polysync`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::engine::applicator::ReplaceMode;
use crate::engine::session::SessionOptions;
use crate::provider::LatencyRange;
use crate::security::{ensure_owner_only_dir, ensure_owner_only_file};

/// Root directory for PolySync state: `~/.polysync/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".polysync"))
}

/// Path to the config file: `~/.polysync/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

// ── Engine config ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Where the document store lives. Defaults to `~/.polysync`.
    pub data_dir: Option<PathBuf>,
    pub autosave: AutosaveConfig,
    pub provider: ProviderConfig,
    pub editor: EditorConfig,
}

impl EngineConfig {
    /// Load from `~/.polysync/config.toml`. Returns defaults if the file
    /// doesn't exist or can't be parsed.
    pub fn load() -> Self {
        global_config_path().and_then(|p| Self::load_from(&p).ok()).unwrap_or_default()
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
            ensure_owner_only_dir(parent).map_err(ConfigError::permissions)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        ensure_owner_only_file(path).map_err(ConfigError::permissions)
    }

    /// `data_dir` if set, otherwise `~/.polysync`.
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(global_dir)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave.interval_sec.max(1))
    }

    pub fn latency(&self) -> LatencyRange {
        LatencyRange::from_millis(self.provider.min_latency_ms, self.provider.max_latency_ms)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions { replace_mode: self.editor.replace_mode }
    }
}

/// Periodic save cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AutosaveConfig {
    pub interval_sec: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { interval_sec: 10 }
    }
}

/// Built-in provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { min_latency_ms: 1000, max_latency_ms: 3000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    pub replace_mode: ReplaceMode,
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    fn permissions(error: anyhow::Error) -> Self {
        Self::Io(std::io::Error::other(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert!(cfg.data_dir.is_none());
        assert_eq!(cfg.autosave_interval(), Duration::from_secs(10));
        assert_eq!(cfg.latency(), LatencyRange::from_millis(1000, 3000));
        assert_eq!(cfg.editor.replace_mode, ReplaceMode::FirstOccurrence);
    }

    #[test]
    fn roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = EngineConfig {
            data_dir: Some(dir.path().join("data")),
            autosave: AutosaveConfig { interval_sec: 5 },
            provider: ProviderConfig { min_latency_ms: 0, max_latency_ms: 10 },
            editor: EditorConfig { replace_mode: ReplaceMode::SelectionOffsets },
        };
        cfg.save_to(&path).unwrap();
        assert_eq!(EngineConfig::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn parse_from_toml() {
        let toml_str = r#"
data_dir = "/tmp/polysync"

[autosave]
interval_sec = 30

[provider]
min_latency_ms = 0
max_latency_ms = 0

[editor]
replace_mode = "selection_offsets"
"#;
        let cfg: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.resolved_data_dir(), Some(PathBuf::from("/tmp/polysync")));
        assert_eq!(cfg.autosave_interval(), Duration::from_secs(30));
        assert_eq!(cfg.latency(), LatencyRange::ZERO);
        assert_eq!(cfg.session_options().replace_mode, ReplaceMode::SelectionOffsets);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg: EngineConfig = toml::from_str("[provider]\nmax_latency_ms = 500\n").unwrap();
        assert_eq!(cfg.provider.min_latency_ms, 1000);
        // Bounds are reordered rather than rejected.
        assert_eq!(cfg.latency(), LatencyRange::from_millis(500, 1000));
        assert_eq!(cfg.autosave.interval_sec, 10);
    }

    #[test]
    fn rejects_unknown_nested_keys() {
        let error = toml::from_str::<EngineConfig>("[autosave]\nevery = 3\n").unwrap_err();
        assert!(error.to_string().contains("unknown field `every`"));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let cfg: EngineConfig = toml::from_str("[autosave]\ninterval_sec = 0\n").unwrap();
        assert_eq!(cfg.autosave_interval(), Duration::from_secs(1));
    }

    #[test]
    fn load_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            EngineConfig::load_from(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
