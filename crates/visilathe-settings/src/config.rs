//! Application configuration
//!
//! Settings that belong to the installation rather than to a project:
//! preview debounce, simulation pace and export defaults. Stored as JSON or
//! TOML in the platform configuration directory.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use visilathe_camtools::PostprocessorRegistry;

use crate::error::{ConfigError, SettingsError, SettingsResult};

/// Directory name under the platform config directory.
pub const APP_DIR: &str = "visilathe";

/// Preview recompute settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Quiet period after the last edit before the preview is recomputed.
    pub debounce_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { debounce_ms: 1000 }
    }
}

/// Simulation playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub ticks_per_second: f64,
}

impl SimulationConfig {
    /// Accepted `ticks_per_second`; matches what playback itself accepts.
    pub const TICKS_PER_SECOND_RANGE: RangeInclusive<f64> = 0.01..=10_000.0;
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 10.0,
        }
    }
}

/// Machine code export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Postprocessor for new projects.
    pub default_postprocessor: String,
    /// Write through a temporary file and rename.
    pub atomic_write: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_postprocessor: "nccad8".to_string(),
            atomic_write: true,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub preview: PreviewConfig,
    pub simulation: SimulationConfig,
    pub export: ExportConfig,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location.
    pub fn default_path() -> SettingsResult<PathBuf> {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| SettingsError::ConfigDirectory("no config or home directory".to_string()))?;
        Ok(base.join(APP_DIR).join("config.toml"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise defaults.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preview.debounce_ms == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "preview.debounce_ms".to_string(),
                value: "0".to_string(),
            });
        }

        let rate = self.simulation.ticks_per_second;
        if !SimulationConfig::TICKS_PER_SECOND_RANGE.contains(&rate) {
            return Err(ConfigError::ValueOutOfRange {
                key: "simulation.ticks_per_second".to_string(),
                value: rate.to_string(),
            });
        }

        let id = &self.export.default_postprocessor;
        let known = PostprocessorRegistry::builtin()
            .map(|registry| registry.contains(id))
            .unwrap_or(false);
        if !known {
            return Err(ConfigError::UnknownPostprocessor(id.clone()));
        }

        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.preview.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::new();
        assert_eq!(config.debounce(), Duration::from_millis(1000));
        assert_eq!(config.simulation.ticks_per_second, 10.0);
        assert_eq!(config.export.default_postprocessor, "nccad8");
        assert!(config.export.atomic_write);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::new();
        config.preview.debounce_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::new();
        config.simulation.ticks_per_second = 0.0;
        assert!(config.validate().is_err());
        config.simulation.ticks_per_second = 1e-300;
        assert!(config.validate().is_err());
        config.simulation.ticks_per_second = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = AppConfig::new();
        config.export.default_postprocessor = "mach3".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownPostprocessor("mach3".to_string()))
        );
    }

    #[test]
    fn test_round_trip_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::new();
        config.preview.debounce_ms = 250;
        config.export.default_postprocessor = "fanuc".to_string();

        for name in ["config.toml", "config.json"] {
            let path = dir.path().join(name);
            config.save_to_file(&path).unwrap();
            assert_eq!(AppConfig::load_from_file(&path).unwrap(), config);
        }
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[simulation]\nticks_per_second = 25.0\n").unwrap();
        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.simulation.ticks_per_second, 25.0);
        assert_eq!(config.preview.debounce_ms, 1000);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        assert!(matches!(
            AppConfig::new().save_to_file(&path),
            Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
