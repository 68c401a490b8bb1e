//! Error types for the settings crate.
//!
//! This module provides structured error types for configuration management
//! and project persistence.

use std::io;
use thiserror::Error;
use visilathe_camtools::CamToolError;

/// Errors that can occur during settings and project operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A file could not be loaded.
    #[error("Failed to load: {0}")]
    LoadError(String),

    /// A file could not be saved.
    #[error("Failed to save: {0}")]
    SaveError(String),

    /// The project file was written by an incompatible format version.
    #[error("Project format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    /// A toolpath index does not exist.
    #[error("No toolpath at index {index} (project has {count})")]
    NoSuchToolpath { index: usize, count: usize },

    /// The configuration directory could not be found or created.
    #[error("Config directory error: {0}")]
    ConfigDirectory(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// A configuration validation error occurred.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Settings stored in a project failed validation.
    #[error(transparent)]
    CamTool(#[from] CamToolError),
}

/// Errors related to configuration validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The configuration file format is not supported.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value is out of valid range.
    #[error("Value out of range for '{key}': {value}")]
    ValueOutOfRange { key: String, value: String },

    /// The default postprocessor is not registered.
    #[error("Unknown postprocessor '{0}'")]
    UnknownPostprocessor(String),
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
