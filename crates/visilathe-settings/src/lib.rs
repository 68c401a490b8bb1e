//! VisiLathe Settings Crate
//!
//! Project model, versioned project files and application configuration.

pub mod config;
pub mod error;
pub mod persistence;
pub mod project;

pub use config::{AppConfig, ExportConfig, PreviewConfig, SimulationConfig};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
pub use persistence::{load_project, save_project, ProjectFile, ProjectSession, PROJECT_FORMAT_VERSION};
pub use project::Project;
