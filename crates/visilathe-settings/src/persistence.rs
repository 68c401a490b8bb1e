//! Project files
//!
//! Projects are stored as strict JSON:
//!
//! ```json
//! {
//!   "formatVersion": "2026-10-16",
//!   "globalSettings": { ... },
//!   "toolpaths": [ { "strategy": "z_parallel", "shape": { ... }, "settings": { ... } } ]
//! }
//! ```
//!
//! The version is read from the raw document before the schema is applied,
//! so a file written by another format version fails with
//! [`SettingsError::VersionMismatch`] instead of a confusing field error.
//! Nothing is migrated.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use visilathe_camtools::{write_lines, GlobalSettings, PostprocessorRegistry, Toolpath};
use visilathe_core::{AppEvent, EventBus, ProjectEvent};

use crate::error::{SettingsError, SettingsResult};
use crate::project::Project;

/// Layout version written to and expected from project files.
pub const PROJECT_FORMAT_VERSION: &str = "2026-10-16";

/// On-disk representation of a [`Project`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectFile {
    pub format_version: String,
    pub global_settings: GlobalSettings,
    pub toolpaths: Vec<Toolpath>,
}

impl ProjectFile {
    pub fn from_project(project: &Project) -> Self {
        Self {
            format_version: PROJECT_FORMAT_VERSION.to_string(),
            global_settings: project.global().clone(),
            toolpaths: project.toolpaths().to_vec(),
        }
    }

    pub fn into_project(self) -> Project {
        Project::from_parts(self.global_settings, self.toolpaths)
    }

    /// Parse and validate a project document.
    pub fn from_json(content: &str) -> SettingsResult<Self> {
        let raw: serde_json::Value = serde_json::from_str(content)?;
        let found = raw
            .get("formatVersion")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SettingsError::LoadError("missing formatVersion".to_string()))?;
        if found != PROJECT_FORMAT_VERSION {
            return Err(SettingsError::VersionMismatch {
                expected: PROJECT_FORMAT_VERSION.to_string(),
                found: found.to_string(),
            });
        }

        let file: Self = serde_json::from_value(raw)?;
        file.validate()?;
        Ok(file)
    }

    /// Check the global settings and every toolpath's settings.
    pub fn validate(&self) -> SettingsResult<()> {
        self.global_settings.validate()?;
        for toolpath in &self.toolpaths {
            toolpath
                .settings
                .validate()
                .map_err(visilathe_camtools::CamToolError::from)?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> SettingsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read a project file.
pub fn load_project(path: &Path) -> SettingsResult<Project> {
    let content = std::fs::read_to_string(path)?;
    let project = ProjectFile::from_json(&content)?.into_project();
    tracing::info!(
        "Loaded project {} ({} toolpaths)",
        path.display(),
        project.toolpaths().len()
    );
    Ok(project)
}

/// Write a project file, optionally through a temporary file and rename.
///
/// A project that would not load back is rejected before anything is written.
pub fn save_project(project: &Project, path: &Path, atomic: bool) -> SettingsResult<()> {
    let file = ProjectFile::from_project(project);
    file.validate()?;
    let json = file.to_json()?;
    if atomic {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| SettingsError::SaveError(e.to_string()))?;
    } else {
        std::fs::write(path, json)?;
    }
    tracing::info!("Saved project {}", path.display());
    Ok(())
}

/// The currently open project and where it lives.
#[derive(Debug, Default)]
pub struct ProjectSession {
    project: Project,
    path: Option<PathBuf>,
    atomic: bool,
    bus: Option<Arc<EventBus>>,
}

impl ProjectSession {
    /// Untitled, empty project.
    pub fn new() -> Self {
        Self {
            atomic: true,
            ..Default::default()
        }
    }

    /// Publish load/save notifications on `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_atomic_save(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Discard the open project and start an empty one.
    pub fn new_project(&mut self) {
        self.project = Project::new();
        self.path = None;
    }

    /// Replace the open project with the file at `path`.
    ///
    /// On any error the open project is left untouched.
    pub fn open(&mut self, path: &Path) -> SettingsResult<()> {
        let project = load_project(path)?;
        self.project = project;
        self.path = Some(path.to_path_buf());
        self.publish(ProjectEvent::Loaded {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Save to the current path.
    pub fn save(&mut self) -> SettingsResult<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| SettingsError::SaveError("project has no file name".to_string()))?;
        self.save_as(&path)
    }

    pub fn save_as(&mut self, path: &Path) -> SettingsResult<()> {
        save_project(&self.project, path, self.atomic)?;
        self.path = Some(path.to_path_buf());
        self.publish(ProjectEvent::Saved {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Write the machine code program for the open project to `path`.
    ///
    /// Returns the number of lines written.
    pub fn export(
        &self,
        path: &Path,
        registry: &PostprocessorRegistry,
        postprocessor: Option<&str>,
    ) -> SettingsResult<usize> {
        let lines = self.project.program_lines(registry, postprocessor)?;
        write_lines(path, &lines, self.atomic)?;
        tracing::info!("Exported {} lines to {}", lines.len(), path.display());
        self.publish(ProjectEvent::Exported {
            path: path.to_path_buf(),
            lines: lines.len(),
        });
        Ok(lines.len())
    }

    fn publish(&self, event: ProjectEvent) {
        if let Some(bus) = &self.bus {
            let _ = bus.publish(AppEvent::Project(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_checked_before_schema() {
        let json = r#"{"formatVersion":"2013-12-27","something":"else"}"#;
        match ProjectFile::from_json(json) {
            Err(SettingsError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, PROJECT_FORMAT_VERSION);
                assert_eq!(found, "2013-12-27");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_version() {
        assert!(matches!(
            ProjectFile::from_json("{}"),
            Err(SettingsError::LoadError(_))
        ));
        assert!(matches!(
            ProjectFile::from_json("not json"),
            Err(SettingsError::JsonError(_))
        ));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let mut project = Project::new();
        project.add_toolpath();
        let mut value = serde_json::to_value(ProjectFile::from_project(&project)).unwrap();
        value["pickled"] = serde_json::Value::Bool(true);
        assert!(matches!(
            ProjectFile::from_json(&value.to_string()),
            Err(SettingsError::JsonError(_))
        ));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut project = Project::new();
        project.add_toolpath();
        project.toolpath_mut(0).unwrap().settings.cut_depth = -1.0;
        let json = ProjectFile::from_project(&project).to_json().unwrap();
        assert!(matches!(
            ProjectFile::from_json(&json),
            Err(SettingsError::CamTool(_))
        ));
    }

    #[test]
    fn test_layout_field_names() {
        let mut project = Project::new();
        project.add_toolpath();
        let json = ProjectFile::from_project(&project).to_json().unwrap();
        for key in [
            "\"formatVersion\"",
            "\"globalSettings\"",
            "\"toolpaths\"",
            "\"strategy\": \"z_parallel\"",
            "\"curveTolerance\"",
            "\"finalPassDepth\"",
        ] {
            assert!(json.contains(key), "missing {}", key);
        }
    }
}
