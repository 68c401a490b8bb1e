//! Project model
//!
//! A project is the global settings plus an ordered list of toolpaths. The
//! order is the machining order.

use visilathe_camtools::{
    export_lines, generate_all, CamToolResult, GlobalSettings, MoveSequence,
    PostprocessorRegistry, Toolpath,
};
use visilathe_core::CancelToken;

use crate::error::{SettingsError, SettingsResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Project {
    global: GlobalSettings,
    toolpaths: Vec<Toolpath>,
}

impl Project {
    /// Empty project with default global settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(global: GlobalSettings, toolpaths: Vec<Toolpath>) -> Self {
        Self { global, toolpaths }
    }

    pub fn global(&self) -> &GlobalSettings {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut GlobalSettings {
        &mut self.global
    }

    pub fn toolpaths(&self) -> &[Toolpath] {
        &self.toolpaths
    }

    pub fn toolpath(&self, index: usize) -> Option<&Toolpath> {
        self.toolpaths.get(index)
    }

    pub fn toolpath_mut(&mut self, index: usize) -> SettingsResult<&mut Toolpath> {
        let count = self.toolpaths.len();
        self.toolpaths
            .get_mut(index)
            .ok_or(SettingsError::NoSuchToolpath { index, count })
    }

    /// Append a toolpath with default settings and shape; returns its index.
    pub fn add_toolpath(&mut self) -> usize {
        self.push_toolpath(Toolpath::default())
    }

    pub fn push_toolpath(&mut self, toolpath: Toolpath) -> usize {
        self.toolpaths.push(toolpath);
        self.toolpaths.len() - 1
    }

    pub fn remove_toolpath(&mut self, index: usize) -> SettingsResult<Toolpath> {
        if index >= self.toolpaths.len() {
            return Err(SettingsError::NoSuchToolpath {
                index,
                count: self.toolpaths.len(),
            });
        }
        Ok(self.toolpaths.remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.toolpaths.is_empty()
    }

    /// Moves of every toolpath in order.
    pub fn generate(&self, cancel: &CancelToken) -> CamToolResult<MoveSequence> {
        generate_all(&self.toolpaths, &self.global, cancel)
    }

    /// Machine code for the whole project.
    ///
    /// `postprocessor` overrides the project's own postprocessor id.
    pub fn program_lines(
        &self,
        registry: &PostprocessorRegistry,
        postprocessor: Option<&str>,
    ) -> CamToolResult<Vec<String>> {
        let id = postprocessor.unwrap_or(&self.global.postprocessor_id);
        // Resolve the dialect before spending time on generation.
        registry.get_factory(id)?;
        let moves = self.generate(&CancelToken::never())?;
        export_lines(&moves, &self.global, registry, id)
    }
}
