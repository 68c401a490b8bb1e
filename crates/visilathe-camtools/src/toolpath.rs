//! Toolpaths and the strategies that turn them into moves.

use serde::{Deserialize, Serialize};
use visilathe_core::CancelToken;

use crate::error::{CamToolError, CamToolResult};
use crate::moves::MoveSequence;
use crate::settings::{GlobalSettings, ToolpathSettings};
use crate::shape::{Shape, StockShape};
use crate::z_parallel::ZParallelToolpath;

/// A machining strategy.
pub trait ToolpathStrategy: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Produce the full move list for one toolpath.
    ///
    /// Settings are validated before any move is produced. `cancel` is
    /// polled between passes; once it reports cancellation the call returns
    /// [`CamToolError::Superseded`].
    fn generate(
        &self,
        shape: &dyn Shape,
        settings: &ToolpathSettings,
        global: &GlobalSettings,
        cancel: &CancelToken,
    ) -> CamToolResult<MoveSequence>;
}

/// Persistable strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    ZParallel,
}

impl StrategyKind {
    pub fn strategy(&self) -> &'static dyn ToolpathStrategy {
        match self {
            StrategyKind::ZParallel => &ZParallelToolpath,
        }
    }
}

/// A shape paired with the settings used to machine it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Toolpath {
    #[serde(default)]
    pub strategy: StrategyKind,
    pub shape: StockShape,
    pub settings: ToolpathSettings,
}

impl Toolpath {
    pub fn new(shape: impl Into<StockShape>, settings: ToolpathSettings) -> Self {
        Self {
            strategy: StrategyKind::ZParallel,
            shape: shape.into(),
            settings,
        }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Generate without cancellation.
    pub fn generate(&self, global: &GlobalSettings) -> CamToolResult<MoveSequence> {
        self.generate_with_cancel(global, &CancelToken::never())
    }

    pub fn generate_with_cancel(
        &self,
        global: &GlobalSettings,
        cancel: &CancelToken,
    ) -> CamToolResult<MoveSequence> {
        self.strategy
            .strategy()
            .generate(&self.shape, &self.settings, global, cancel)
    }
}

/// Generate every toolpath in order and concatenate the results.
///
/// The first failing toolpath aborts the whole run.
pub fn generate_all(
    toolpaths: &[Toolpath],
    global: &GlobalSettings,
    cancel: &CancelToken,
) -> CamToolResult<MoveSequence> {
    let mut parts = Vec::with_capacity(toolpaths.len());
    for toolpath in toolpaths {
        if cancel.is_cancelled() {
            return Err(CamToolError::Superseded);
        }
        let moves = toolpath.generate_with_cancel(global, cancel)?;
        tracing::debug!("Toolpath '{}': {} moves", toolpath.name(), moves.len());
        parts.push(moves);
    }
    Ok(MoveSequence::concat(&parts))
}
