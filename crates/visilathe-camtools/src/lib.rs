//! # VisiLathe CAM Tools
//!
//! Turning toolpath generation for rotational parts.
//!
//! - [`shape`]: boundary curves of the finished part
//! - [`settings`]: global and per-toolpath machining parameters
//! - [`z_parallel`]: axial roughing and finishing passes
//! - [`post`]: controller dialects and their registry
//! - [`export`]: writing machine code programs

pub mod error;
pub mod export;
pub mod moves;
pub mod post;
pub mod settings;
pub mod shape;
pub mod toolpath;
pub mod z_parallel;

pub use error::{CamToolError, CamToolResult, ParameterError, ParameterResult};
pub use export::{export_lines, write_lines};
pub use moves::{MachineMove, MachinePoint, MoveKind, MoveSequence};
pub use post::{ModalState, Postprocessor, PostprocessorEntry, PostprocessorFactory, PostprocessorRegistry};
pub use settings::{
    FeedMode, FeedRate, FinishingPolicy, GlobalSettings, SpeedMode, SpindleSpeed, ToolpathSettings,
    MIN_FEED_VALUE,
};
pub use shape::{
    BoundaryPoint, ConeShape, CylinderShape, DomeShape, ProfileShape, Shape, StockShape,
};
pub use toolpath::{generate_all, StrategyKind, Toolpath, ToolpathStrategy};
pub use z_parallel::{PassLevel, PassPlan, ZParallelToolpath};
