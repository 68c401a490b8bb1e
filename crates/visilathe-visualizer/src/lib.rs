//! # VisiLathe Visualizer
//!
//! Off-thread preview computation and machining playback.
//! Includes the cancellable background task, the debounced preview
//! scheduler and the step-wise simulation of the machined stock.

pub mod background;
pub mod error;
pub mod preview;
pub mod simulation;

pub use background::{BackgroundComputeTask, ComputeInput, ComputeOutput, TaskState};
pub use error::{VisualizerError, VisualizerResult};
pub use preview::PreviewScheduler;
pub use simulation::{
    MachinedState, PlaybackClock, SimulationPlayback, StockProfile, DEFAULT_BIN_WIDTH,
    DEFAULT_TICKS_PER_SECOND, TICKS_PER_SECOND_RANGE,
};
