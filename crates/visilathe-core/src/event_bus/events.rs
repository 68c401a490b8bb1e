//! Event type definitions for the event bus.
//!
//! Events are cloneable and serializable so they can be logged or replayed.
//! Move sequences themselves never travel through the bus; completion events
//! only announce which generation finished and the consumer fetches the
//! result from the task that owns it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root event enum for all application events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Preview invalidation and recompute scheduling
    Preview(PreviewEvent),
    /// Background toolpath computation lifecycle
    Compute(ComputeEvent),
    /// Simulation playback progress
    Simulation(SimulationEvent),
    /// Project load/save and machine code export
    Project(ProjectEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Preview(_) => EventCategory::Preview,
            AppEvent::Compute(_) => EventCategory::Compute,
            AppEvent::Simulation(_) => EventCategory::Simulation,
            AppEvent::Project(_) => EventCategory::Project,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Preview(e) => e.description(),
            AppEvent::Compute(e) => e.description(),
            AppEvent::Simulation(e) => e.description(),
            AppEvent::Project(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Preview events.
    Preview,
    /// Background computation events.
    Compute,
    /// Simulation playback events.
    Simulation,
    /// Project file events.
    Project,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Preview => write!(f, "Preview"),
            EventCategory::Compute => write!(f, "Compute"),
            EventCategory::Simulation => write!(f, "Simulation"),
            EventCategory::Project => write!(f, "Project"),
        }
    }
}

/// Preview-related events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PreviewEvent {
    /// Settings changed; the displayed preview no longer matches them.
    /// Emitted synchronously on every edit.
    Invalidated,
    /// The debounce delay elapsed and a recompute was handed to the worker.
    RecomputeScheduled {
        /// Generation issued for the recompute.
        generation: u64,
    },
}

impl PreviewEvent {
    fn description(&self) -> String {
        match self {
            PreviewEvent::Invalidated => "Preview invalidated".to_string(),
            PreviewEvent::RecomputeScheduled { generation } => {
                format!("Recompute scheduled (generation {})", generation)
            }
        }
    }
}

/// Background computation events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComputeEvent {
    /// The worker picked up a generation.
    Started {
        /// Generation being computed.
        generation: u64,
    },
    /// A still-current generation finished; its output is available.
    Completed {
        /// Generation that completed.
        generation: u64,
        /// Number of moves in the published sequence.
        moves: usize,
    },
    /// A generation was dropped because a newer one was requested.
    Superseded {
        /// Generation that was dropped.
        generation: u64,
    },
    /// A still-current generation failed validation or generation.
    Failed {
        /// Generation that failed.
        generation: u64,
        /// Error message.
        error: String,
    },
}

impl ComputeEvent {
    fn description(&self) -> String {
        match self {
            ComputeEvent::Started { generation } => {
                format!("Computation {} started", generation)
            }
            ComputeEvent::Completed { generation, moves } => {
                format!("Computation {} completed: {} moves", generation, moves)
            }
            ComputeEvent::Superseded { generation } => {
                format!("Computation {} superseded", generation)
            }
            ComputeEvent::Failed { generation, error } => {
                format!("Computation {} failed: {}", generation, error)
            }
        }
    }
}

/// Simulation playback events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    /// The cursor advanced by one tick.
    Advanced {
        /// New cursor position.
        step: usize,
        /// Total number of moves.
        total: usize,
    },
    /// Playback reached the end or was paused.
    Stopped {
        /// Cursor position when stopping.
        step: usize,
    },
}

impl SimulationEvent {
    fn description(&self) -> String {
        match self {
            SimulationEvent::Advanced { step, total } => format!("Simulation {}/{}", step, total),
            SimulationEvent::Stopped { step } => format!("Simulation stopped at {}", step),
        }
    }
}

/// Project file events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectEvent {
    /// A project was loaded and replaced the open one.
    Loaded {
        /// Path the project was loaded from.
        path: PathBuf,
    },
    /// The project was written to disk.
    Saved {
        /// Path the project was written to.
        path: PathBuf,
    },
    /// Machine code was exported.
    Exported {
        /// Output file.
        path: PathBuf,
        /// Number of lines written.
        lines: usize,
    },
}

impl ProjectEvent {
    fn description(&self) -> String {
        match self {
            ProjectEvent::Loaded { path } => format!("Loaded: {}", path.display()),
            ProjectEvent::Saved { path } => format!("Saved: {}", path.display()),
            ProjectEvent::Exported { path, lines } => {
                format!("Exported {} lines to {}", lines, path.display())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            AppEvent::Preview(PreviewEvent::Invalidated).category(),
            EventCategory::Preview
        );
        assert_eq!(
            AppEvent::Compute(ComputeEvent::Started { generation: 1 }).category(),
            EventCategory::Compute
        );
        assert_eq!(
            AppEvent::Simulation(SimulationEvent::Stopped { step: 0 }).category(),
            EventCategory::Simulation
        );
    }

    #[test]
    fn test_descriptions() {
        let event = AppEvent::Compute(ComputeEvent::Completed {
            generation: 3,
            moves: 42,
        });
        assert_eq!(event.description(), "Computation 3 completed: 42 moves");

        let event = AppEvent::Simulation(SimulationEvent::Advanced { step: 5, total: 10 });
        assert_eq!(event.description(), "Simulation 5/10");
        assert_eq!(EventCategory::Project.to_string(), "Project");
    }
}
