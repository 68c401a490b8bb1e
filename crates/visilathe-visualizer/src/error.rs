//! Error types for the visualizer crate.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisualizerError {
    /// A worker thread could not be started.
    #[error("Failed to spawn {name} thread: {source}")]
    WorkerSpawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    /// Playback rate outside the accepted ticks-per-second range.
    #[error("Invalid playback rate: {0} ticks/s")]
    InvalidRate(f64),
}

pub type VisualizerResult<T> = Result<T, VisualizerError>;
