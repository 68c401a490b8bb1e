//! # VisiLathe
//!
//! Lathe CAM for rotational parts:
//! - Stock shapes sampled into boundary curves at a curve tolerance
//! - Z-parallel roughing and finishing passes with no-gouge clamping
//! - Machine code export through a registry of controller dialects
//! - Debounced background recomputation and step-wise machining playback
//!
//! ## Architecture
//!
//! VisiLathe is organized as a workspace with multiple crates:
//!
//! 1. **visilathe-core** - Generation tokens, cancellation, events
//! 2. **visilathe-camtools** - Shapes, settings, toolpath strategies, postprocessors
//! 3. **visilathe-settings** - Project model, project files, application config
//! 4. **visilathe-visualizer** - Background compute task, preview scheduling, simulation
//! 5. **visilathe** - Command line binary that integrates all crates

pub use visilathe_camtools as camtools;
pub use visilathe_settings as settings;
pub use visilathe_visualizer as visualizer;

pub use visilathe_core::{
    AppEvent, CancelToken, ComputeEvent, EventBus, EventCategory, EventFilter,
    GenerationCounter, PreviewEvent, ProjectEvent, SimulationEvent,
};

pub use visilathe_camtools::{
    CamToolError, ConeShape, CylinderShape, DomeShape, GlobalSettings, MachineMove, MoveSequence,
    Postprocessor, PostprocessorRegistry, ProfileShape, Shape, StockShape, Toolpath,
    ToolpathSettings, ZParallelToolpath,
};

pub use visilathe_settings::{AppConfig, Project, ProjectSession, SettingsError};

pub use visilathe_visualizer::{
    BackgroundComputeTask, ComputeInput, ComputeOutput, PreviewScheduler, SimulationPlayback,
    StockProfile,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Logs go to stderr so that program output on stdout stays clean.
/// `RUST_LOG` adds filter directives on top of the INFO default;
/// `VISILATHE_LOG_FORMAT=json` switches to one JSON object per line.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let json = std::env::var("VISILATHE_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_line_number(true),
            )
            .try_init()?;
    }

    Ok(())
}
