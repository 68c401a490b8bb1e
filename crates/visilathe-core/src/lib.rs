//! # VisiLathe Core
//!
//! Core types and utilities shared by the VisiLathe crates.
//! Provides the generation tokens used for cooperative cancellation of
//! background work, the application event bus and shared-state aliases.

pub mod event_bus;
pub mod generation;
pub mod types;

pub use generation::{CancelToken, GenerationCounter};

pub use event_bus::{
    AppEvent, ComputeEvent, EventBus, EventBusError, EventCategory, EventFilter, PreviewEvent,
    ProjectEvent, SimulationEvent, SubscriptionId,
};

pub use types::{thread_safe, ThreadSafe};
