//! # Event Bus Module
//!
//! Decoupled notification between the engine and the interactive session:
//! the preview scheduler, the background compute worker and the playback
//! clock publish here, the session subscribes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use visilathe_core::event_bus::{AppEvent, ComputeEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = Arc::new(EventBus::new());
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Compute]),
//!     |event| {
//!         if let AppEvent::Compute(ComputeEvent::Completed { generation, .. }) = event {
//!             tracing::info!("generation {} ready", generation);
//!         }
//!     },
//! );
//! let task = BackgroundComputeTask::new(bus.clone())?;
//!
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
