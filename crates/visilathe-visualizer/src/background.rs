//! Cancellable background toolpath computation.
//!
//! One named worker thread turns the latest [`ComputeInput`] into a combined
//! [`MoveSequence`]. Each [`BackgroundComputeTask::restart_with_data`] call
//! issues a new generation; older computations keep running until they
//! notice at their next checkpoint, but their results are never published.
//!
//! The current-generation check and the write of the output happen under
//! the same lock that a restart takes to reset the output, so a published
//! result always belongs to the most recent restart at the moment it is
//! stored.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use visilathe_camtools::{generate_all, CamToolError, GlobalSettings, MoveSequence, Toolpath};
use visilathe_core::{AppEvent, CancelToken, ComputeEvent, EventBus, GenerationCounter};

use crate::error::{VisualizerError, VisualizerResult};

/// Snapshot of everything a recompute needs.
///
/// Handed over by value; the worker never sees later edits.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComputeInput {
    pub global: GlobalSettings,
    pub toolpaths: Vec<Toolpath>,
}

/// Result visible to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeOutput {
    /// Moves of the most recent, still current computation.
    Ready { generation: u64, moves: MoveSequence },
    /// Nothing current: never computed, restarted, superseded or failed.
    NoResult,
}

impl ComputeOutput {
    pub fn moves(&self) -> Option<&MoveSequence> {
        match self {
            ComputeOutput::Ready { moves, .. } => Some(moves),
            ComputeOutput::NoResult => None,
        }
    }
}

/// Lifecycle of the most recent generation.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Idle,
    Computing,
    Completed,
    /// Cancelled with no replacement.
    Superseded,
    /// Generation or validation failed.
    Failed(String),
}

struct Shared {
    pending: Option<(CancelToken, ComputeInput)>,
    busy: bool,
    output: ComputeOutput,
    state: TaskState,
    shutdown: bool,
}

struct Inner {
    shared: Mutex<Shared>,
    changed: Condvar,
}

/// Single-worker recomputation wrapper.
pub struct BackgroundComputeTask {
    counter: GenerationCounter,
    inner: Arc<Inner>,
    bus: Arc<EventBus>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundComputeTask {
    /// Start the worker. Lifecycle events are published on `bus`.
    pub fn new(bus: Arc<EventBus>) -> VisualizerResult<Self> {
        let counter = GenerationCounter::new();
        let inner = Arc::new(Inner {
            shared: Mutex::new(Shared {
                pending: None,
                busy: false,
                output: ComputeOutput::NoResult,
                state: TaskState::Idle,
                shutdown: false,
            }),
            changed: Condvar::new(),
        });

        let worker = {
            let counter = counter.clone();
            let inner = inner.clone();
            let bus = bus.clone();
            std::thread::Builder::new()
                .name("toolpath-compute".into())
                .spawn(move || worker_loop(&counter, &inner, &bus))
                .map_err(|source| VisualizerError::WorkerSpawn {
                    name: "toolpath-compute",
                    source,
                })?
        };

        Ok(Self {
            counter,
            inner,
            bus,
            worker: Some(worker),
        })
    }

    /// Replace whatever is being computed with a computation of `input`.
    ///
    /// Returns the generation issued for it. Never blocks on the worker.
    pub fn restart_with_data(&self, input: ComputeInput) -> u64 {
        let (generation, dropped) = {
            // Advancing under the lock keeps `pending` at the newest generation
            // when restarts race.
            let mut shared = self.inner.shared.lock();
            let token = self.counter.advance();
            let generation = token.generation();
            let dropped = shared.pending.replace((token, input)).map(|(t, _)| t.generation());
            shared.output = ComputeOutput::NoResult;
            shared.state = TaskState::Computing;
            (generation, dropped)
        };
        self.inner.changed.notify_all();
        tracing::debug!("Restart with generation {}", generation);

        if let Some(old) = dropped {
            self.publish(ComputeEvent::Superseded { generation: old });
        }
        generation
    }

    /// Cancel pending and in-flight work without starting anything new.
    ///
    /// A result that already completed stays available.
    pub fn cancel(&self) {
        let (cancelled, dropped) = {
            let mut shared = self.inner.shared.lock();
            let cancelled = self.counter.advance().generation();
            let dropped = shared.pending.take().map(|(t, _)| t.generation());
            if shared.state == TaskState::Computing {
                shared.state = TaskState::Superseded;
            }
            (cancelled, dropped)
        };
        self.inner.changed.notify_all();
        tracing::debug!("Cancelled up to generation {}", cancelled);
        if let Some(old) = dropped {
            self.publish(ComputeEvent::Superseded { generation: old });
        }
    }

    /// Latest published output.
    pub fn output(&self) -> ComputeOutput {
        self.inner.shared.lock().output.clone()
    }

    pub fn state(&self) -> TaskState {
        self.inner.shared.lock().state.clone()
    }

    /// Most recently issued generation.
    pub fn generation(&self) -> u64 {
        self.counter.current()
    }

    /// Block until nothing is pending or running, or `timeout` elapses.
    ///
    /// Returns false on timeout. Intended for tests and batch callers, not
    /// for the interactive thread.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut shared = self.inner.shared.lock();
        while shared.busy || shared.pending.is_some() {
            if self
                .inner
                .changed
                .wait_until(&mut shared, deadline)
                .timed_out()
            {
                return !(shared.busy || shared.pending.is_some());
            }
        }
        true
    }

    fn publish(&self, event: ComputeEvent) {
        let _ = self.bus.publish(AppEvent::Compute(event));
    }
}

impl Drop for BackgroundComputeTask {
    fn drop(&mut self) {
        self.counter.advance();
        self.inner.shared.lock().shutdown = true;
        self.inner.changed.notify_all();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("toolpath-compute worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for BackgroundComputeTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundComputeTask")
            .field("generation", &self.counter.current())
            .field("state", &self.state())
            .finish()
    }
}

fn worker_loop(counter: &GenerationCounter, inner: &Inner, bus: &EventBus) {
    let publish = |event: ComputeEvent| {
        let _ = bus.publish(AppEvent::Compute(event));
    };

    loop {
        let (token, input) = {
            let mut shared = inner.shared.lock();
            loop {
                if shared.shutdown {
                    return;
                }
                if let Some(job) = shared.pending.take() {
                    shared.busy = true;
                    break job;
                }
                inner.changed.wait(&mut shared);
            }
        };
        let generation = token.generation();

        let result = if token.is_cancelled() {
            Err(CamToolError::Superseded)
        } else {
            publish(ComputeEvent::Started { generation });
            generate_all(&input.toolpaths, &input.global, &token)
        };

        let event = {
            let mut shared = inner.shared.lock();
            shared.busy = false;
            let current = counter.is_current(generation);
            let event = match result {
                Ok(moves) if current => {
                    let count = moves.len();
                    shared.output = ComputeOutput::Ready { generation, moves };
                    shared.state = TaskState::Completed;
                    ComputeEvent::Completed {
                        generation,
                        moves: count,
                    }
                }
                Err(e) if current && !e.is_superseded() => {
                    shared.output = ComputeOutput::NoResult;
                    shared.state = TaskState::Failed(e.to_string());
                    ComputeEvent::Failed {
                        generation,
                        error: e.to_string(),
                    }
                }
                _ => ComputeEvent::Superseded { generation },
            };
            inner.changed.notify_all();
            event
        };

        match &event {
            ComputeEvent::Completed { moves, .. } => {
                tracing::debug!("Generation {} completed with {} moves", generation, moves)
            }
            ComputeEvent::Failed { error, .. } => {
                tracing::warn!("Generation {} failed: {}", generation, error)
            }
            _ => tracing::debug!("Generation {} superseded", generation),
        }
        publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visilathe_camtools::{CylinderShape, ToolpathSettings};

    fn input(diameter: f64) -> ComputeInput {
        ComputeInput {
            global: GlobalSettings {
                material_diameter: diameter + 10.0,
                ..Default::default()
            },
            toolpaths: vec![Toolpath::new(
                CylinderShape::new(diameter, 40.0, 0.0),
                ToolpathSettings::default(),
            )],
        }
    }

    #[test]
    fn test_initial_state() {
        let task = BackgroundComputeTask::new(Arc::new(EventBus::new())).unwrap();
        assert_eq!(task.state(), TaskState::Idle);
        assert_eq!(task.output(), ComputeOutput::NoResult);
        assert!(task.wait_idle(Duration::from_millis(10)));
    }

    #[test]
    fn test_completes() {
        let task = BackgroundComputeTask::new(Arc::new(EventBus::new())).unwrap();
        let generation = task.restart_with_data(input(20.0));
        assert!(task.wait_idle(Duration::from_secs(5)));
        assert_eq!(task.state(), TaskState::Completed);
        match task.output() {
            ComputeOutput::Ready {
                generation: g,
                moves,
            } => {
                assert_eq!(g, generation);
                assert!(!moves.is_empty());
            }
            ComputeOutput::NoResult => panic!("expected a result"),
        }
    }

    #[test]
    fn test_failure_is_reported() {
        let task = BackgroundComputeTask::new(Arc::new(EventBus::new())).unwrap();
        let mut bad = input(20.0);
        bad.toolpaths[0].settings.cut_depth = 0.0;
        task.restart_with_data(bad);
        assert!(task.wait_idle(Duration::from_secs(5)));
        assert!(matches!(task.state(), TaskState::Failed(_)));
        assert_eq!(task.output(), ComputeOutput::NoResult);
    }

    #[test]
    fn test_cancel_without_replacement() {
        let task = BackgroundComputeTask::new(Arc::new(EventBus::new())).unwrap();
        task.restart_with_data(input(20.0));
        task.cancel();
        assert!(task.wait_idle(Duration::from_secs(5)));
        match task.state() {
            TaskState::Superseded => assert_eq!(task.output(), ComputeOutput::NoResult),
            TaskState::Completed => assert!(task.output().moves().is_some()),
            other => panic!("unexpected state {:?}", other),
        }
    }
}
