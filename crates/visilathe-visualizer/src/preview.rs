//! Debounced preview recomputation.
//!
//! Every edit marks the preview stale right away; the recompute itself only
//! starts once edits stop for the debounce period, and then only for the
//! latest input.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use visilathe_core::{AppEvent, EventBus, PreviewEvent};

use crate::background::{BackgroundComputeTask, ComputeInput};
use crate::error::{VisualizerError, VisualizerResult};

struct Pending {
    latest: Option<ComputeInput>,
    deadline: Option<Instant>,
    shutdown: bool,
}

struct Inner {
    pending: Mutex<Pending>,
    changed: Condvar,
    /// Held from taking the latest input until its restart is issued, so a
    /// restart never lands after one for a newer edit. Taken before `pending`.
    scheduling: Mutex<()>,
}

/// Coalesces rapid edits into a single background restart.
pub struct PreviewScheduler {
    task: Arc<BackgroundComputeTask>,
    bus: Arc<EventBus>,
    debounce: Duration,
    inner: Arc<Inner>,
    timer: Option<JoinHandle<()>>,
}

impl PreviewScheduler {
    pub fn new(
        task: Arc<BackgroundComputeTask>,
        bus: Arc<EventBus>,
        debounce: Duration,
    ) -> VisualizerResult<Self> {
        let inner = Arc::new(Inner {
            pending: Mutex::new(Pending {
                latest: None,
                deadline: None,
                shutdown: false,
            }),
            changed: Condvar::new(),
            scheduling: Mutex::new(()),
        });

        let timer = {
            let inner = inner.clone();
            let task = task.clone();
            let bus = bus.clone();
            std::thread::Builder::new()
                .name("preview-debounce".into())
                .spawn(move || timer_loop(&inner, &task, &bus))
                .map_err(|source| VisualizerError::WorkerSpawn {
                    name: "preview-debounce",
                    source,
                })?
        };

        Ok(Self {
            task,
            bus,
            debounce,
            inner,
            timer: Some(timer),
        })
    }

    /// Record an edit.
    ///
    /// Publishes [`PreviewEvent::Invalidated`] before returning and re-arms
    /// the debounce deadline.
    pub fn notify_changed(&self, input: ComputeInput) {
        {
            let mut pending = self.inner.pending.lock();
            pending.latest = Some(input);
            pending.deadline = Some(Instant::now() + self.debounce);
        }
        self.inner.changed.notify_all();
        let _ = self.bus.publish(AppEvent::Preview(PreviewEvent::Invalidated));
    }

    /// Start the recompute for the latest edit now instead of waiting.
    ///
    /// Returns the issued generation, or `None` if nothing was pending.
    pub fn flush(&self) -> Option<u64> {
        let _scheduling = self.inner.scheduling.lock();
        let input = {
            let mut pending = self.inner.pending.lock();
            pending.deadline = None;
            pending.latest.take()
        }?;
        Some(schedule(&self.task, &self.bus, input))
    }

    /// Whether an edit is still waiting for its debounce period.
    pub fn has_pending(&self) -> bool {
        self.inner.pending.lock().latest.is_some()
    }

    pub fn task(&self) -> &Arc<BackgroundComputeTask> {
        &self.task
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl Drop for PreviewScheduler {
    fn drop(&mut self) {
        self.inner.pending.lock().shutdown = true;
        self.inner.changed.notify_all();
        if let Some(timer) = self.timer.take() {
            if timer.join().is_err() {
                tracing::warn!("preview-debounce thread panicked");
            }
        }
    }
}

fn schedule(task: &BackgroundComputeTask, bus: &EventBus, input: ComputeInput) -> u64 {
    let generation = task.restart_with_data(input);
    let _ = bus.publish(AppEvent::Preview(PreviewEvent::RecomputeScheduled {
        generation,
    }));
    generation
}

fn timer_loop(inner: &Inner, task: &BackgroundComputeTask, bus: &EventBus) {
    loop {
        if !wait_for_deadline(inner) {
            return;
        }
        let _scheduling = inner.scheduling.lock();
        let input = {
            let mut pending = inner.pending.lock();
            // A flush or a new edit may have got in between.
            match pending.deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    pending.deadline = None;
                    pending.latest.take()
                }
                _ => None,
            }
        };
        if let Some(input) = input {
            schedule(task, bus, input);
        }
    }
}

/// Block until the debounce deadline has passed. False on shutdown.
fn wait_for_deadline(inner: &Inner) -> bool {
    let mut pending = inner.pending.lock();
    loop {
        if pending.shutdown {
            return false;
        }
        let deadline = pending.deadline;
        match deadline {
            None => inner.changed.wait(&mut pending),
            Some(deadline) if Instant::now() >= deadline => return true,
            Some(deadline) => {
                // Deadline may move while waiting; re-check on wake.
                inner.changed.wait_until(&mut pending, deadline);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use visilathe_core::{EventCategory, EventFilter};

    fn setup(debounce: Duration) -> (PreviewScheduler, mpsc::Receiver<AppEvent>) {
        let bus = Arc::new(EventBus::new());
        let (_id, rx) = bus.subscribe_channel(EventFilter::Categories(vec![EventCategory::Preview]));
        let task = Arc::new(BackgroundComputeTask::new(bus.clone()).unwrap());
        (PreviewScheduler::new(task, bus, debounce).unwrap(), rx)
    }

    #[test]
    fn test_invalidated_is_immediate() {
        let (scheduler, rx) = setup(Duration::from_secs(60));
        scheduler.notify_changed(ComputeInput::default());
        assert_eq!(
            rx.try_recv().unwrap(),
            AppEvent::Preview(PreviewEvent::Invalidated)
        );
        assert!(scheduler.has_pending());
    }

    #[test]
    fn test_flush_starts_now() {
        let (scheduler, _rx) = setup(Duration::from_secs(60));
        assert_eq!(scheduler.flush(), None);
        scheduler.notify_changed(ComputeInput::default());
        let generation = scheduler.flush().unwrap();
        assert_eq!(scheduler.task().generation(), generation);
        assert!(!scheduler.has_pending());
    }
}
