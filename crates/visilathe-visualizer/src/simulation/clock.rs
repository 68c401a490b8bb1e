//! Timer thread that drives a shared playback.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;

use visilathe_core::{AppEvent, EventBus, SimulationEvent, ThreadSafe};

use super::playback::SimulationPlayback;
use crate::error::{VisualizerError, VisualizerResult};

struct Stop {
    requested: Mutex<bool>,
    wake: Condvar,
}

/// Ticks a [`SimulationPlayback`] at its configured rate.
///
/// The clock keeps running while playback is paused and simply does not
/// advance; rate changes take effect on the next tick.
pub struct PlaybackClock {
    playback: ThreadSafe<SimulationPlayback>,
    stop: Arc<Stop>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackClock {
    pub fn new(
        playback: ThreadSafe<SimulationPlayback>,
        bus: Arc<EventBus>,
    ) -> VisualizerResult<Self> {
        let stop = Arc::new(Stop {
            requested: Mutex::new(false),
            wake: Condvar::new(),
        });

        let thread = {
            let playback = playback.clone();
            let stop = stop.clone();
            std::thread::Builder::new()
                .name("playback-clock".into())
                .spawn(move || clock_loop(&playback, &stop, &bus))
                .map_err(|source| VisualizerError::WorkerSpawn {
                    name: "playback-clock",
                    source,
                })?
        };

        Ok(Self {
            playback,
            stop,
            thread: Some(thread),
        })
    }

    pub fn playback(&self) -> &ThreadSafe<SimulationPlayback> {
        &self.playback
    }
}

impl Drop for PlaybackClock {
    fn drop(&mut self) {
        *self.stop.requested.lock() = true;
        self.stop.wake.notify_all();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("playback-clock thread panicked");
            }
        }
    }
}

fn clock_loop(playback: &Mutex<SimulationPlayback>, stop: &Stop, bus: &EventBus) {
    loop {
        let interval = playback.lock().interval();
        {
            let mut requested = stop.requested.lock();
            if !*requested {
                stop.wake.wait_for(&mut requested, interval);
            }
            if *requested {
                return;
            }
        }

        let events = {
            let mut playback = playback.lock();
            match playback.tick() {
                Some(step) => {
                    let total = playback.total();
                    let mut events = vec![SimulationEvent::Advanced { step, total }];
                    if !playback.is_playing() {
                        events.push(SimulationEvent::Stopped { step });
                    }
                    events
                }
                None => Vec::new(),
            }
        };
        for event in events {
            let _ = bus.publish(AppEvent::Simulation(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::StockProfile;
    use std::time::Duration;
    use visilathe_camtools::{CylinderShape, GlobalSettings, Toolpath, ToolpathSettings};
    use visilathe_core::{CancelToken, EventCategory, EventFilter};

    #[test]
    fn test_clock_plays_to_end() {
        let global = GlobalSettings {
            material_diameter: 22.0,
            ..Default::default()
        };
        let toolpaths = vec![Toolpath::new(
            CylinderShape::new(20.0, 10.0, 0.0),
            ToolpathSettings::default(),
        )];
        let moves = visilathe_camtools::generate_all(&toolpaths, &global, &CancelToken::never())
            .unwrap();
        let total = moves.len();
        let stock = StockProfile::for_toolpaths(&global, &toolpaths).unwrap();

        let mut playback = SimulationPlayback::new(moves, stock);
        playback.set_rate(1000.0).unwrap();
        playback.play();
        let playback = visilathe_core::thread_safe(playback);

        let bus = Arc::new(EventBus::new());
        let (_id, rx) =
            bus.subscribe_channel(EventFilter::Categories(vec![EventCategory::Simulation]));
        let _clock = PlaybackClock::new(playback.clone(), bus).unwrap();

        let mut last = 0;
        loop {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                AppEvent::Simulation(SimulationEvent::Advanced { step, total: t }) => {
                    assert_eq!(step, last + 1);
                    assert_eq!(t, total);
                    last = step;
                }
                AppEvent::Simulation(SimulationEvent::Stopped { step }) => {
                    assert_eq!(step, total);
                    break;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert!(!playback.lock().is_playing());
    }
}
