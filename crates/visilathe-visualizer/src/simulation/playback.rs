//! Steppable playback over a completed move list.

use std::ops::RangeInclusive;
use std::time::Duration;
use visilathe_camtools::{MachinePoint, MoveSequence};

use super::stock::StockProfile;
use crate::error::{VisualizerError, VisualizerResult};

/// Default playback rate.
pub const DEFAULT_TICKS_PER_SECOND: f64 = 10.0;

/// Playback rates accepted by [`SimulationPlayback::set_rate`].
pub const TICKS_PER_SECOND_RANGE: RangeInclusive<f64> = 0.01..=10_000.0;

/// Workpiece after the first `step` moves have run.
#[derive(Debug, Clone, PartialEq)]
pub struct MachinedState {
    pub step: usize,
    /// Target of the last applied move, `None` before the first move.
    pub tool_position: Option<MachinePoint>,
    pub profile: StockProfile,
}

/// Cursor `k` in `[0, N]` over `N` moves.
///
/// Moving forward applies only the new moves; moving backward rebuilds the
/// profile from the raw stock. Both give the same state for the same `k`.
#[derive(Debug, Clone)]
pub struct SimulationPlayback {
    moves: MoveSequence,
    stock: StockProfile,
    state: MachinedState,
    playing: bool,
    ticks_per_second: f64,
}

impl SimulationPlayback {
    /// Playback positioned at the end with nothing playing.
    pub fn new(moves: MoveSequence, stock: StockProfile) -> Self {
        let mut playback = Self {
            state: MachinedState {
                step: 0,
                tool_position: None,
                profile: stock.clone(),
            },
            moves,
            stock,
            playing: false,
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
        };
        playback.reset();
        playback
    }

    /// Swap in a freshly computed move list. Stops and jumps to the end.
    pub fn set_moves(&mut self, moves: MoveSequence, stock: StockProfile) {
        self.moves = moves;
        self.stock = stock;
        self.state = MachinedState {
            step: 0,
            tool_position: None,
            profile: self.stock.clone(),
        };
        self.reset();
    }

    pub fn total(&self) -> usize {
        self.moves.len()
    }

    pub fn step(&self) -> usize {
        self.state.step
    }

    pub fn state(&self) -> &MachinedState {
        &self.state
    }

    pub fn moves(&self) -> &MoveSequence {
        &self.moves
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Move the cursor to `step`, clamped to the move count.
    pub fn set_step(&mut self, step: usize) -> &MachinedState {
        let step = step.min(self.moves.len());
        if step < self.state.step {
            self.state.profile = self.stock.clone();
            self.apply(0, step);
        } else {
            self.apply(self.state.step, step);
        }
        self.state.step = step;
        self.state.tool_position = step.checked_sub(1).map(|i| self.moves[i].target);
        &self.state
    }

    fn apply(&mut self, from: usize, to: usize) {
        for i in from..to {
            let mv = &self.moves[i];
            if !mv.is_cut() {
                continue;
            }
            let start = i
                .checked_sub(1)
                .map(|prev| self.moves[prev].target)
                .unwrap_or(mv.target);
            self.state.profile.apply_cut(start, mv.target);
        }
    }

    /// Start playing. Rewinds to the beginning first when at the end.
    pub fn play(&mut self) {
        if self.moves.is_empty() {
            return;
        }
        if self.state.step >= self.moves.len() {
            self.set_step(0);
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Advance one move if playing.
    ///
    /// Returns the new step, or `None` when nothing advanced. Reaching the
    /// last move stops playback.
    pub fn tick(&mut self) -> Option<usize> {
        if !self.playing {
            return None;
        }
        if self.state.step >= self.moves.len() {
            self.playing = false;
            return None;
        }
        let step = self.set_step(self.state.step + 1).step;
        if step >= self.moves.len() {
            self.playing = false;
        }
        Some(step)
    }

    /// Stop and show the finished part.
    pub fn reset(&mut self) {
        self.playing = false;
        self.set_step(self.moves.len());
    }

    pub fn set_rate(&mut self, ticks_per_second: f64) -> VisualizerResult<()> {
        if !TICKS_PER_SECOND_RANGE.contains(&ticks_per_second) {
            return Err(VisualizerError::InvalidRate(ticks_per_second));
        }
        self.ticks_per_second = ticks_per_second;
        Ok(())
    }

    pub fn rate(&self) -> f64 {
        self.ticks_per_second
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.ticks_per_second).unwrap_or(Duration::MAX)
    }

    /// Cursor position as shown next to the step slider.
    pub fn progress_label(&self) -> String {
        format!("{}/{}", self.state.step, self.moves.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visilathe_camtools::{MachineMove, MoveKind, ToolpathSettings};

    fn playback() -> SimulationPlayback {
        let settings = ToolpathSettings::default();
        let m = |kind, z, r| MachineMove {
            kind,
            target: MachinePoint::new(z, r),
            feed: settings.feed(),
            speed: settings.speed(),
            tool: settings.tool,
        };
        let moves = MoveSequence::new(vec![
            m(MoveKind::Rapid, 12.0, 17.0),
            m(MoveKind::Rapid, 12.0, 14.0),
            m(MoveKind::Cut, 0.0, 14.0),
            m(MoveKind::Rapid, 0.0, 17.0),
        ]);
        SimulationPlayback::new(moves, StockProfile::new(0.0, 10.0, 15.0, 0.5))
    }

    #[test]
    fn test_starts_at_end() {
        let pb = playback();
        assert_eq!(pb.step(), 4);
        assert!(!pb.is_playing());
        assert_eq!(pb.progress_label(), "4/4");
        assert_eq!(pb.state().profile.radius_at(5.0), Some(14.0));
    }

    #[test]
    fn test_set_step_clamps() {
        let mut pb = playback();
        assert_eq!(pb.set_step(99).step, 4);
        let state = pb.set_step(0);
        assert_eq!(state.tool_position, None);
        assert_eq!(state.profile.radius_at(5.0), Some(15.0));
        assert_eq!(pb.set_step(2).tool_position, Some(MachinePoint::new(12.0, 14.0)));
    }

    #[test]
    fn test_play_rewinds_and_stops_at_end() {
        let mut pb = playback();
        pb.play();
        assert!(pb.is_playing());
        assert_eq!(pb.step(), 0);
        let steps: Vec<_> = std::iter::from_fn(|| pb.tick()).collect();
        assert_eq!(steps, vec![1, 2, 3, 4]);
        assert!(!pb.is_playing());
        assert_eq!(pb.tick(), None);
    }

    #[test]
    fn test_toggle_and_reset() {
        let mut pb = playback();
        pb.toggle();
        pb.tick();
        pb.toggle();
        assert!(!pb.is_playing());
        assert_eq!(pb.tick(), None);
        assert_eq!(pb.step(), 1);
        pb.reset();
        assert_eq!(pb.step(), 4);
        assert!(!pb.is_playing());
    }

    #[test]
    fn test_rate() {
        let mut pb = playback();
        assert_eq!(pb.interval(), Duration::from_millis(100));
        pb.set_rate(4.0).unwrap();
        assert_eq!(pb.interval(), Duration::from_millis(250));
        assert!(pb.set_rate(0.0).is_err());
        assert!(pb.set_rate(f64::NAN).is_err());
        assert!(pb.set_rate(1e-300).is_err());
        assert!(pb.set_rate(1e300).is_err());
        assert_eq!(pb.rate(), 4.0);

        pb.set_rate(*TICKS_PER_SECOND_RANGE.start()).unwrap();
        assert_eq!(pb.interval(), Duration::from_secs(100));
    }

    #[test]
    fn test_empty_moves() {
        let mut pb = SimulationPlayback::new(
            MoveSequence::empty(),
            StockProfile::new(0.0, 1.0, 1.0, 0.1),
        );
        pb.play();
        assert!(!pb.is_playing());
        assert_eq!(pb.progress_label(), "0/0");
    }
}
