//! Machine moves and immutable move sequences.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use crate::settings::{FeedRate, GlobalSettings, SpindleSpeed};

/// Assumed traverse rate for time estimates (mm/min).
pub const RAPID_RATE_MM_MIN: f64 = 5000.0;

/// Type of motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Non-cutting positioning at traverse rate.
    Rapid,
    /// Material-removing move at the programmed feed.
    Cut,
}

/// Position in the (z, r) half-plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachinePoint {
    pub z: f64,
    pub r: f64,
}

impl MachinePoint {
    pub fn new(z: f64, r: f64) -> Self {
        Self { z, r }
    }

    pub fn distance_to(&self, other: &MachinePoint) -> f64 {
        ((self.z - other.z).powi(2) + (self.r - other.r).powi(2)).sqrt()
    }
}

/// One tool motion with the modal state in effect while it runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineMove {
    pub kind: MoveKind,
    pub target: MachinePoint,
    pub feed: FeedRate,
    pub speed: SpindleSpeed,
    pub tool: u32,
}

impl MachineMove {
    pub fn is_cut(&self) -> bool {
        self.kind == MoveKind::Cut
    }
}

/// Ordered, immutable list of moves.
///
/// Cloning shares the underlying buffer, so a completed result can be handed
/// to the preview, the simulation and the exporter without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveSequence {
    moves: Arc<[MachineMove]>,
}

impl MoveSequence {
    pub fn new(moves: Vec<MachineMove>) -> Self {
        Self {
            moves: moves.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Concatenate sequences in order.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a MoveSequence>) -> Self {
        let moves: Vec<MachineMove> = parts
            .into_iter()
            .flat_map(|part| part.iter().copied())
            .collect();
        Self::new(moves)
    }

    pub fn as_slice(&self) -> &[MachineMove] {
        &self.moves
    }

    /// Number of cut moves.
    pub fn cut_count(&self) -> usize {
        self.moves.iter().filter(|m| m.is_cut()).count()
    }

    /// Pairs of (start, move). The first move has no known start and is
    /// reported from its own target.
    fn segments(&self) -> impl Iterator<Item = (MachinePoint, &MachineMove)> {
        let starts = self
            .moves
            .first()
            .map(|m| m.target)
            .into_iter()
            .chain(self.moves.iter().map(|m| m.target));
        starts.zip(self.moves.iter())
    }

    /// Total path length of cut moves (mm).
    pub fn cut_length(&self) -> f64 {
        self.segments()
            .filter(|(_, m)| m.is_cut())
            .map(|(start, m)| start.distance_to(&m.target))
            .sum()
    }

    /// Total path length of rapid moves (mm).
    pub fn rapid_length(&self) -> f64 {
        self.segments()
            .filter(|(_, m)| !m.is_cut())
            .map(|(start, m)| start.distance_to(&m.target))
            .sum()
    }

    /// Rough machining time: cuts at their effective feed, rapids at
    /// [`RAPID_RATE_MM_MIN`].
    pub fn estimated_time(&self, global: &GlobalSettings) -> Duration {
        let minutes: f64 = self
            .segments()
            .map(|(start, m)| {
                let distance = start.distance_to(&m.target);
                let rate = if m.is_cut() {
                    let radius = start.r.max(m.target.r);
                    let rpm = m.speed.rpm_at(radius, global.max_spindle_speed);
                    m.feed.per_minute(rpm)
                } else {
                    RAPID_RATE_MM_MIN
                };
                if rate > 0.0 {
                    distance / rate
                } else {
                    0.0
                }
            })
            .sum();
        // Saturates for feeds so slow the total overflows a Duration.
        Duration::try_from_secs_f64((minutes * 60.0).max(0.0)).unwrap_or(Duration::MAX)
    }
}

impl Default for MoveSequence {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for MoveSequence {
    type Target = [MachineMove];

    fn deref(&self) -> &Self::Target {
        &self.moves
    }
}

impl From<Vec<MachineMove>> for MoveSequence {
    fn from(moves: Vec<MachineMove>) -> Self {
        Self::new(moves)
    }
}
