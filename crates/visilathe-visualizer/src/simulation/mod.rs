//! Machining simulation: stock model, playback cursor and its clock.

pub mod clock;
pub mod playback;
pub mod stock;

pub use clock::PlaybackClock;
pub use playback::{
    MachinedState, SimulationPlayback, DEFAULT_TICKS_PER_SECOND, TICKS_PER_SECOND_RANGE,
};
pub use stock::{StockProfile, DEFAULT_BIN_WIDTH};
