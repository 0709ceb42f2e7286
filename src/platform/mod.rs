//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time and the fixed-step accumulator
//! - Keyboard input

pub mod clock;
pub mod input;

pub use clock::{Clock, FixedStep, ManualClock};
pub use input::{Action, InputState, map_key};

#[cfg(target_arch = "wasm32")]
pub use clock::PerformanceClock;
