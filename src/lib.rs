//! BounceTone - a side-scrolling physics platformer where the walls sing
//!
//! Core modules:
//! - `sim`: Deterministic simulation (map catalog, physics, feedback, run loop)
//! - `session`: Run lifecycle, scoring hand-off and best records
//! - `audio`: Tone playback
//! - `renderer`: WebGPU rendering of a frame snapshot
//! - `platform`: Clock and keyboard mapping
//! - `persistence`: Key/value storage for settings and best scores
//! - `tuning`: Data-driven physics and feedback balance

pub mod audio;
pub mod best_scores;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod scoring;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use best_scores::BestScores;
pub use error::{MapError, StorageError, TuningError};
pub use session::{ClearReport, SessionController, SessionEvent};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

/// RGBA color with components in 0..=1
pub type Rgba = [f32; 4];

/// Game configuration constants
pub mod consts {
    use crate::{Rgba, rgb};

    /// Fixed simulation timestep (60 Hz, one physics step per display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Downward gravity in pixels/s²
    pub const GRAVITY: f32 = 1200.0;
    /// Horizontal acceleration while a move key is held (pixels/s²)
    pub const MOVE_ACCEL: f32 = 1560.0;
    /// Upward speed set by a jump (pixels/s)
    pub const JUMP_SPEED: f32 = 830.0;
    /// Jumps available before touching a static body again
    pub const MAX_JUMPS: u8 = 2;
    /// Fraction of velocity lost per 60 Hz step to air drag
    pub const AIR_FRICTION: f32 = 0.01;
    /// Coulomb friction coefficient between the player and static bodies
    pub const WALL_FRICTION: f32 = 0.1;
    /// Approach speed below which contacts do not bounce (pixels/s)
    pub const REST_SPEED: f32 = 60.0;

    /// Player and goal bodies are squares of this side
    pub const PLAYER_SIZE: f32 = 40.0;
    pub const GOAL_SIZE: f32 = 40.0;
    pub const PLAYER_RESTITUTION: f32 = 0.5;
    /// Border walls
    pub const BORDER_THICKNESS: f32 = 20.0;
    /// Pillars and bars inside the course
    pub const OBSTACLE_THICKNESS: f32 = 10.0;

    /// The run fails once the player sinks this many canvas heights down
    pub const FALL_LIMIT_HEIGHTS: f32 = 2.0;
    /// Delay between a fall and the reload (milliseconds)
    pub const FAIL_RESET_DELAY_MS: f64 = 1000.0;

    /// Wall pulse window (milliseconds); tone color holds for the first half
    pub const PULSE_FADE_MS: f64 = 500.0;
    /// Particles per impact burst
    pub const PARTICLE_BURST: usize = 15;
    /// Particle lifetime in render frames
    pub const PARTICLE_LIFE: u32 = 60;
    /// Downward bias added to particle velocity every frame (pixels/frame²)
    pub const PARTICLE_GRAVITY: f32 = 0.1;
    /// Upper bound of the random burst speed (pixels/frame)
    pub const PARTICLE_MAX_SPEED: f32 = 2.0;
    /// Particle draw radius
    pub const PARTICLE_RADIUS: f32 = 2.0;

    /// Impact speed that plays a tone at full volume (pixels/s)
    pub const IMPACT_FULL_VOLUME: f32 = 600.0;
    /// Volume of the goal fanfare
    pub const CLEAR_VOLUME: f32 = 0.9;

    pub const PLAYER_COLOR: Rgba = rgb(0x38, 0xbd, 0xf8);
    pub const GOAL_COLOR: Rgba = rgb(0xff, 0xd7, 0x00);
    pub const PARTICLE_COLOR: Rgba = rgb(0xff, 0xff, 0xff);
}

/// Build an opaque color from 8-bit channels
#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgba {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}
