//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body id)
//! - No rendering or platform dependencies; audio goes through `AudioSink`

pub mod effects;
pub mod feedback;
pub mod maps;
pub mod physics;
pub mod selector;
pub mod state;
pub mod tick;
pub mod tone;

pub use effects::{Effects, Particle, Pulse, PulseShade};
pub use feedback::{FeedbackCommand, FeedbackOptions, Impact, ToneLookup, dispatch, on_impact};
pub use maps::{Difficulty, MapLayout, WallId, WallSpec};
pub use physics::{Aabb, BodyId, Contact, PhysicsWorld, WorldParams};
pub use selector::{Canvas, generate_map, select};
pub use state::{Camera, GameEvent, GameState, JumpCounter, Movement, RngState, RunPhase, Wall};
pub use tick::{ContactOutcome, TickInput, handle_contacts, render_tick, tick};
pub use tone::{Tone, ToneRegistry};
