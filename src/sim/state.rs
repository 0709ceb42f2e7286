//! Run state and core simulation types
//!
//! One `GameState` lives for exactly one run. Dropping it tears down the
//! physics world, effect pools and tone registry together.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::Effects;
use super::feedback::{FeedbackCommand, FeedbackOptions};
use super::maps::{Difficulty, MapLayout, WallId};
use super::physics::{Aabb, Body, BodyDesc, BodyId, BodyLabel, PhysicsWorld};
use super::selector::{Canvas, PARTICLE_STREAM};
use super::tone::{Tone, ToneRegistry};
use crate::Rgba;
use crate::tuning::Tuning;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// No course loaded
    Idle,
    /// Player in control
    Running,
    /// Goal reached; the world keeps moving but input is ignored
    Cleared,
    /// Fell out of the course; waiting for the reload
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Cleared | RunPhase::Failed)
    }
}

/// Held movement keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub left: bool,
    pub right: bool,
}

impl Movement {
    /// -1, 0 or 1; both keys cancel out
    pub fn direction(&self) -> f32 {
        (self.right as i8 - self.left as i8) as f32
    }
}

/// Jumps used since the player last touched something solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpCounter {
    used: u8,
    max: u8,
}

impl JumpCounter {
    pub fn new(max: u8) -> Self {
        Self { used: 0, max }
    }

    pub fn used(&self) -> u8 {
        self.used
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// Spend a jump if one is left
    pub fn try_jump(&mut self) -> bool {
        if self.used < self.max {
            self.used += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}

/// A wall in the running course
#[derive(Debug, Clone)]
pub struct Wall {
    pub id: WallId,
    pub body: BodyId,
    pub shape: Aabb,
    pub tone: Tone,
    pub base_color: Rgba,
    /// Color drawn this frame; pulses change it briefly
    pub color: Rgba,
}

/// Viewport centered on the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub center: Vec2,
    pub viewport: Vec2,
}

impl Camera {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            center: viewport / 2.0,
            viewport,
        }
    }

    pub fn follow(&mut self, target: Vec2) {
        self.center = target;
    }

    pub fn top_left(&self) -> Vec2 {
        self.center - self.viewport / 2.0
    }

    /// World position to viewport pixels
    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        world - self.top_left()
    }
}

/// Outcomes the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Cleared,
    Fell,
}

/// Seed plus PCG stream, so each concern gets its own sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn with_stream(seed: u64, stream: u64) -> Self {
        Self { seed, stream }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ self.stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub difficulty: Difficulty,
    /// Generator that built the course
    pub layout_name: &'static str,
    pub canvas: Canvas,
    pub phase: RunPhase,
    pub world: PhysicsWorld,
    pub player: BodyId,
    pub goal: BodyId,
    /// Indexed by `WallId`
    pub walls: Vec<Wall>,
    pub tones: ToneRegistry,
    pub movement: Movement,
    pub jumps: JumpCounter,
    pub camera: Camera,
    pub effects: Effects,
    /// Commands waiting for the next render frame
    pub feedback: Vec<FeedbackCommand>,
    /// Events waiting for the session
    pub events: Vec<GameEvent>,
    /// Physics steps taken
    pub time_ticks: u64,
    pub options: FeedbackOptions,
    pub tuning: Tuning,
}

impl GameState {
    /// Load `layout` into a fresh physics world and start running
    pub fn new(
        layout: MapLayout,
        seed: u64,
        tuning: Tuning,
        options: FeedbackOptions,
        max_particles: usize,
    ) -> Self {
        let canvas = Canvas::new(layout.width, layout.height);
        let mut world = PhysicsWorld::new(tuning.world_params());
        let base_color = layout.difficulty.wall_color();

        let walls = layout
            .walls
            .iter()
            .map(|spec| Wall {
                id: spec.id,
                body: world.add(BodyDesc::fixed(spec.shape, BodyLabel::Wall)),
                shape: spec.shape,
                tone: spec.tone,
                base_color,
                color: base_color,
            })
            .collect();
        let goal = world.add(BodyDesc::fixed(layout.goal, BodyLabel::Goal));
        let player = world.add(BodyDesc::dynamic(
            layout.start,
            BodyLabel::Player,
            layout.start_restitution,
        ));

        let mut camera = Camera::new(canvas.size());
        camera.follow(layout.start.center);

        Self {
            seed,
            difficulty: layout.difficulty,
            layout_name: layout.name,
            canvas,
            phase: RunPhase::Running,
            world,
            player,
            goal,
            walls,
            tones: layout.tones,
            movement: Movement::default(),
            jumps: JumpCounter::new(tuning.max_jumps),
            camera,
            effects: Effects::new(
                RngState::with_stream(seed, PARTICLE_STREAM).to_rng(),
                max_particles,
            ),
            feedback: Vec::new(),
            events: Vec::new(),
            time_ticks: 0,
            options,
            tuning,
        }
    }

    pub fn player_body(&self) -> Option<&Body> {
        self.world.body(self.player)
    }

    pub fn player_pos(&self) -> Option<Vec2> {
        self.player_body().map(|b| b.pos())
    }

    pub fn goal_shape(&self) -> Option<Aabb> {
        self.world.body(self.goal).map(|b| b.shape)
    }

    /// Wall backed by physics body `body`
    pub fn wall_by_body(&self, body: BodyId) -> Option<&Wall> {
        // Wall bodies are created first, in wall order
        match self.walls.binary_search_by_key(&body, |w| w.body) {
            Ok(i) => Some(&self.walls[i]),
            Err(_) => None,
        }
    }

    pub fn wall_mut(&mut self, id: WallId) -> Option<&mut Wall> {
        self.walls.get_mut(id.0 as usize).filter(|w| w.id == id)
    }

    /// Jump if the counter allows: drop vertical speed, then kick upward
    pub fn jump(&mut self) -> bool {
        let Some(body) = self.player_body() else {
            return false;
        };
        let (vel, mass) = (body.vel, body.mass);
        if !self.jumps.try_jump() {
            return false;
        }
        self.world.set_velocity(self.player, Vec2::new(vel.x, 0.0));
        self.world
            .apply_impulse(self.player, Vec2::new(0.0, -mass * self.tuning.jump_speed));
        true
    }

    /// Hand pending events to the caller
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::maps::split_lane;

    fn state() -> GameState {
        let layout = split_lane(800.0, 500.0, ToneRegistry::new(Pcg32::seed_from_u64(1)));
        GameState::new(layout, 1, Tuning::default(), FeedbackOptions::default(), 100)
    }

    #[test]
    fn test_new_state_has_one_player_and_goal() {
        let state = state();
        let labels: Vec<_> = state.world.bodies().iter().map(|b| b.label).collect();
        assert_eq!(labels.iter().filter(|&&l| l == BodyLabel::Player).count(), 1);
        assert_eq!(labels.iter().filter(|&&l| l == BodyLabel::Goal).count(), 1);
        assert_eq!(state.phase, RunPhase::Running);
        assert_eq!(state.walls.len(), state.tones.len());
    }

    #[test]
    fn test_walls_start_with_tier_color() {
        let state = state();
        for wall in &state.walls {
            assert_eq!(wall.color, Difficulty::Easy.wall_color());
            assert_eq!(state.wall_by_body(wall.body).map(|w| w.id), Some(wall.id));
        }
        assert!(state.wall_by_body(state.player).is_none());
    }

    #[test]
    fn test_movement_direction() {
        let both = Movement {
            left: true,
            right: true,
        };
        assert_eq!(both.direction(), 0.0);
        assert_eq!(Movement { left: true, right: false }.direction(), -1.0);
        assert_eq!(Movement { left: false, right: true }.direction(), 1.0);
    }

    #[test]
    fn test_jump_counter_caps() {
        let mut jumps = JumpCounter::new(2);
        assert!(jumps.try_jump());
        assert!(jumps.try_jump());
        assert!(!jumps.try_jump());
        assert_eq!(jumps.used(), 2);
        jumps.reset();
        assert_eq!(jumps.used(), 0);
    }

    #[test]
    fn test_jump_sets_upward_speed() {
        let mut state = state();
        state.world.set_velocity(state.player, Vec2::new(50.0, 300.0));
        assert!(state.jump());
        let vel = state.player_body().unwrap().vel;
        assert_eq!(vel.x, 50.0);
        assert!((vel.y + state.tuning.jump_speed).abs() < 0.01);
    }

    #[test]
    fn test_camera_to_screen() {
        let mut camera = Camera::new(Vec2::new(800.0, 500.0));
        camera.follow(Vec2::new(1000.0, 250.0));
        assert_eq!(camera.to_screen(Vec2::new(1000.0, 250.0)), Vec2::new(400.0, 250.0));
    }

    #[test]
    fn test_rng_streams_differ() {
        use rand::Rng;
        let a: u64 = RngState::with_stream(9, 0).to_rng().random();
        let b: u64 = RngState::with_stream(9, 1).to_rng().random();
        assert_ne!(a, b);
        let again: u64 = RngState::with_stream(9, 1).to_rng().random();
        assert_eq!(b, again);
    }
}
