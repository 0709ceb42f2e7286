//! Fixed timestep simulation tick
//!
//! `tick` advances physics once and turns contacts into jump resets,
//! feedback and run events. `render_tick` runs once per display frame and
//! plays out the queued feedback.

use glam::Vec2;
use log::info;

use super::effects::PulseShade;
use super::feedback::{FeedbackCommand, Impact, dispatch, on_impact};
use super::physics::Contact;
use super::state::{GameEvent, GameState, Movement, RunPhase};
use crate::audio::AudioSink;

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// ArrowLeft held
    pub left: bool,
    /// ArrowRight held
    pub right: bool,
    /// Space pressed since the last tick
    pub jump: bool,
}

/// What a step's contacts mean for the run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactOutcome {
    pub commands: Vec<FeedbackCommand>,
    /// The player touched the goal
    pub cleared: bool,
    /// The player touched something static
    pub reset_jumps: bool,
}

/// Interpret the contacts that started this step
pub fn handle_contacts(state: &GameState, contacts: &[Contact]) -> ContactOutcome {
    let mut outcome = ContactOutcome::default();

    for contact in contacts {
        let is_static = contact.a_static || contact.b_static;
        let struck = if contact.a_static { contact.a } else { contact.b };
        let impact = Impact {
            wall: state.wall_by_body(struck).map(|w| w.id),
            is_static,
            strength: (contact.vel_a - contact.vel_b).length(),
            point: contact.point,
            body_pos: state
                .world
                .body(struck)
                .map_or(contact.point, |b| b.pos()),
        };
        outcome
            .commands
            .extend(on_impact(&impact, &state.tones, &state.options));

        if let Some(other) = contact.other(state.player) {
            if other == state.goal {
                outcome.cleared = true;
            }
            if is_static {
                outcome.reset_jumps = true;
            }
        }
    }
    outcome
}

/// Advance the run by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.time_ticks += 1;

    if state.phase == RunPhase::Running {
        state.movement = Movement {
            left: input.left,
            right: input.right,
        };
        let direction = state.movement.direction();
        if direction != 0.0 {
            if let Some(mass) = state.player_body().map(|b| b.mass) {
                let force = Vec2::new(direction * mass * state.tuning.move_accel, 0.0);
                state.world.apply_force(state.player, force);
            }
        }
        if input.jump {
            state.jump();
        }
    } else {
        state.movement = Movement::default();
    }

    let contacts = state.world.step(dt);
    let outcome = handle_contacts(state, &contacts);

    if outcome.reset_jumps {
        state.jumps.reset();
    }
    state.feedback.extend(outcome.commands);

    if outcome.cleared && state.phase == RunPhase::Running {
        state.phase = RunPhase::Cleared;
        state.events.push(GameEvent::Cleared);
        state.feedback.push(FeedbackCommand::PlayClear {
            volume: state.tuning.clear_volume,
        });
        info!("Course '{}' cleared after {} ticks", state.layout_name, state.time_ticks);
    }

    let Some(pos) = state.player_pos() else {
        return;
    };
    state.camera.follow(pos);

    let fall_limit = state.tuning.fall_limit_heights * state.canvas.height;
    if state.phase == RunPhase::Running && pos.y > fall_limit {
        state.phase = RunPhase::Failed;
        state.events.push(GameEvent::Fell);
        info!("Player fell out of '{}' at y={:.0}", state.layout_name, pos.y);
    }
}

/// Once per display frame: play queued feedback and age the effects
pub fn render_tick(state: &mut GameState, now_ms: f64, audio: &mut dyn AudioSink) {
    // Fresh bursts are drawn at their spawn point first
    state.effects.advance_particles();

    let commands = std::mem::take(&mut state.feedback);
    dispatch(commands, audio, &mut state.effects, now_ms);

    for (id, shade) in state
        .effects
        .advance_pulses(now_ms, state.tuning.pulse_fade_ms)
    {
        if let Some(wall) = state.wall_mut(id) {
            wall.color = match shade {
                PulseShade::Lit(color) => color,
                PulseShade::Base => wall.base_color,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{RecordingAudio, ToneBank};
    use crate::consts::*;
    use crate::sim::feedback::FeedbackOptions;
    use crate::sim::maps::{Difficulty, MapBuilder, split_lane};
    use crate::sim::tone::ToneRegistry;
    use crate::tuning::Tuning;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn tones() -> ToneRegistry {
        ToneRegistry::new(Pcg32::seed_from_u64(4))
    }

    fn run(layout: crate::sim::MapLayout) -> GameState {
        GameState::new(layout, 4, Tuning::default(), FeedbackOptions::default(), 200)
    }

    /// Player hovering over the goal and a block of the same height
    fn goal_ledge_state() -> GameState {
        let mut map = MapBuilder::new("ledge", Difficulty::Easy, 800.0, 500.0, tones());
        map.wall(440.0, 460.0, 40.0, 40.0);
        run(map.finish(Vec2::new(420.0, 400.0), Vec2::new(400.0, 460.0)))
    }

    /// Player standing room above an open floor
    fn floor_state() -> GameState {
        let map = MapBuilder::new("floor", Difficulty::Easy, 800.0, 500.0, tones());
        run(map.finish(Vec2::new(200.0, 440.0), Vec2::new(700.0, 60.0)))
    }

    fn settle(state: &mut GameState, ticks: usize) {
        for _ in 0..ticks {
            tick(state, &TickInput::default(), SIM_DT);
        }
    }

    #[test]
    fn test_clear_fires_once_with_several_pairs() {
        let mut state = goal_ledge_state();
        let mut events = Vec::new();
        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            events.extend(state.take_events());
        }
        assert_eq!(events, vec![GameEvent::Cleared]);
        assert_eq!(state.phase, RunPhase::Cleared);
        let fanfares = state
            .feedback
            .iter()
            .filter(|c| matches!(c, FeedbackCommand::PlayClear { .. }))
            .count();
        assert_eq!(fanfares, 1);
    }

    #[test]
    fn test_input_ignored_after_clear() {
        let mut state = goal_ledge_state();
        settle(&mut state, 60);
        assert_eq!(state.phase, RunPhase::Cleared);
        let jumps = state.jumps.used();
        let input = TickInput {
            left: true,
            right: false,
            jump: true,
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.jumps.used(), jumps);
        assert_eq!(state.movement, Movement::default());
    }

    #[test]
    fn test_fall_emits_single_event() {
        let mut state = floor_state();
        state
            .world
            .set_position(state.player, Vec2::new(400.0, 1100.0));
        let mut events = Vec::new();
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            events.extend(state.take_events());
        }
        assert_eq!(events, vec![GameEvent::Fell]);
        assert_eq!(state.phase, RunPhase::Failed);
    }

    #[test]
    fn test_landing_resets_jumps() {
        let mut state = floor_state();
        settle(&mut state, 60);
        let jump = TickInput {
            jump: true,
            ..Default::default()
        };
        tick(&mut state, &jump, SIM_DT);
        settle(&mut state, 10);
        tick(&mut state, &jump, SIM_DT);
        assert_eq!(state.jumps.used(), 2);
        // A third jump in the air is refused
        tick(&mut state, &jump, SIM_DT);
        assert_eq!(state.jumps.used(), 2);

        settle(&mut state, 240);
        assert_eq!(state.jumps.used(), 0);
    }

    #[test]
    fn test_move_right_and_both_cancel() {
        let mut state = floor_state();
        settle(&mut state, 60);
        let x0 = state.player_pos().unwrap().x;

        let both = TickInput {
            left: true,
            right: true,
            jump: false,
        };
        for _ in 0..30 {
            tick(&mut state, &both, SIM_DT);
        }
        assert!((state.player_pos().unwrap().x - x0).abs() < 1.0);

        let right = TickInput {
            right: true,
            ..Default::default()
        };
        for _ in 0..30 {
            tick(&mut state, &right, SIM_DT);
        }
        assert!(state.player_pos().unwrap().x > x0 + 20.0);
    }

    #[test]
    fn test_camera_tracks_player() {
        let mut state = floor_state();
        settle(&mut state, 5);
        assert_eq!(state.camera.center, state.player_pos().unwrap());
    }

    #[test]
    fn test_landing_queues_wall_feedback() {
        let mut state = floor_state();
        state.world.set_velocity(state.player, Vec2::new(0.0, 0.0));
        state
            .world
            .set_position(state.player, Vec2::new(200.0, 300.0));
        settle(&mut state, 60);
        assert!(
            state
                .feedback
                .iter()
                .any(|c| matches!(c, FeedbackCommand::PlayTone { .. }))
        );
        assert!(
            state
                .feedback
                .iter()
                .any(|c| matches!(c, FeedbackCommand::RegisterPulse { .. }))
        );
    }

    #[test]
    fn test_render_tick_pulses_wall_then_restores() {
        let mut state = floor_state();
        state
            .world
            .set_position(state.player, Vec2::new(200.0, 300.0));
        settle(&mut state, 60);
        let pulsed = state.feedback.iter().find_map(|c| match c {
            FeedbackCommand::RegisterPulse { wall, color } => Some((*wall, *color)),
            _ => None,
        });
        let (wall, color) = pulsed.expect("floor impact should pulse");

        let mut audio = RecordingAudio::new(ToneBank::standard());
        render_tick(&mut state, 1000.0, &mut audio);
        assert!(state.feedback.is_empty());
        assert!(!audio.played.is_empty());
        assert_eq!(state.walls[wall.0 as usize].color, color);
        assert!(!state.effects.particles().is_empty());

        render_tick(&mut state, 1300.0, &mut audio);
        let wall = &state.walls[wall.0 as usize];
        assert_eq!(wall.color, wall.base_color);
        render_tick(&mut state, 1600.0, &mut audio);
        assert!(state.effects.pulses().is_empty());
    }

    #[test]
    fn test_new_burst_starts_at_spawn_point() {
        let mut state = floor_state();
        let at = Vec2::new(150.0, 390.0);
        state
            .feedback
            .push(FeedbackCommand::SpawnParticles { at, count: 5 });

        let mut audio = RecordingAudio::new(ToneBank::standard());
        render_tick(&mut state, 0.0, &mut audio);
        let particles = state.effects.particles();
        assert_eq!(particles.len(), 5);
        assert!(particles.iter().all(|p| p.life == PARTICLE_LIFE && p.pos == at));

        render_tick(&mut state, 16.0, &mut audio);
        assert!(
            state
                .effects
                .particles()
                .iter()
                .all(|p| p.life == PARTICLE_LIFE - 1)
        );
    }

    #[test]
    fn test_handle_contacts_is_pure() {
        let state = goal_ledge_state();
        let contacts = vec![Contact {
            a: state.goal,
            b: state.player,
            vel_a: Vec2::ZERO,
            vel_b: Vec2::new(0.0, 300.0),
            a_static: true,
            b_static: false,
            point: Vec2::new(400.0, 440.0),
        }];
        let outcome = handle_contacts(&state, &contacts);
        assert!(outcome.cleared);
        assert!(outcome.reset_jumps);
        assert!(matches!(
            outcome.commands[0],
            FeedbackCommand::PlayTone { volume, .. } if (volume - 0.5).abs() < 1e-6
        ));
        // Nothing was applied to the state
        assert_eq!(state.phase, RunPhase::Running);
        assert!(state.feedback.is_empty());
    }

    #[test]
    fn test_determinism() {
        let layout = || split_lane(1280.0, 720.0, tones());
        let mut a = run(layout());
        let mut b = run(layout());
        let inputs = [
            TickInput { right: true, ..Default::default() },
            TickInput { jump: true, ..Default::default() },
            TickInput { left: true, ..Default::default() },
        ];
        for i in 0..300 {
            let input = inputs[i % inputs.len()];
            tick(&mut a, &input, SIM_DT);
            tick(&mut b, &input, SIM_DT);
        }
        assert_eq!(a.player_pos(), b.player_pos());
        assert_eq!(a.jumps, b.jumps);
    }

    proptest! {
        #[test]
        fn prop_jump_counter_in_range(
            inputs in proptest::collection::vec(
                (any::<bool>(), any::<bool>(), any::<bool>()),
                1..300,
            )
        ) {
            let mut state = run(split_lane(800.0, 500.0, tones()));
            for (left, right, jump) in inputs {
                tick(&mut state, &TickInput { left, right, jump }, SIM_DT);
                prop_assert!(state.jumps.used() <= MAX_JUMPS);
            }
        }
    }
}
