//! Impact feedback
//!
//! Contact handling turns impacts into `FeedbackCommand`s. The commands wait
//! in the run's queue until the next render frame, which dispatches them to
//! the audio sink and the effect pools.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effects::Effects;
use super::maps::WallId;
use super::tone::{Tone, ToneRegistry};
use crate::Rgba;
use crate::audio::AudioSink;
use crate::consts::*;

/// How a struck body's tone is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneLookup {
    /// The tone the wall got when the course was built
    #[default]
    Assigned,
    /// One tone per 100 px column of the struck body
    Position,
}

/// A body struck at the start of a contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    /// Wall identity, `None` for non-wall bodies such as the goal
    pub wall: Option<WallId>,
    pub is_static: bool,
    /// Relative speed of the pair (pixels/s)
    pub strength: f32,
    /// Where the bodies met
    pub point: Vec2,
    /// Center of the struck body
    pub body_pos: Vec2,
}

/// Side effect requested by the simulation
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackCommand {
    PlayTone { tone: Tone, volume: f32 },
    SpawnParticles { at: Vec2, count: usize },
    RegisterPulse { wall: WallId, color: Rgba },
    PlayClear { volume: f32 },
}

/// Knobs for impact feedback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackOptions {
    pub tone_lookup: ToneLookup,
    /// Impact speed mapped to full volume
    pub full_volume_speed: f32,
    pub particle_burst: usize,
    pub particles: bool,
    pub pulses: bool,
}

impl Default for FeedbackOptions {
    fn default() -> Self {
        Self {
            tone_lookup: ToneLookup::Assigned,
            full_volume_speed: IMPACT_FULL_VOLUME,
            particle_burst: PARTICLE_BURST,
            particles: true,
            pulses: true,
        }
    }
}

/// Playback volume for an impact of `strength`
pub fn impact_volume(strength: f32, full_volume_speed: f32) -> f32 {
    if full_volume_speed <= 0.0 {
        return 1.0;
    }
    (strength / full_volume_speed).clamp(0.0, 1.0)
}

/// Resolve the tone for an impact
pub fn impact_tone(impact: &Impact, tones: &ToneRegistry, lookup: ToneLookup) -> Tone {
    match lookup {
        ToneLookup::Assigned => impact.wall.map_or(Tone::FALLBACK, |wall| tones.lookup(wall)),
        ToneLookup::Position => Tone::from_position(impact.body_pos.x),
    }
}

/// Commands for one impact
pub fn on_impact(
    impact: &Impact,
    tones: &ToneRegistry,
    options: &FeedbackOptions,
) -> Vec<FeedbackCommand> {
    let tone = impact_tone(impact, tones, options.tone_lookup);
    let mut commands = vec![FeedbackCommand::PlayTone {
        tone,
        volume: impact_volume(impact.strength, options.full_volume_speed),
    }];

    if impact.is_static {
        if options.particles {
            commands.push(FeedbackCommand::SpawnParticles {
                at: impact.point,
                count: options.particle_burst,
            });
        }
        if let (true, Some(wall)) = (options.pulses, impact.wall) {
            commands.push(FeedbackCommand::RegisterPulse {
                wall,
                color: tone.color(),
            });
        }
    }
    commands
}

/// Carry out queued commands
pub fn dispatch(
    commands: impl IntoIterator<Item = FeedbackCommand>,
    audio: &mut dyn AudioSink,
    effects: &mut Effects,
    now_ms: f64,
) {
    for command in commands {
        match command {
            FeedbackCommand::PlayTone { tone, volume } => audio.play(tone, volume),
            FeedbackCommand::SpawnParticles { at, count } => effects.spawn_burst(at, count),
            FeedbackCommand::RegisterPulse { wall, color } => {
                effects.add_pulse(wall, color, now_ms)
            }
            FeedbackCommand::PlayClear { volume } => audio.play_clear(volume),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{RecordingAudio, ToneBank};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn registry() -> (ToneRegistry, Tone) {
        let mut tones = ToneRegistry::new(Pcg32::seed_from_u64(8));
        let tone = tones.assign(WallId(5));
        (tones, tone)
    }

    fn wall_impact(strength: f32) -> Impact {
        Impact {
            wall: Some(WallId(5)),
            is_static: true,
            strength,
            point: Vec2::new(30.0, 40.0),
            body_pos: Vec2::new(250.0, 40.0),
        }
    }

    #[test]
    fn test_impact_volume_clamps() {
        assert_eq!(impact_volume(0.0, 600.0), 0.0);
        assert!((impact_volume(300.0, 600.0) - 0.5).abs() < 1e-6);
        assert_eq!(impact_volume(5000.0, 600.0), 1.0);
    }

    #[test]
    fn test_static_wall_impact_commands() {
        let (tones, tone) = registry();
        let commands = on_impact(&wall_impact(300.0), &tones, &FeedbackOptions::default());
        assert_eq!(
            commands,
            vec![
                FeedbackCommand::PlayTone { tone, volume: 0.5 },
                FeedbackCommand::SpawnParticles {
                    at: Vec2::new(30.0, 40.0),
                    count: 15
                },
                FeedbackCommand::RegisterPulse {
                    wall: WallId(5),
                    color: tone.color()
                },
            ]
        );
    }

    #[test]
    fn test_dynamic_impact_only_plays() {
        let (tones, _) = registry();
        let impact = Impact {
            is_static: false,
            ..wall_impact(100.0)
        };
        let commands = on_impact(&impact, &tones, &FeedbackOptions::default());
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], FeedbackCommand::PlayTone { .. }));
    }

    #[test]
    fn test_unknown_wall_uses_fallback_tone() {
        let (tones, _) = registry();
        let impact = Impact {
            wall: None,
            ..wall_impact(100.0)
        };
        let commands = on_impact(&impact, &tones, &FeedbackOptions::default());
        assert!(matches!(commands[0], FeedbackCommand::PlayTone { tone: Tone::C, .. }));
        // Non-wall statics still spark but have nothing to pulse
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn test_position_lookup() {
        let (tones, _) = registry();
        let options = FeedbackOptions {
            tone_lookup: ToneLookup::Position,
            ..Default::default()
        };
        assert_eq!(impact_tone(&wall_impact(1.0), &tones, options.tone_lookup), Tone::E);
    }

    #[test]
    fn test_disabled_effects() {
        let (tones, _) = registry();
        let options = FeedbackOptions {
            particles: false,
            pulses: false,
            ..Default::default()
        };
        assert_eq!(on_impact(&wall_impact(100.0), &tones, &options).len(), 1);
    }

    #[test]
    fn test_dispatch_routes_commands() {
        let (tones, _) = registry();
        let mut effects = Effects::new(Pcg32::seed_from_u64(1), 100);
        let mut audio = RecordingAudio::new(ToneBank::standard());
        let mut commands = on_impact(&wall_impact(600.0), &tones, &FeedbackOptions::default());
        commands.push(FeedbackCommand::PlayClear { volume: CLEAR_VOLUME });

        dispatch(commands, &mut audio, &mut effects, 10.0);

        assert_eq!(audio.played.len(), 1);
        assert_eq!(audio.played[0].gain, 1.0);
        assert_eq!(audio.clears, vec![0.9]);
        assert_eq!(effects.particles().len(), 15);
        assert_eq!(effects.pulses().len(), 1);
        assert_eq!(effects.pulses()[0].started_ms, 10.0);
    }
}
