//! Cosmetic impact effects: particle bursts and wall pulses
//!
//! Advanced once per render frame, never by the physics step. Nothing here
//! feeds back into the simulation.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::maps::WallId;
use crate::Rgba;
use crate::consts::*;

/// A spark thrown off by an impact
///
/// Position and velocity are in pixels and pixels per render frame.
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Render frames left
    pub life: u32,
    pub color: Rgba,
}

impl Particle {
    /// Opacity: fades linearly with remaining life
    pub fn alpha(&self) -> f32 {
        (self.life as f32 / PARTICLE_LIFE as f32).clamp(0.0, 1.0)
    }
}

/// A wall flashing its tone color
#[derive(Debug, Clone)]
pub struct Pulse {
    pub wall: WallId,
    /// Timestamp the pulse started (ms)
    pub started_ms: f64,
    pub color: Rgba,
}

/// How a pulsing wall should be drawn this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PulseShade {
    /// Tone color
    Lit(Rgba),
    /// Back to the wall's base color
    Base,
}

impl Pulse {
    /// Shade at `now_ms`, or `None` once the pulse has expired
    pub fn shade(&self, now_ms: f64, fade_ms: f64) -> Option<PulseShade> {
        let elapsed = now_ms - self.started_ms;
        if elapsed >= fade_ms {
            None
        } else if elapsed < fade_ms / 2.0 {
            Some(PulseShade::Lit(self.color))
        } else {
            Some(PulseShade::Base)
        }
    }
}

/// Live particles and pulses
#[derive(Debug, Clone)]
pub struct Effects {
    particles: Vec<Particle>,
    pulses: Vec<Pulse>,
    max_particles: usize,
    rng: Pcg32,
}

impl Effects {
    pub fn new(rng: Pcg32, max_particles: usize) -> Self {
        Self {
            particles: Vec::new(),
            pulses: Vec::new(),
            max_particles,
            rng,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    /// Throw `count` particles out of `at` in random directions
    pub fn spawn_burst(&mut self, at: Vec2, count: usize) {
        if self.max_particles == 0 {
            return;
        }
        for _ in 0..count {
            let angle = self.rng.random::<f32>() * std::f32::consts::TAU;
            let speed = self.rng.random::<f32>() * PARTICLE_MAX_SPEED;
            self.particles.push(Particle {
                pos: at,
                vel: Vec2::from_angle(angle) * speed,
                life: PARTICLE_LIFE,
                color: PARTICLE_COLOR,
            });
        }

        // Cap particles, dropping the oldest
        if self.particles.len() > self.max_particles {
            let excess = self.particles.len() - self.max_particles;
            self.particles.drain(0..excess);
        }
    }

    /// Start a pulse on `wall`; a newer pulse replaces an older one
    pub fn add_pulse(&mut self, wall: WallId, color: Rgba, now_ms: f64) {
        self.pulses.retain(|p| p.wall != wall);
        self.pulses.push(Pulse {
            wall,
            started_ms: now_ms,
            color,
        });
    }

    /// One render frame of particle motion
    pub fn advance_particles(&mut self) {
        for p in &mut self.particles {
            p.pos += p.vel;
            p.vel.y += PARTICLE_GRAVITY;
            p.life = p.life.saturating_sub(1);
        }
        self.particles.retain(|p| p.life > 0);
    }

    /// Shade every pulsing wall for `now_ms` and drop expired pulses
    ///
    /// Expired pulses report `PulseShade::Base` once so the wall is restored.
    pub fn advance_pulses(&mut self, now_ms: f64, fade_ms: f64) -> Vec<(WallId, PulseShade)> {
        let mut shades = Vec::with_capacity(self.pulses.len());
        self.pulses.retain(|pulse| match pulse.shade(now_ms, fade_ms) {
            Some(shade) => {
                shades.push((pulse.wall, shade));
                true
            }
            None => {
                shades.push((pulse.wall, PulseShade::Base));
                false
            }
        });
        shades
    }
}
