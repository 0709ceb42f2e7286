//! Data-driven game balance
//!
//! Physics and feedback numbers that designers tweak. Defaults come from
//! `consts`; a JSON document may override any subset of fields.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TuningError;
use crate::persistence::Storage;
use crate::sim::WorldParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Physics ===
    /// Downward gravity (pixels/s²)
    pub gravity: f32,
    /// Horizontal acceleration while moving (pixels/s²)
    pub move_accel: f32,
    /// Upward speed of a jump (pixels/s)
    pub jump_speed: f32,
    pub max_jumps: u8,
    pub air_friction: f32,
    pub wall_friction: f32,
    pub rest_speed: f32,

    // === Run ===
    /// Fail once the player is this many canvas heights down
    pub fall_limit_heights: f32,
    pub fail_reset_delay_ms: f64,

    // === Feedback ===
    pub pulse_fade_ms: f64,
    pub particle_burst: usize,
    pub impact_full_volume: f32,
    pub clear_volume: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            move_accel: MOVE_ACCEL,
            jump_speed: JUMP_SPEED,
            max_jumps: MAX_JUMPS,
            air_friction: AIR_FRICTION,
            wall_friction: WALL_FRICTION,
            rest_speed: REST_SPEED,
            fall_limit_heights: FALL_LIMIT_HEIGHTS,
            fail_reset_delay_ms: FAIL_RESET_DELAY_MS,
            pulse_fade_ms: PULSE_FADE_MS,
            particle_burst: PARTICLE_BURST,
            impact_full_volume: IMPACT_FULL_VOLUME,
            clear_volume: CLEAR_VOLUME,
        }
    }
}

impl Tuning {
    /// Storage key for a designer override document
    pub const STORAGE_KEY: &'static str = "bounce_tone_tuning";

    /// Stored override if present and valid, otherwise defaults
    pub fn load(storage: &dyn Storage) -> Self {
        let Some(json) = storage.get(Self::STORAGE_KEY) else {
            return Self::default();
        };
        match Self::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning override");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning override: {}", e);
                Self::default()
            }
        }
    }

    /// Parse and validate a JSON document; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        fn check(field: &'static str, value: f64, ok: bool) -> Result<(), TuningError> {
            if ok && value.is_finite() {
                Ok(())
            } else {
                Err(TuningError::OutOfRange { field, value })
            }
        }

        check("gravity", self.gravity as f64, self.gravity >= 0.0)?;
        check("move_accel", self.move_accel as f64, self.move_accel >= 0.0)?;
        check("jump_speed", self.jump_speed as f64, self.jump_speed >= 0.0)?;
        check(
            "air_friction",
            self.air_friction as f64,
            (0.0..1.0).contains(&self.air_friction),
        )?;
        check("wall_friction", self.wall_friction as f64, self.wall_friction >= 0.0)?;
        check("rest_speed", self.rest_speed as f64, self.rest_speed >= 0.0)?;
        check(
            "fall_limit_heights",
            self.fall_limit_heights as f64,
            self.fall_limit_heights > 1.0,
        )?;
        check(
            "fail_reset_delay_ms",
            self.fail_reset_delay_ms,
            self.fail_reset_delay_ms >= 0.0,
        )?;
        check("pulse_fade_ms", self.pulse_fade_ms, self.pulse_fade_ms > 0.0)?;
        check(
            "impact_full_volume",
            self.impact_full_volume as f64,
            self.impact_full_volume > 0.0,
        )?;
        check(
            "clear_volume",
            self.clear_volume as f64,
            (0.0..=1.0).contains(&self.clear_volume),
        )?;
        Ok(())
    }

    pub fn world_params(&self) -> WorldParams {
        WorldParams {
            gravity: Vec2::new(0.0, self.gravity),
            air_friction: self.air_friction,
            wall_friction: self.wall_friction,
            rest_speed: self.rest_speed,
        }
    }
}
