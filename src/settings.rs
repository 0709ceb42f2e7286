//! Player settings and preferences
//!
//! Persisted as JSON through a `Storage`, separately from best scores.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::persistence::{Storage, load_json, save_json};
use crate::sim::{FeedbackOptions, ToneLookup};
use crate::tuning::Tuning;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 60,
            QualityPreset::Medium => 300,
            QualityPreset::High => 1200,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Impact sparks
    pub particles: bool,
    /// Walls flash their tone color when hit
    pub pulses: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Tone volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
    /// Where impact tones come from
    pub tone_lookup: ToneLookup,

    // === Flow ===
    /// Retry the same course after a fall instead of returning to the menu
    pub restart_on_fail: bool,

    // === Accessibility ===
    /// Reduced motion (no wall flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            pulses: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            tone_lookup: ToneLookup::Assigned,
            restart_on_fail: false,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "bounce_tone_settings";

    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        // Low preset keeps sparks off for performance
        if preset == QualityPreset::Low {
            self.particles = false;
        }
    }

    /// Effective wall pulses (respects reduced_motion)
    pub fn effective_pulses(&self) -> bool {
        self.pulses && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Feedback knobs for a run
    pub fn feedback_options(&self, tuning: &Tuning) -> FeedbackOptions {
        FeedbackOptions {
            tone_lookup: self.tone_lookup,
            full_volume_speed: tuning.impact_full_volume,
            particle_burst: tuning.particle_burst,
            particles: self.max_particles() > 0,
            pulses: self.effective_pulses(),
        }
    }

    /// Load from storage, falling back to defaults
    pub fn load(storage: &dyn Storage) -> Self {
        match load_json(storage, Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        save_json(storage, Self::STORAGE_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_defaults_when_nothing_stored() {
        let storage = MemoryStorage::new();
        assert_eq!(Settings::load(&storage), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut storage = MemoryStorage::new();
        let mut settings = Settings::from_preset(QualityPreset::High);
        settings.tone_lookup = ToneLookup::Position;
        settings.muted = true;
        settings.save(&mut storage).unwrap();
        assert_eq!(Settings::load(&storage), settings);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let mut storage = MemoryStorage::new();
        storage
            .set(Settings::STORAGE_KEY, r#"{"restart_on_fail":true}"#)
            .unwrap();
        let settings = Settings::load(&storage);
        assert!(settings.restart_on_fail);
        assert!(settings.particles);
    }

    #[test]
    fn test_low_preset_disables_particles() {
        let settings = Settings::from_preset(QualityPreset::Low);
        assert_eq!(settings.max_particles(), 0);
        assert!(!settings.feedback_options(&Tuning::default()).particles);
    }

    #[test]
    fn test_reduced_motion_disables_pulses() {
        let settings = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        assert!(!settings.feedback_options(&Tuning::default()).pulses);
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
    }
}
