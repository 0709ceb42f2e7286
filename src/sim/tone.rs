//! Wall tones
//!
//! Every wall gets one of seven pitch classes when a course is built. The
//! tone picks the note played on impact and the color the wall flashes.

use std::collections::HashMap;

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::maps::WallId;
use crate::{Rgba, rgb};

/// Pitch class of a wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tone {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Tone {
    /// All tones in scale order
    pub const ALL: [Tone; 7] = [Tone::C, Tone::D, Tone::E, Tone::F, Tone::G, Tone::A, Tone::B];

    /// Tone reported for walls that never had one assigned
    pub const FALLBACK: Tone = Tone::C;

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::C => "C",
            Tone::D => "D",
            Tone::E => "E",
            Tone::F => "F",
            Tone::G => "G",
            Tone::A => "A",
            Tone::B => "B",
        }
    }

    /// Position in `Tone::ALL`
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Pulse color for this tone
    pub fn color(&self) -> Rgba {
        match self {
            Tone::C => rgb(0xf8, 0x71, 0x71),
            Tone::D => rgb(0xfb, 0xbf, 0x24),
            Tone::E => rgb(0x34, 0xd3, 0x99),
            Tone::F => rgb(0x60, 0xa5, 0xfa),
            Tone::G => rgb(0xa7, 0x8b, 0xfa),
            Tone::A => rgb(0xf4, 0x72, 0xb6),
            Tone::B => rgb(0x38, 0xbd, 0xf8),
        }
    }

    /// Frequency of the fourth-octave note (Hz)
    pub fn frequency(&self) -> f32 {
        match self {
            Tone::C => 261.63,
            Tone::D => 293.66,
            Tone::E => 329.63,
            Tone::F => 349.23,
            Tone::G => 392.00,
            Tone::A => 440.00,
            Tone::B => 493.88,
        }
    }

    /// Tone for a body by horizontal position: one tone per 100 px column
    pub fn from_position(x: f32) -> Tone {
        let column = (x / 100.0).floor() as i64;
        Tone::ALL[column.rem_euclid(Tone::ALL.len() as i64) as usize]
    }
}

/// Wall tone assignments for one course
///
/// Owned by the layout that created the walls and then by the run that plays
/// it, so identities never leak between runs.
#[derive(Debug, Clone)]
pub struct ToneRegistry {
    rng: Pcg32,
    tones: HashMap<WallId, Tone>,
}

impl ToneRegistry {
    pub fn new(rng: Pcg32) -> Self {
        Self {
            rng,
            tones: HashMap::new(),
        }
    }

    /// Pick a tone for `wall` and remember it. A wall keeps its first tone.
    pub fn assign(&mut self, wall: WallId) -> Tone {
        if let Some(&tone) = self.tones.get(&wall) {
            return tone;
        }
        let tone = Tone::ALL[self.rng.random_range(0..Tone::ALL.len())];
        self.tones.insert(wall, tone);
        tone
    }

    /// Recorded tone for `wall`, or `Tone::FALLBACK`
    pub fn lookup(&self, wall: WallId) -> Tone {
        self.tones.get(&wall).copied().unwrap_or(Tone::FALLBACK)
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }
}
