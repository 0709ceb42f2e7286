//! Time-based score and letter grade

use std::fmt;

use serde::{Deserialize, Serialize};

/// Score with nothing deducted
pub const MAX_SCORE: u32 = 1000;
/// Points lost per second on the clock
pub const POINTS_PER_SECOND: f64 = 10.0;

/// Score for a clear after `elapsed_ms`: 1000 minus 10 per second, never negative
pub fn score(elapsed_ms: f64) -> u32 {
    let elapsed_s = (elapsed_ms / 1000.0).max(0.0);
    let penalty = (elapsed_s * POINTS_PER_SECOND).floor();
    (MAX_SCORE as f64 - penalty).max(0.0) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn for_score(score: u32) -> Self {
        match score {
            900.. => Grade::S,
            750.. => Grade::A,
            500.. => Grade::B,
            300.. => Grade::C,
            _ => Grade::D,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
