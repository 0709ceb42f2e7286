//! Keyboard mapping
//!
//! Browser listeners feed raw key codes in; the game loop reads a
//! `TickInput` snapshot per step.

use crate::sim::TickInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
}

/// Game action bound to a `KeyboardEvent.code`
pub fn map_key(code: &str) -> Option<Action> {
    match code {
        "ArrowLeft" => Some(Action::MoveLeft),
        "ArrowRight" => Some(Action::MoveRight),
        "Space" => Some(Action::Jump),
        _ => None,
    }
}

/// Keys held plus a latched jump press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    jump_pressed: bool,
}

impl InputState {
    /// Returns whether the key is bound, so the caller can prevent default
    pub fn key_down(&mut self, code: &str, repeat: bool) -> bool {
        match map_key(code) {
            Some(Action::MoveLeft) => self.left = true,
            Some(Action::MoveRight) => self.right = true,
            // Auto-repeat must not burn the second jump
            Some(Action::Jump) => self.jump_pressed |= !repeat,
            None => return false,
        }
        true
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        match map_key(code) {
            Some(Action::MoveLeft) => self.left = false,
            Some(Action::MoveRight) => self.right = false,
            Some(Action::Jump) => {}
            None => return false,
        }
        true
    }

    /// Input for the next step; the jump press is consumed
    pub fn snapshot(&mut self) -> TickInput {
        let input = TickInput {
            left: self.left,
            right: self.right,
            jump: self.jump_pressed,
        };
        self.jump_pressed = false;
        input
    }

    /// Release everything, e.g. when the window loses focus
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
