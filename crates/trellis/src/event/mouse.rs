//! Core primitives to represent mouse input.
use std::fmt;

/// Mouse button codes.
#[derive(Debug, PartialOrd, PartialEq, Eq, Clone, Copy, Hash)]
pub enum MouseButton {
    /// Left mouse button.
    Left,
    /// Right mouse button.
    Right,
    /// Middle mouse button.
    Middle,
    /// First extended button.
    X1,
    /// Second extended button.
    X2,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Scroll wheel direction.
#[derive(Debug, PartialOrd, PartialEq, Eq, Clone, Copy, Hash)]
pub enum WheelDirection {
    /// Wheel rotated away from the user.
    Up,
    /// Wheel rotated toward the user.
    Down,
}

impl WheelDirection {
    /// Classify a raw wheel delta. Positive deltas scroll up.
    pub fn from_delta(delta: i32) -> Self {
        if delta >= 0 { Self::Up } else { Self::Down }
    }
}
