//! Core primitives to represent gamepad input.
use std::fmt;

/// Gamepad button codes.
#[derive(Debug, PartialOrd, PartialEq, Eq, Clone, Copy, Hash)]
pub enum GamepadButton {
    /// Bottom face button.
    A,
    /// Right face button.
    B,
    /// Left face button.
    X,
    /// Top face button.
    Y,
    /// Left shoulder bumper.
    LeftShoulder,
    /// Right shoulder bumper.
    RightShoulder,
    /// Left stick press.
    LeftThumb,
    /// Right stick press.
    RightThumb,
    /// D-pad up.
    DPadUp,
    /// D-pad down.
    DPadDown,
    /// D-pad left.
    DPadLeft,
    /// D-pad right.
    DPadRight,
    /// Start button.
    Start,
    /// Back/select button.
    Back,
}

impl fmt::Display for GamepadButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
