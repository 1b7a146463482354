//! Input gestures: the declarative triggers that bind raw input to commands.

use std::fmt;
use std::str::FromStr;

use crate::{
    error::{Error, Result},
    event::{
        gamepad::GamepadButton,
        key::{Key, KeyCode, Mods},
        mouse::{MouseButton, WheelDirection},
    },
};

/// A gesture matched against raw input events during command translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputGesture {
    /// Keystroke gesture.
    Key(Key),
    /// Single mouse click.
    MouseClick {
        /// Clicked button.
        button: MouseButton,
        /// Required modifier state.
        mods: Mods,
    },
    /// Double mouse click.
    MouseDoubleClick {
        /// Clicked button.
        button: MouseButton,
        /// Required modifier state.
        mods: Mods,
    },
    /// Mouse wheel rotation.
    MouseWheel {
        /// Wheel direction.
        direction: WheelDirection,
        /// Required modifier state.
        mods: Mods,
    },
    /// Gamepad button press.
    Gamepad(GamepadButton),
}

impl InputGesture {
    /// Does this gesture match a keystroke?
    pub fn matches_key(&self, key: Key) -> bool {
        match self {
            Self::Key(k) => k.normalize() == key.normalize(),
            _ => false,
        }
    }

    /// Does this gesture match a single mouse click?
    pub fn matches_click(&self, button: MouseButton, mods: Mods) -> bool {
        matches!(self, Self::MouseClick { button: b, mods: m } if *b == button && *m == mods)
    }

    /// Does this gesture match a double mouse click?
    pub fn matches_double_click(&self, button: MouseButton, mods: Mods) -> bool {
        matches!(self, Self::MouseDoubleClick { button: b, mods: m } if *b == button && *m == mods)
    }

    /// Does this gesture match a wheel rotation?
    pub fn matches_wheel(&self, direction: WheelDirection, mods: Mods) -> bool {
        matches!(self, Self::MouseWheel { direction: d, mods: m } if *d == direction && *m == mods)
    }

    /// Does this gesture match a gamepad button press?
    pub fn matches_gamepad(&self, button: GamepadButton) -> bool {
        matches!(self, Self::Gamepad(b) if *b == button)
    }
}

impl From<Key> for InputGesture {
    fn from(key: Key) -> Self {
        Self::Key(key)
    }
}

impl From<GamepadButton> for InputGesture {
    fn from(button: GamepadButton) -> Self {
        Self::Gamepad(button)
    }
}

impl fmt::Display for InputGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::MouseClick { button, mods } => {
                write!(f, "{}{button}Click", mods_prefix(*mods))
            }
            Self::MouseDoubleClick { button, mods } => {
                write!(f, "{}{button}DoubleClick", mods_prefix(*mods))
            }
            Self::MouseWheel { direction, mods } => {
                write!(f, "{}Wheel{direction:?}", mods_prefix(*mods))
            }
            Self::Gamepad(button) => write!(f, "Gamepad{button}"),
        }
    }
}

/// Render a `Ctrl+Alt+Shift+` prefix for the active modifiers.
fn mods_prefix(mods: Mods) -> String {
    let mut out = String::new();
    if mods.ctrl {
        out.push_str("Ctrl+");
    }
    if mods.alt {
        out.push_str("Alt+");
    }
    if mods.shift {
        out.push_str("Shift+");
    }
    out
}

impl FromStr for InputGesture {
    type Err = Error;

    /// Parse a gesture string such as `Ctrl+Shift+s`, `LeftDoubleClick`,
    /// `Alt+WheelUp` or `GamepadA`.
    ///
    /// Tokens are separated by `+`; all but the last must be modifier names.
    fn from_str(s: &str) -> Result<Self> {
        let mut mods = Mods::default();
        let mut tokens = s.split('+').map(str::trim).peekable();
        let mut last = None;
        while let Some(token) = tokens.next() {
            if token.is_empty() {
                return Err(Error::Parse(format!("empty token in gesture: {s:?}")));
            }
            if tokens.peek().is_none() {
                last = Some(token);
                break;
            }
            match token {
                "Ctrl" | "Control" => mods.ctrl = true,
                "Alt" => mods.alt = true,
                "Shift" => mods.shift = true,
                other => {
                    return Err(Error::Parse(format!("unknown modifier: {other:?}")));
                }
            }
        }
        let Some(last) = last else {
            return Err(Error::Parse("empty gesture string".into()));
        };

        if let Some(button) = parse_mouse_suffix(last, "DoubleClick") {
            return Ok(Self::MouseDoubleClick { button: button?, mods });
        }
        if let Some(button) = parse_mouse_suffix(last, "Click") {
            return Ok(Self::MouseClick { button: button?, mods });
        }
        if let Some(rest) = last.strip_prefix("Wheel") {
            let direction = match rest {
                "Up" => WheelDirection::Up,
                "Down" => WheelDirection::Down,
                other => {
                    return Err(Error::Parse(format!("unknown wheel direction: {other:?}")));
                }
            };
            return Ok(Self::MouseWheel { direction, mods });
        }
        if let Some(rest) = last.strip_prefix("Gamepad") {
            if !mods.is_empty() {
                return Err(Error::Parse(
                    "gamepad gestures do not take modifiers".into(),
                ));
            }
            return Ok(Self::Gamepad(parse_gamepad_button(rest)?));
        }

        Ok(Self::Key(Key {
            mods,
            code: parse_key_code(last)?,
        }))
    }
}

/// Parse a `<Button><suffix>` token, such as `LeftClick` for suffix `Click`.
fn parse_mouse_suffix(token: &str, suffix: &str) -> Option<Result<MouseButton>> {
    let prefix = token.strip_suffix(suffix)?;
    // A bare suffix like "Click" is not a gesture.
    if prefix.is_empty() {
        return None;
    }
    Some(match prefix {
        "Left" => Ok(MouseButton::Left),
        "Right" => Ok(MouseButton::Right),
        "Middle" => Ok(MouseButton::Middle),
        "X1" => Ok(MouseButton::X1),
        "X2" => Ok(MouseButton::X2),
        other => Err(Error::Parse(format!("unknown mouse button: {other:?}"))),
    })
}

/// Parse a gamepad button name.
fn parse_gamepad_button(name: &str) -> Result<GamepadButton> {
    Ok(match name {
        "A" => GamepadButton::A,
        "B" => GamepadButton::B,
        "X" => GamepadButton::X,
        "Y" => GamepadButton::Y,
        "LeftShoulder" => GamepadButton::LeftShoulder,
        "RightShoulder" => GamepadButton::RightShoulder,
        "LeftThumb" => GamepadButton::LeftThumb,
        "RightThumb" => GamepadButton::RightThumb,
        "DPadUp" => GamepadButton::DPadUp,
        "DPadDown" => GamepadButton::DPadDown,
        "DPadLeft" => GamepadButton::DPadLeft,
        "DPadRight" => GamepadButton::DPadRight,
        "Start" => GamepadButton::Start,
        "Back" => GamepadButton::Back,
        other => {
            return Err(Error::Parse(format!("unknown gamepad button: {other:?}")));
        }
    })
}

/// Parse a named key token.
fn parse_key_code(token: &str) -> Result<KeyCode> {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }
    Ok(match token {
        "Backspace" => KeyCode::Backspace,
        "Enter" | "Return" => KeyCode::Enter,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        "Tab" => KeyCode::Tab,
        "Delete" => KeyCode::Delete,
        "Insert" => KeyCode::Insert,
        "Esc" | "Escape" => KeyCode::Esc,
        "Space" => KeyCode::Space,
        other => {
            if let Some(num) = other.strip_prefix('F') {
                let num: u8 = num
                    .parse()
                    .map_err(|_| Error::Parse(format!("unknown key: {other:?}")))?;
                if (1..=24).contains(&num) {
                    return Ok(KeyCode::F(num));
                }
            }
            return Err(Error::Parse(format!("unknown key: {other:?}")));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_gestures() -> Result<()> {
        assert_eq!(
            "Ctrl+Shift+s".parse::<InputGesture>()?,
            InputGesture::Key(Key {
                mods: Mods {
                    ctrl: true,
                    shift: true,
                    alt: false
                },
                code: KeyCode::Char('s'),
            })
        );
        assert_eq!(
            "Enter".parse::<InputGesture>()?,
            InputGesture::Key(KeyCode::Enter.into())
        );
        assert_eq!(
            "F12".parse::<InputGesture>()?,
            InputGesture::Key(KeyCode::F(12).into())
        );
        Ok(())
    }

    #[test]
    fn parse_mouse_and_gamepad() -> Result<()> {
        assert_eq!(
            "LeftDoubleClick".parse::<InputGesture>()?,
            InputGesture::MouseDoubleClick {
                button: MouseButton::Left,
                mods: Mods::default(),
            }
        );
        assert_eq!(
            "Alt+WheelUp".parse::<InputGesture>()?,
            InputGesture::MouseWheel {
                direction: WheelDirection::Up,
                mods: Mods {
                    alt: true,
                    ..Mods::default()
                },
            }
        );
        assert_eq!(
            "GamepadDPadLeft".parse::<InputGesture>()?,
            InputGesture::Gamepad(GamepadButton::DPadLeft)
        );
        Ok(())
    }

    #[test]
    fn malformed_gestures_are_parse_errors() {
        for bad in ["", "Ctrl+", "Meta+x", "WheelSideways", "GamepadC", "F99"] {
            assert!(
                matches!(bad.parse::<InputGesture>(), Err(Error::Parse(_))),
                "expected parse error for {bad:?}"
            );
        }
    }

    #[test]
    fn display_round_trips() -> Result<()> {
        for s in ["Ctrl+Shift+Enter", "LeftClick", "RightDoubleClick", "WheelDown", "GamepadA"] {
            let gesture: InputGesture = s.parse()?;
            assert_eq!(gesture.to_string(), s);
        }
        Ok(())
    }

    #[test]
    fn key_match_is_case_insensitive() {
        let gesture: InputGesture = "Shift+a".parse().unwrap();
        assert!(gesture.matches_key('A'.into()));
    }
}
