//! Raw input primitives consumed by gesture translation.

pub mod gamepad;
pub mod key;
pub mod mouse;
