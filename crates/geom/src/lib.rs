//! Geometry primitives used across trellis.
//!
//! Screen-space coordinates are `f32`: the presentation layer lays elements
//! out in floating-point units and directional focus navigation scores
//! candidates with the same math.

#![warn(missing_docs)]

/// Point helpers.
mod point;
/// Rectangle operations.
mod rect;

pub use point::Point;
pub use rect::Rect;
