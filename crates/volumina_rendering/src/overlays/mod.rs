//! Overlay implementations.
//!
//! | Overlay | Phase | Channel |
//! |---------|-------|---------|
//! | [`GraphOverlay`] | 2D | `f64` values |
//! | [`PathOverlay`] | 3D | `[f32; 3]` points |
//! | [`DriftOverlay`] | 3D | accumulated `[f32; 3]` deltas |
//! | [`BoxOverlay`] | 3D | none (static) |

pub mod box_overlay;
pub mod drift;
pub mod graph;
pub mod path;

pub use box_overlay::BoxOverlay;
pub use drift::{DriftOverlay, DriftTrace};
pub use graph::GraphOverlay;
pub use path::PathOverlay;
