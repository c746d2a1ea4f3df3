//! # VOLUMINA Rendering
//!
//! Overlays drawn over a live volume rendering, the processors that feed
//! them, and the host that drives both every frame.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        OVERLAY HOST                           │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ProcessorSet (compute thread)                                │
//! │    Tenengrad ──► ImageQualityOverlay (graph + readout, 2D)    │
//! │    Centroid  ──► PathOverlay (3D)                             │
//! │    RandomWalk ─► DriftOverlay (3D)                            │
//! │                                                               │
//! │  render_frame (render thread)                                 │
//! │    render_3d ─► render_2d ─► DrawList ─► host renderer        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Mandate
//!
//! - Overlays draw from snapshots, never from live producer state
//! - A contended channel skips the draw, it never stalls the frame
//! - Geometry buffers grow, they never churn

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod adapter;
pub mod geometry;
pub mod host;
pub mod image_quality;
pub mod overlays;
pub mod processors;
pub mod stats;

pub use adapter::OverlayProcessorAdapter;
pub use geometry::{GeometryBuffer, OverlayVertex};
pub use host::{FrameReport, HostStats, OverlayHost, ProcessSummary, ProcessorSet};
pub use image_quality::{ImageQualityOverlay, LatestValue, DEFAULT_GRAPH_POINTS};
pub use overlays::{BoxOverlay, DriftOverlay, DriftTrace, GraphOverlay, PathOverlay};
pub use processors::{CentroidTracker, RandomWalk, TenengradProcessor};
pub use stats::SeriesStats;
