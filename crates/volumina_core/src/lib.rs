//! # VOLUMINA Core
//!
//! Data plumbing between background computations and the overlays drawn on
//! top of a live volume rendering.
//!
//! ```text
//! Processor::compute ──► ListenerRegistry ──► BoundedChannel ──► Overlay::render_2d/3d
//!   (worker thread)        (weak, ordered)      (lock-guarded)     (render thread, 10ms max)
//!                                                     │
//!                                                     └──► DisplayRequestSink
//! ```
//!
//! ## Design Principles
//!
//! 1. **The render thread never blocks** - channel locks are taken with a bounded wait
//! 2. **No ownership cycles** - processors only hold weak references to listeners
//! 3. **Faults stay local** - a failing processor is logged, counted and maybe disabled
//! 4. **External configuration** - pipeline settings come from a TOML file
//!
//! ## Example
//!
//! ```rust,ignore
//! use volumina_core::{BoundedChannel, Processor};
//!
//! let channel = Arc::new(BoundedChannel::with_capacity(128)?);
//! processor.add_result_listener(&channel);
//! processor.process(&ProcessRequest::new(0, 256, 256, 64));
//! assert_eq!(channel.len(), 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod assets;
pub mod backend;
pub mod channel;
pub mod config;
pub mod display;
pub mod error;
pub mod frame;
pub mod overlay;
pub mod processor;
pub mod toggle;

pub use assets::{AssetSource, DirectoryAssets, FontFace, MemoryAssets, FALLBACK_FONT_FAMILY};
pub use backend::{BackendCapabilities, BackendDescriptor};
pub use channel::{BoundedChannel, ChannelGuard, DEFAULT_CHANNEL_CAPACITY};
pub use config::PipelineConfig;
pub use display::{DisplayLink, DisplayRequestSink, DisplayRequests};
pub use error::{OverlayError, OverlayResult};
pub use frame::{
    mat4_mul, DrawCommand, DrawList, FrameContext, FrameTransforms, InitContext, Mat4, Primitive,
    RenderPhase, Viewport, IDENTITY,
};
pub use overlay::{ChannelOverlay, Overlay, OverlayState, Refresh, RenderOutcome};
pub use processor::{
    FrameProcessor, ListenerRegistry, ListenerToken, ProcessOutcome, ProcessRequest, Processor,
    ProcessorCore, ProcessorStats, ResultListener,
};
pub use toggle::{Hotkey, Key, Modifiers, Toggleable};
