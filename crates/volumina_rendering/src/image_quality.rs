//! # Image Quality Overlay
//!
//! Graph of the Tenengrad sharpness metric plus a text readout of the
//! latest value, toggled with `I`.
//!
//! ```text
//! TenengradProcessor ──► GraphOverlay channel ──► line strip (2D)
//!                    └─► LatestValue ──────────► "image quality: 0.0421 ..."
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use volumina_core::{
    BoundedChannel, ChannelOverlay, DisplayLink, DrawCommand, FontFace, FrameContext, Hotkey,
    InitContext, Key, Overlay, OverlayResult, RenderOutcome, ResultListener, Toggleable,
};

use crate::adapter::OverlayProcessorAdapter;
use crate::overlays::GraphOverlay;
use crate::processors::TenengradProcessor;

/// Number of points kept by the graph.
pub const DEFAULT_GRAPH_POINTS: usize = 20;

/// Font asset used for the readout.
pub const READOUT_FONT_PATH: &str = "fonts/SourceCodeProLight.ttf";

/// Readout font size in points.
pub const READOUT_FONT_SIZE: f32 = 24.0;

/// Readout position in pixels from the top-left corner.
pub const READOUT_POSITION: (f32, f32) = (10.0, 15.0);

/// Caches the most recent result of a processor.
#[derive(Debug, Default)]
pub struct LatestValue {
    value: Mutex<Option<f64>>,
}

impl LatestValue {
    /// Most recent value, if any arrived.
    #[must_use]
    pub fn get(&self) -> Option<f64> {
        *self.value.lock()
    }

    /// Forgets the cached value.
    pub fn reset(&self) {
        *self.value.lock() = None;
    }
}

impl ResultListener<f64> for LatestValue {
    fn notify_result(&self, _source: &str, result: &f64) {
        *self.value.lock() = Some(*result);
    }
}

/// Sharpness graph with a numeric readout.
pub struct ImageQualityOverlay {
    adapter: OverlayProcessorAdapter<GraphOverlay, TenengradProcessor>,
    latest: Arc<LatestValue>,
    font: FontFace,
}

impl ImageQualityOverlay {
    /// Creates a hidden overlay named `image_quality` whose graph keeps
    /// `points` values.
    ///
    /// # Errors
    ///
    /// Returns [`volumina_core::OverlayError::InvalidCapacity`] if `points`
    /// is zero.
    pub fn new(points: usize) -> OverlayResult<Self> {
        let graph = GraphOverlay::with_capacity("image_quality", points)?
            .with_color([0.2, 0.8, 1.0, 1.0]);
        let latest = Arc::new(LatestValue::default());
        let adapter = OverlayProcessorAdapter::new(graph, Arc::new(TenengradProcessor::new()))
            .with_listener(Arc::clone(&latest))
            .with_hotkey(Hotkey::key(Key::I));

        Ok(Self {
            adapter,
            latest,
            font: FontFace::fallback(READOUT_FONT_SIZE),
        })
    }

    /// The metric processor, to register with the host.
    #[must_use]
    pub fn processor(&self) -> &Arc<TenengradProcessor> {
        self.adapter.processor()
    }

    /// Underlying graph.
    #[must_use]
    pub fn graph(&self) -> &GraphOverlay {
        self.adapter.overlay()
    }

    /// Most recent metric value.
    #[must_use]
    pub fn latest(&self) -> Option<f64> {
        self.latest.get()
    }

    /// Font resolved at init.
    #[must_use]
    pub fn font(&self) -> &FontFace {
        &self.font
    }

    /// Text shown next to the graph.
    #[must_use]
    pub fn readout(&self) -> Option<String> {
        let value = self.latest.get()?;
        let stats = self.graph().stats();
        if stats.is_empty() {
            return Some(format!("image quality: {value:.4}"));
        }
        Some(format!(
            "image quality: {value:.4} (min {:.4}, max {:.4}, mean {:.4})",
            stats.min, stats.max, stats.mean
        ))
    }
}

impl Toggleable for ImageQualityOverlay {
    fn toggle(&self) -> bool {
        let displayed = self.adapter.toggle();
        if displayed {
            self.latest.reset();
        }
        displayed
    }

    fn hotkey(&self) -> Option<Hotkey> {
        self.adapter.hotkey()
    }
}

impl Overlay for ImageQualityOverlay {
    fn name(&self) -> &str {
        self.adapter.name()
    }

    fn init(&mut self, ctx: &InitContext<'_>, display: DisplayLink) {
        self.adapter.init(ctx, display);
        self.font = FontFace::load_or_fallback(ctx.assets, READOUT_FONT_PATH, READOUT_FONT_SIZE);
    }

    fn is_displayed(&self) -> bool {
        self.adapter.is_displayed()
    }

    fn set_displayed(&self, displayed: bool) {
        if displayed && !self.adapter.is_displayed() {
            self.latest.reset();
        }
        self.adapter.set_displayed(displayed);
    }

    fn has_changed(&self) -> bool {
        self.adapter.has_changed()
    }

    fn render_2d(&mut self, frame: &mut FrameContext<'_>) -> RenderOutcome {
        let outcome = self.adapter.render_2d(frame);
        if !outcome.drew() {
            return outcome;
        }

        if let Some(text) = self.readout() {
            frame.draw(DrawCommand::Text {
                overlay: self.adapter.name().to_string(),
                text,
                x: READOUT_POSITION.0,
                y: READOUT_POSITION.1,
                font_family: self.font.family.clone(),
                font_size: self.font.size,
                color: [1.0, 1.0, 1.0, 1.0],
            });
        }
        outcome
    }
}

impl ChannelOverlay for ImageQualityOverlay {
    type Sample = f64;

    fn channel(&self) -> &Arc<BoundedChannel<f64>> {
        self.adapter.channel()
    }
}
