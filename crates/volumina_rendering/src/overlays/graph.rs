//! Scrolling time-series graph drawn in screen space.
//!
//! The newest value is on the right. Each point advances x by `1 / len`
//! starting from the left edge, so the trace always spans the same width
//! whatever the number of points.

use std::sync::Arc;

use volumina_core::{
    BoundedChannel, ChannelOverlay, DisplayLink, FrameContext, Hotkey, InitContext, Overlay,
    OverlayResult, OverlayState, Primitive, Refresh, RenderOutcome, RenderPhase, Toggleable,
};

use crate::geometry::{GeometryBuffer, OverlayVertex};
use crate::stats::SeriesStats;

/// Left edge of the graph in normalized device coordinates.
pub const GRAPH_X_OFFSET: f32 = -1.0;

/// Depth of the graph line.
pub const GRAPH_DEPTH: f32 = -10.0;

/// Line-strip graph of the latest scalar values.
pub struct GraphOverlay {
    state: OverlayState,
    channel: Arc<BoundedChannel<f64>>,
    geometry: GeometryBuffer,
    color: [f32; 4],
    stats: SeriesStats,
    built: bool,
    /// Capacity given at construction; otherwise the host's applies at init.
    explicit_capacity: bool,
}

impl GraphOverlay {
    /// Creates a hidden graph keeping the default number of points.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_channel(name, BoundedChannel::new(), false)
    }

    /// Creates a hidden graph keeping at most `capacity` points.
    ///
    /// # Errors
    ///
    /// Returns [`volumina_core::OverlayError::InvalidCapacity`] if `capacity`
    /// is zero.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> OverlayResult<Self> {
        Ok(Self::from_channel(
            name,
            BoundedChannel::with_capacity(capacity)?,
            true,
        ))
    }

    fn from_channel(
        name: impl Into<String>,
        channel: BoundedChannel<f64>,
        explicit_capacity: bool,
    ) -> Self {
        let capacity = channel.capacity();
        Self {
            state: OverlayState::new(name),
            channel: Arc::new(channel),
            geometry: GeometryBuffer::with_capacity(capacity),
            color: [1.0, 1.0, 1.0, 1.0],
            stats: SeriesStats::default(),
            built: false,
            explicit_capacity,
        }
    }

    /// Starts displayed.
    #[must_use]
    pub fn shown(mut self) -> Self {
        self.state = self.state.shown();
        self
    }

    /// Binds a hotkey.
    #[must_use]
    pub fn with_hotkey(mut self, hotkey: Hotkey) -> Self {
        self.state = self.state.with_hotkey(hotkey);
        self
    }

    /// Sets the line color.
    #[must_use]
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Line color.
    #[must_use]
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Appends a value; safe to call from any thread through the channel.
    pub fn add_point(&self, value: f64) {
        self.channel.append(value);
    }

    /// Drops the whole history.
    pub fn clear(&self) {
        self.channel.clear();
    }

    /// Geometry of the last rebuild.
    #[must_use]
    pub fn geometry(&self) -> &GeometryBuffer {
        &self.geometry
    }

    /// Statistics of the values drawn last.
    #[must_use]
    pub fn stats(&self) -> SeriesStats {
        self.stats
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn rebuild(&mut self, values: &[f64]) {
        let step = 1.0 / values.len().max(1) as f32;
        self.geometry.begin();
        self.geometry.line_strip(values.iter().enumerate().map(|(i, &y)| {
            OverlayVertex::new(GRAPH_X_OFFSET + i as f32 * step, y as f32, GRAPH_DEPTH)
        }));
        self.geometry.finish();
        self.stats = SeriesStats::from_values(values);
        self.built = true;
    }

    /// Issues the cached geometry. Returns false if there is none.
    fn draw(&self, frame: &mut FrameContext<'_>) -> bool {
        if self.geometry.is_empty() {
            return false;
        }
        let command = self.geometry.draw_command(
            self.state.name(),
            RenderPhase::Screen2D,
            Primitive::LineStrip,
            self.color,
            frame.transforms.projection,
        );
        frame.draw(command);
        true
    }

    fn apply_capacity(&mut self, capacity: usize) {
        match self.channel.set_capacity(capacity) {
            Ok(()) => self.geometry = GeometryBuffer::with_capacity(capacity),
            Err(err) => tracing::warn!(
                "Overlay '{}' keeps capacity {}: {}",
                self.state.name(),
                self.channel.capacity(),
                err
            ),
        }
    }
}

impl Toggleable for GraphOverlay {
    fn toggle(&self) -> bool {
        self.state.toggle()
    }

    fn hotkey(&self) -> Option<Hotkey> {
        self.state.hotkey()
    }
}

impl Overlay for GraphOverlay {
    fn name(&self) -> &str {
        self.state.name()
    }

    fn init(&mut self, ctx: &InitContext<'_>, display: DisplayLink) {
        if !self.explicit_capacity {
            self.apply_capacity(ctx.channel_capacity);
        }
        self.channel.attach_display(display.clone());
        self.state.attach(display);
    }

    fn is_displayed(&self) -> bool {
        self.state.is_displayed()
    }

    fn set_displayed(&self, displayed: bool) {
        self.state.set_displayed(displayed);
    }

    fn has_changed(&self) -> bool {
        self.channel.has_changed()
    }

    fn render_2d(&mut self, frame: &mut FrameContext<'_>) -> RenderOutcome {
        match self
            .state
            .refresh(&self.channel, frame.lock_timeout, !self.built)
        {
            Refresh::Hidden => RenderOutcome::Hidden,
            Refresh::Contended => RenderOutcome::Contended,
            Refresh::Unchanged => {
                if self.draw(frame) {
                    RenderOutcome::Redrawn
                } else {
                    RenderOutcome::Idle
                }
            }
            Refresh::Snapshot(values) => {
                self.rebuild(&values);
                if self.draw(frame) {
                    RenderOutcome::Rebuilt
                } else {
                    RenderOutcome::Idle
                }
            }
        }
    }
}

impl ChannelOverlay for GraphOverlay {
    type Sample = f64;

    fn channel(&self) -> &Arc<BoundedChannel<f64>> {
        &self.channel
    }
}
