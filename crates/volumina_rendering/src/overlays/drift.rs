//! Drift trace: accumulates per-step displacement deltas into an absolute
//! position and draws the resulting trajectory.
//!
//! ```text
//! RandomWalk ──delta──► DriftTrace (position += delta) ──► path channel ──► DriftOverlay
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use volumina_core::{
    BoundedChannel, ChannelOverlay, DisplayLink, FrameContext, Hotkey, InitContext, Overlay,
    OverlayResult, RenderOutcome, ResultListener, Toggleable,
};

use super::path::PathOverlay;

/// Listener side of a [`DriftOverlay`]: integrates deltas.
#[derive(Debug)]
pub struct DriftTrace {
    position: Mutex<[f32; 3]>,
    channel: Arc<BoundedChannel<[f32; 3]>>,
}

impl DriftTrace {
    /// Current accumulated position.
    #[must_use]
    pub fn position(&self) -> [f32; 3] {
        *self.position.lock()
    }

    /// Moves the position back to the origin and clears the trace.
    pub fn reset(&self) {
        let mut position = self.position.lock();
        *position = [0.0; 3];
        self.channel.clear();
    }

    /// Adds one displacement and records the new position.
    pub fn push_delta(&self, delta: [f32; 3]) {
        let mut position = self.position.lock();
        for (axis, d) in position.iter_mut().zip(delta) {
            *axis += d;
        }
        self.channel.append(*position);
    }
}

impl ResultListener<[f32; 3]> for DriftTrace {
    fn notify_result(&self, _source: &str, delta: &[f32; 3]) {
        self.push_delta(*delta);
    }
}

/// Trajectory of accumulated drift, drawn in volume space.
pub struct DriftOverlay {
    path: PathOverlay,
    trace: Arc<DriftTrace>,
}

impl DriftOverlay {
    /// Creates a hidden drift overlay keeping at most `capacity` positions.
    ///
    /// # Errors
    ///
    /// Returns [`volumina_core::OverlayError::InvalidCapacity`] if `capacity`
    /// is zero.
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> OverlayResult<Self> {
        let path = PathOverlay::with_capacity(name, capacity)?.with_color([0.0, 1.0, 0.5, 1.0]);
        let trace = Arc::new(DriftTrace {
            position: Mutex::new([0.0; 3]),
            channel: Arc::clone(path.channel()),
        });
        Ok(Self { path, trace })
    }

    /// Starts displayed.
    #[must_use]
    pub fn shown(mut self) -> Self {
        self.path = self.path.shown();
        self
    }

    /// Binds a hotkey.
    #[must_use]
    pub fn with_hotkey(mut self, hotkey: Hotkey) -> Self {
        self.path = self.path.with_hotkey(hotkey);
        self
    }

    /// Listener to register on a drift-producing processor.
    #[must_use]
    pub fn trace(&self) -> &Arc<DriftTrace> {
        &self.trace
    }

    /// Moves back to the origin and clears the trajectory.
    pub fn reset(&self) {
        self.trace.reset();
    }
}

impl Toggleable for DriftOverlay {
    fn toggle(&self) -> bool {
        self.path.toggle()
    }

    fn hotkey(&self) -> Option<Hotkey> {
        self.path.hotkey()
    }
}

impl Overlay for DriftOverlay {
    fn name(&self) -> &str {
        self.path.name()
    }

    fn init(&mut self, ctx: &InitContext<'_>, display: DisplayLink) {
        self.path.init(ctx, display);
    }

    fn is_displayed(&self) -> bool {
        self.path.is_displayed()
    }

    fn set_displayed(&self, displayed: bool) {
        self.path.set_displayed(displayed);
    }

    fn has_changed(&self) -> bool {
        self.path.has_changed()
    }

    fn render_3d(&mut self, frame: &mut FrameContext<'_>) -> RenderOutcome {
        self.path.render_3d(frame)
    }
}

impl ChannelOverlay for DriftOverlay {
    type Sample = [f32; 3];

    fn channel(&self) -> &Arc<BoundedChannel<[f32; 3]>> {
        self.path.channel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deltas_accumulate() {
        let drift = DriftOverlay::with_capacity("drift", 8).unwrap();
        let trace = Arc::clone(drift.trace());

        trace.notify_result("walk", &[1.0, 0.0, -1.0]);
        trace.notify_result("walk", &[0.5, 2.0, 0.0]);

        assert_eq!(trace.position(), [1.5, 2.0, -1.0]);
        assert_eq!(
            drift.channel().snapshot(),
            vec![[1.0, 0.0, -1.0], [1.5, 2.0, -1.0]]
        );
    }

    #[test]
    fn test_reset() {
        let drift = DriftOverlay::with_capacity("drift", 8).unwrap();
        drift.trace().push_delta([1.0, 1.0, 1.0]);
        drift.reset();

        assert_eq!(drift.trace().position(), [0.0; 3]);
        assert!(drift.channel().is_empty());
    }
}
