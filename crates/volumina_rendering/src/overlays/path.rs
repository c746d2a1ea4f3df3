//! Trajectory drawn as a line strip in volume space.

use std::sync::Arc;

use volumina_core::{
    BoundedChannel, ChannelOverlay, DisplayLink, FrameContext, Hotkey, InitContext, Overlay,
    OverlayResult, OverlayState, Primitive, Refresh, RenderOutcome, RenderPhase, Toggleable,
};

use crate::geometry::{GeometryBuffer, OverlayVertex};

/// Default path color.
pub const PATH_COLOR: [f32; 4] = [1.0, 0.5, 0.0, 1.0];

/// Line strip through the latest 3D points, in volume coordinates.
pub struct PathOverlay {
    state: OverlayState,
    channel: Arc<BoundedChannel<[f32; 3]>>,
    geometry: GeometryBuffer,
    color: [f32; 4],
    built: bool,
    /// Capacity given at construction; otherwise the host's applies at init.
    explicit_capacity: bool,
}

impl PathOverlay {
    /// Creates a hidden path keeping the default number of points.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_channel(name, BoundedChannel::new(), false)
    }

    /// Creates a hidden path keeping at most `capacity` points.
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
        channel: BoundedChannel<[f32; 3]>,
        explicit_capacity: bool,
    ) -> Self {
        let capacity = channel.capacity();
        Self {
            state: OverlayState::new(name),
            channel: Arc::new(channel),
            geometry: GeometryBuffer::with_capacity(capacity),
            color: PATH_COLOR,
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

    /// Appends a point of the trajectory.
    pub fn add_path_point(&self, x: f32, y: f32, z: f32) {
        self.channel.append([x, y, z]);
    }

    /// Drops the whole trajectory.
    pub fn clear(&self) {
        self.channel.clear();
    }

    /// Geometry of the last rebuild.
    #[must_use]
    pub fn geometry(&self) -> &GeometryBuffer {
        &self.geometry
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

impl Toggleable for PathOverlay {
    fn toggle(&self) -> bool {
        self.state.toggle()
    }

    fn hotkey(&self) -> Option<Hotkey> {
        self.state.hotkey()
    }
}

impl Overlay for PathOverlay {
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

    fn render_3d(&mut self, frame: &mut FrameContext<'_>) -> RenderOutcome {
        let outcome = match self
            .state
            .refresh(&self.channel, frame.lock_timeout, !self.built)
        {
            Refresh::Hidden => return RenderOutcome::Hidden,
            Refresh::Contended => return RenderOutcome::Contended,
            Refresh::Unchanged => RenderOutcome::Redrawn,
            Refresh::Snapshot(points) => {
                self.geometry.begin();
                self.geometry
                    .line_strip(points.iter().map(|&[x, y, z]| OverlayVertex::new(x, y, z)));
                self.geometry.finish();
                self.built = true;
                RenderOutcome::Rebuilt
            }
        };

        if self.geometry.is_empty() {
            return RenderOutcome::Idle;
        }
        let command = self.geometry.draw_command(
            self.state.name(),
            RenderPhase::Scene3D,
            Primitive::LineStrip,
            self.color,
            frame.transforms.scene(),
        );
        frame.draw(command);
        outcome
    }
}

impl ChannelOverlay for PathOverlay {
    type Sample = [f32; 3];

    fn channel(&self) -> &Arc<BoundedChannel<[f32; 3]>> {
        &self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volumina_core::{DrawCommand, DrawList, FrameTransforms, Viewport, IDENTITY};

    #[test]
    fn test_path_uses_scene_transform() {
        let mut path = PathOverlay::with_capacity("path", 16).unwrap().shown();
        path.add_path_point(0.0, 0.0, 0.0);
        path.add_path_point(0.1, 0.2, 0.3);

        let mut inverse_volume = IDENTITY;
        inverse_volume[3][2] = -4.0;
        let transforms = FrameTransforms {
            projection: IDENTITY,
            inverse_volume,
        };

        let mut list = DrawList::new();
        let mut frame = FrameContext::new(
            &mut list,
            transforms,
            Viewport::new(800, 600),
            std::time::Duration::from_millis(10),
        );
        assert_eq!(path.render_3d(&mut frame), RenderOutcome::Rebuilt);
        assert_eq!(path.render_2d(&mut frame), RenderOutcome::Idle);

        match &frame.draw_list().commands()[0] {
            DrawCommand::Geometry {
                transform,
                index_count,
                phase,
                ..
            } => {
                assert_eq!(transform[3][2], -4.0);
                assert_eq!(*index_count, 2);
                assert_eq!(*phase, RenderPhase::Scene3D);
            }
            DrawCommand::Text { .. } => panic!("expected geometry"),
        }
    }

    #[test]
    fn test_path_keeps_latest_points() {
        let mut path = PathOverlay::with_capacity("path", 2).unwrap().shown();
        path.add_path_point(1.0, 0.0, 0.0);
        path.add_path_point(2.0, 0.0, 0.0);
        path.add_path_point(3.0, 0.0, 0.0);

        let mut list = DrawList::new();
        let mut frame = FrameContext::with_defaults(&mut list, Viewport::new(800, 600));
        path.render_3d(&mut frame);

        let xs: Vec<f32> = path.geometry().vertices().iter().map(|v| v.position[0]).collect();
        assert_eq!(xs, vec![2.0, 3.0]);
    }

    #[test]
    fn test_empty_path_is_idle() {
        let mut path = PathOverlay::new("path").shown();
        let mut list = DrawList::new();
        let mut frame = FrameContext::with_defaults(&mut list, Viewport::new(800, 600));
        assert_eq!(path.render_3d(&mut frame), RenderOutcome::Idle);
        assert_eq!(path.render_3d(&mut frame), RenderOutcome::Idle);
        assert!(!path.render_3d(&mut frame).drew());
        assert!(frame.draw_list().is_empty());
    }
}
