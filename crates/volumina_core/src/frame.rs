//! Per-frame data handed to overlays, and the draw commands they emit.
//!
//! Overlays never talk to the graphics API directly. They push
//! [`DrawCommand`]s into the frame's [`DrawList`] and the host submits the
//! list once every overlay had its turn.

use std::time::Duration;

use crate::assets::AssetSource;
use crate::backend::BackendDescriptor;
use crate::config::DEFAULT_RENDER_LOCK_TIMEOUT_MS;

/// Column-major 4x4 matrix.
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix.
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Transforms supplied by the host every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    /// Projection matrix.
    pub projection: Mat4,
    /// Inverse of the volume (model-view) matrix.
    pub inverse_volume: Mat4,
}

impl FrameTransforms {
    /// Transform for volume-space geometry: projection after inverse volume.
    #[must_use]
    pub fn scene(&self) -> Mat4 {
        mat4_mul(&self.projection, &self.inverse_volume)
    }
}

/// Product `a * b` of two column-major matrices.
#[must_use]
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [[0.0; 4]; 4];
    for (col, out_col) in out.iter_mut().enumerate() {
        for (row, cell) in out_col.iter_mut().enumerate() {
            *cell = (0..4).map(|k| a[k][row] * b[col][k]).sum();
        }
    }
    out
}

impl Default for FrameTransforms {
    fn default() -> Self {
        Self {
            projection: IDENTITY,
            inverse_volume: IDENTITY,
        }
    }
}

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Which render phase a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    /// Drawn in volume space, depth tested against the scene.
    Scene3D,
    /// Drawn in screen space on top of everything.
    Screen2D,
}

/// Primitive topology of a geometry draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Connected line strip.
    LineStrip,
    /// Independent line segments.
    Lines,
}

/// A draw command for the host renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Indexed geometry.
    Geometry {
        /// Overlay that issued the command.
        overlay: String,
        /// Render phase.
        phase: RenderPhase,
        /// Topology.
        primitive: Primitive,
        /// Vertex bytes ready for upload.
        vertices: Vec<u8>,
        /// Index bytes (`u32`) ready for upload.
        indices: Vec<u8>,
        /// Number of indices to draw.
        index_count: u32,
        /// RGBA color.
        color: [f32; 4],
        /// Transform applied to the vertices.
        transform: Mat4,
    },
    /// Screen-space text.
    Text {
        /// Overlay that issued the command.
        overlay: String,
        /// Text content.
        text: String,
        /// X position in pixels.
        x: f32,
        /// Y position in pixels.
        y: f32,
        /// Font family.
        font_family: String,
        /// Font size in points.
        font_size: f32,
        /// RGBA color.
        color: [f32; 4],
    },
}

impl DrawCommand {
    /// Name of the overlay that issued the command.
    #[must_use]
    pub fn overlay(&self) -> &str {
        match self {
            Self::Geometry { overlay, .. } | Self::Text { overlay, .. } => overlay,
        }
    }
}

/// Commands collected during one frame.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(64),
        }
    }

    /// Begins a new frame.
    pub fn begin_frame(&mut self) {
        self.commands.clear();
    }

    /// Adds a command.
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// All commands of the frame, in submission order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if nothing was drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands issued by one overlay.
    pub fn by_overlay<'a>(&'a self, overlay: &'a str) -> impl Iterator<Item = &'a DrawCommand> + 'a {
        self.commands.iter().filter(move |c| c.overlay() == overlay)
    }
}

/// Everything a render phase gets to work with.
pub struct FrameContext<'a> {
    draw_list: &'a mut DrawList,
    /// Transforms of the current frame.
    pub transforms: FrameTransforms,
    /// Viewport of the current frame.
    pub viewport: Viewport,
    /// Bounded wait for channel locks.
    pub lock_timeout: Duration,
}

impl<'a> FrameContext<'a> {
    /// Creates a frame context writing into `draw_list`.
    pub fn new(
        draw_list: &'a mut DrawList,
        transforms: FrameTransforms,
        viewport: Viewport,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            draw_list,
            transforms,
            viewport,
            lock_timeout,
        }
    }

    /// Frame context with identity transforms and the default lock timeout.
    pub fn with_defaults(draw_list: &'a mut DrawList, viewport: Viewport) -> Self {
        Self::new(
            draw_list,
            FrameTransforms::default(),
            viewport,
            Duration::from_millis(DEFAULT_RENDER_LOCK_TIMEOUT_MS),
        )
    }

    /// Issues a draw command.
    pub fn draw(&mut self, command: DrawCommand) {
        self.draw_list.push(command);
    }

    /// Commands issued so far this frame.
    #[must_use]
    pub fn draw_list(&self) -> &DrawList {
        self.draw_list
    }
}

/// One-time initialization context.
pub struct InitContext<'a> {
    /// Active backend.
    pub backend: &'a BackendDescriptor,
    /// Where fonts and other resources come from.
    pub assets: &'a dyn AssetSource,
    /// Capacity for channels created during initialization.
    pub channel_capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(overlay: &str) -> DrawCommand {
        DrawCommand::Text {
            overlay: overlay.to_string(),
            text: "hello".to_string(),
            x: 0.0,
            y: 0.0,
            font_family: "Sans".to_string(),
            font_size: 12.0,
            color: [1.0; 4],
        }
    }

    #[test]
    fn test_scene_transform() {
        let mut scale = IDENTITY;
        scale[0][0] = 2.0;
        let mut translate = IDENTITY;
        translate[3][0] = 5.0;

        let transforms = FrameTransforms {
            projection: scale,
            inverse_volume: translate,
        };
        let scene = transforms.scene();
        assert_eq!(scene[0][0], 2.0);
        assert_eq!(scene[3][0], 10.0);
        assert_eq!(FrameTransforms::default().scene(), IDENTITY);
    }

    #[test]
    fn test_draw_list_frames() {
        let mut list = DrawList::new();
        {
            let mut frame = FrameContext::with_defaults(&mut list, Viewport::new(640, 480));
            frame.draw(text("a"));
            frame.draw(text("b"));
            frame.draw(text("a"));
            assert_eq!(frame.draw_list().len(), 3);
        }

        assert_eq!(list.by_overlay("a").count(), 2);
        list.begin_frame();
        assert!(list.is_empty());
    }
}
