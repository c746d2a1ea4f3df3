//! Staging buffers for overlay geometry.
//!
//! Vertex and index data are rebuilt from a channel snapshot on the render
//! thread, then handed to the host as byte slices. The tracked GPU capacity
//! only grows, so a steady-size overlay reallocates once.

use bytemuck::{Pod, Zeroable};

use volumina_core::{DrawCommand, Mat4, Primitive, RenderPhase};

/// Smallest GPU allocation, in vertices.
pub const MIN_GPU_CAPACITY: usize = 16;

/// Vertex uploaded for overlay lines.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct OverlayVertex {
    /// Position (x, y, z).
    pub position: [f32; 3],
}

impl OverlayVertex {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a vertex.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
        }
    }
}

/// CPU-side geometry of one overlay.
#[derive(Debug, Default)]
pub struct GeometryBuffer {
    vertices: Vec<OverlayVertex>,
    indices: Vec<u32>,
    /// Vertices the GPU-side buffer can hold.
    gpu_capacity: usize,
    reallocations: u32,
}

impl GeometryBuffer {
    /// Creates an empty buffer with room for `capacity` vertices.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let gpu_capacity = capacity.max(MIN_GPU_CAPACITY);
        Self {
            vertices: Vec::with_capacity(gpu_capacity),
            indices: Vec::with_capacity(gpu_capacity),
            gpu_capacity,
            reallocations: 0,
        }
    }

    /// Starts a rebuild. Keeps allocations.
    pub fn begin(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Adds a vertex and returns its index.
    #[inline]
    pub fn push_vertex(&mut self, vertex: OverlayVertex) -> u32 {
        let index = u32::try_from(self.vertices.len()).unwrap_or(u32::MAX);
        self.vertices.push(vertex);
        index
    }

    /// Appends a connected strip through `points`.
    pub fn line_strip<I: IntoIterator<Item = OverlayVertex>>(&mut self, points: I) {
        for vertex in points {
            let index = self.push_vertex(vertex);
            self.indices.push(index);
        }
    }

    /// Appends one independent segment.
    pub fn segment(&mut self, a: OverlayVertex, b: OverlayVertex) {
        let ia = self.push_vertex(a);
        let ib = self.push_vertex(b);
        self.indices.extend_from_slice(&[ia, ib]);
    }

    /// Ends a rebuild. Returns true if the GPU buffer had to grow.
    pub fn finish(&mut self) -> bool {
        if self.vertices.len() <= self.gpu_capacity {
            return false;
        }
        self.gpu_capacity = self.vertices.len().next_power_of_two();
        self.reallocations += 1;
        tracing::debug!(
            "Overlay geometry grew to {} vertices ({} reallocations)",
            self.gpu_capacity,
            self.reallocations
        );
        true
    }

    /// Vertices of the last rebuild.
    #[must_use]
    pub fn vertices(&self) -> &[OverlayVertex] {
        &self.vertices
    }

    /// Number of indices to draw.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        u32::try_from(self.indices.len()).unwrap_or(u32::MAX)
    }

    /// Returns true if there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Vertex data as bytes for GPU upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as bytes for GPU upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Vertices the GPU-side buffer can hold.
    #[must_use]
    pub const fn gpu_capacity(&self) -> usize {
        self.gpu_capacity
    }

    /// Times the GPU-side buffer had to grow.
    #[must_use]
    pub const fn reallocations(&self) -> u32 {
        self.reallocations
    }

    /// Packs the current geometry into a draw command.
    #[must_use]
    pub fn draw_command(
        &self,
        overlay: &str,
        phase: RenderPhase,
        primitive: Primitive,
        color: [f32; 4],
        transform: Mat4,
    ) -> DrawCommand {
        DrawCommand::Geometry {
            overlay: overlay.to_string(),
            phase,
            primitive,
            vertices: self.vertex_bytes().to_vec(),
            indices: self.index_bytes().to_vec(),
            index_count: self.index_count(),
            color,
            transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volumina_core::IDENTITY;

    #[test]
    fn test_line_strip_indices() {
        let mut buffer = GeometryBuffer::with_capacity(4);
        buffer.begin();
        buffer.line_strip((0..3u8).map(|i| OverlayVertex::new(f32::from(i), 0.0, 0.0)));
        assert!(!buffer.finish());

        assert_eq!(buffer.index_count(), 3);
        assert_eq!(buffer.index_bytes().len(), 3 * 4);
        assert_eq!(buffer.vertex_bytes().len(), 3 * OverlayVertex::SIZE);
    }

    #[test]
    fn test_capacity_only_grows() {
        let mut buffer = GeometryBuffer::with_capacity(16);

        buffer.begin();
        buffer.line_strip((0..40u8).map(|i| OverlayVertex::new(f32::from(i), 0.0, 0.0)));
        assert!(buffer.finish());
        assert_eq!(buffer.gpu_capacity(), 64);

        buffer.begin();
        buffer.line_strip((0..10u8).map(|i| OverlayVertex::new(f32::from(i), 0.0, 0.0)));
        assert!(!buffer.finish());
        assert_eq!(buffer.gpu_capacity(), 64);
        assert_eq!(buffer.reallocations(), 1);
    }

    #[test]
    fn test_segments_and_command() {
        let mut buffer = GeometryBuffer::default();
        buffer.begin();
        buffer.segment(OverlayVertex::new(0.0, 0.0, 0.0), OverlayVertex::new(1.0, 0.0, 0.0));
        buffer.finish();

        match buffer.draw_command("box", RenderPhase::Scene3D, Primitive::Lines, [1.0; 4], IDENTITY) {
            DrawCommand::Geometry {
                index_count,
                primitive,
                ..
            } => {
                assert_eq!(index_count, 2);
                assert_eq!(primitive, Primitive::Lines);
            }
            DrawCommand::Text { .. } => panic!("expected geometry"),
        }
    }
}
