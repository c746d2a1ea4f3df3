//! Description of the renderer backend hosting the pipeline.
//!
//! Processors inspect it once, at registration, to decide whether they can
//! run at all.

/// Capabilities a processor may depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// Backend can run general compute kernels.
    pub compute_kernels: bool,
    /// Voxel data of the rendered volume can be read back on the host.
    pub voxel_readback: bool,
}

/// Identifies the active renderer backend and what it supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    /// Backend name, for logs and menus.
    pub name: String,
    /// Supported capabilities.
    pub capabilities: BackendCapabilities,
}

impl BackendDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, capabilities: BackendCapabilities) -> Self {
        Self {
            name: name.into(),
            capabilities,
        }
    }

    /// Backend with compute kernels and voxel readback.
    #[must_use]
    pub fn compute(name: impl Into<String>) -> Self {
        Self::new(
            name,
            BackendCapabilities {
                compute_kernels: true,
                voxel_readback: true,
            },
        )
    }

    /// Plain raster backend: no compute, no readback.
    #[must_use]
    pub fn raster_only(name: impl Into<String>) -> Self {
        Self::new(name, BackendCapabilities::default())
    }

    /// Returns true if compute kernels are available.
    #[inline]
    #[must_use]
    pub const fn has_compute(&self) -> bool {
        self.capabilities.compute_kernels
    }

    /// Returns true if voxel data can be read back.
    #[inline]
    #[must_use]
    pub const fn has_voxel_readback(&self) -> bool {
        self.capabilities.voxel_readback
    }
}
