//! Intensity-weighted centroid of the volume, in volume coordinates
//! (`[-1, 1]` on every axis).

use volumina_core::{
    BackendDescriptor, Hotkey, OverlayResult, ProcessRequest, Processor, ProcessorCore,
    Toggleable,
};

/// Tracks the center of mass of the rendered volume.
pub struct CentroidTracker {
    core: ProcessorCore<[f32; 3]>,
    /// Voxels at or below this intensity do not contribute.
    threshold: u8,
}

impl CentroidTracker {
    /// Creates an active tracker named `centroid`.
    #[must_use]
    pub fn new(threshold: u8) -> Self {
        Self {
            core: ProcessorCore::new("centroid"),
            threshold,
        }
    }
}

/// Maps voxel index `i` of `n` to the center of its cell in `[-1, 1]`.
#[allow(clippy::cast_precision_loss)]
fn to_volume(i: f64, n: u64) -> f32 {
    #[allow(clippy::cast_possible_truncation)]
    let coordinate = (2.0 * (i + 0.5) / n as f64 - 1.0) as f32;
    coordinate
}

impl Toggleable for CentroidTracker {
    fn toggle(&self) -> bool {
        self.core.toggle()
    }

    fn hotkey(&self) -> Option<Hotkey> {
        self.core.hotkey()
    }
}

impl Processor for CentroidTracker {
    type Output = [f32; 3];

    fn core(&self) -> &ProcessorCore<[f32; 3]> {
        &self.core
    }

    fn is_compatible_processor(&self, backend: &BackendDescriptor) -> bool {
        backend.has_voxel_readback()
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute(&self, request: &ProcessRequest<'_>) -> OverlayResult<Option<[f32; 3]>> {
        let voxels = request.require_voxels(self.core.name())?;
        let (width, height) = (request.width, request.height);

        let mut total = 0.0f64;
        let mut weighted = [0.0f64; 3];
        for (index, &value) in (0u64..).zip(voxels) {
            if value <= self.threshold {
                continue;
            }
            let weight = f64::from(value);
            let x = index % width;
            let y = (index / width) % height;
            let z = index / (width * height);
            weighted[0] += weight * x as f64;
            weighted[1] += weight * y as f64;
            weighted[2] += weight * z as f64;
            total += weight;
        }

        if total == 0.0 {
            return Ok(None);
        }
        Ok(Some([
            to_volume(weighted[0] / total, request.width),
            to_volume(weighted[1] / total, request.height),
            to_volume(weighted[2] / total, request.depth),
        ]))
    }
}
