//! Tenengrad image sharpness: mean squared Sobel gradient magnitude of the
//! middle z-slice, with intensities scaled to `[0, 1]`.

use volumina_core::{
    BackendDescriptor, Hotkey, OverlayResult, ProcessRequest, Processor, ProcessorCore,
    Toggleable,
};

/// Sharpness metric of the current volume.
pub struct TenengradProcessor {
    core: ProcessorCore<f64>,
}

impl TenengradProcessor {
    /// Creates an active processor named `tenengrad`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: ProcessorCore::new("tenengrad"),
        }
    }

    /// Tenengrad measure of one `width` x `height` slice.
    ///
    /// Returns `None` if the slice has no interior pixel.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn measure_slice(slice: &[u8], width: usize, height: usize) -> Option<f64> {
        if width < 3 || height < 3 || slice.len() < width * height {
            return None;
        }
        let px = |x: usize, y: usize| f64::from(slice[y * width + x]) / 255.0;

        let mut sum = 0.0;
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let gx = (px(x + 1, y - 1) + 2.0 * px(x + 1, y) + px(x + 1, y + 1))
                    - (px(x - 1, y - 1) + 2.0 * px(x - 1, y) + px(x - 1, y + 1));
                let gy = (px(x - 1, y + 1) + 2.0 * px(x, y + 1) + px(x + 1, y + 1))
                    - (px(x - 1, y - 1) + 2.0 * px(x, y - 1) + px(x + 1, y - 1));
                sum += gx * gx + gy * gy;
            }
        }
        Some(sum / ((width - 2) * (height - 2)) as f64)
    }
}

impl Default for TenengradProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Toggleable for TenengradProcessor {
    fn toggle(&self) -> bool {
        self.core.toggle()
    }

    fn hotkey(&self) -> Option<Hotkey> {
        self.core.hotkey()
    }
}

impl Processor for TenengradProcessor {
    type Output = f64;

    fn core(&self) -> &ProcessorCore<f64> {
        &self.core
    }

    fn is_compatible_processor(&self, backend: &BackendDescriptor) -> bool {
        backend.has_voxel_readback()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn compute(&self, request: &ProcessRequest<'_>) -> OverlayResult<Option<f64>> {
        let voxels = request.require_voxels(self.core.name())?;
        let width = request.width as usize;
        let height = request.height as usize;
        let plane = width * height;
        if plane == 0 || request.depth == 0 {
            return Ok(None);
        }

        let z = request.depth as usize / 2;
        Ok(Self::measure_slice(&voxels[z * plane..(z + 1) * plane], width, height))
    }
}
