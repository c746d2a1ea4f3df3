//! Seeded random walk producing displacement deltas, for driving drift
//! overlays without a real tracker.

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use volumina_core::{
    BackendDescriptor, Hotkey, OverlayResult, ProcessRequest, Processor, ProcessorCore,
    Toggleable,
};

/// Default maximum displacement per step and axis.
pub const DEFAULT_STEP: f32 = 0.005;

/// Emits one random `[dx, dy, dz]` per invocation.
pub struct RandomWalk {
    core: ProcessorCore<[f32; 3]>,
    rng: Mutex<ChaCha8Rng>,
    step: f32,
}

impl RandomWalk {
    /// Creates a walk named `random_walk`. The same seed yields the same
    /// sequence of deltas.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            core: ProcessorCore::new("random_walk"),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            step: DEFAULT_STEP,
        }
    }

    /// Sets the maximum displacement per step and axis.
    #[must_use]
    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step.abs();
        self
    }

    /// Binds a hotkey.
    #[must_use]
    pub fn with_hotkey(mut self, hotkey: Hotkey) -> Self {
        self.core = self.core.with_hotkey(hotkey);
        self
    }
}

impl Toggleable for RandomWalk {
    fn toggle(&self) -> bool {
        self.core.toggle()
    }

    fn hotkey(&self) -> Option<Hotkey> {
        self.core.hotkey()
    }
}

impl Processor for RandomWalk {
    type Output = [f32; 3];

    fn core(&self) -> &ProcessorCore<[f32; 3]> {
        &self.core
    }

    fn is_compatible_processor(&self, _backend: &BackendDescriptor) -> bool {
        true
    }

    fn compute(&self, _request: &ProcessRequest<'_>) -> OverlayResult<Option<[f32; 3]>> {
        if self.step == 0.0 {
            return Ok(Some([0.0; 3]));
        }
        let mut rng = self.rng.lock();
        let mut delta = [0.0f32; 3];
        for axis in &mut delta {
            *axis = rng.gen_range(-self.step..=self.step);
        }
        Ok(Some(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(walk: &RandomWalk, n: usize) -> Vec<[f32; 3]> {
        let request = ProcessRequest::new(0, 1, 1, 1);
        (0..n)
            .map(|_| walk.compute(&request).unwrap().unwrap())
            .collect()
    }

    #[test]
    fn test_same_seed_same_walk() {
        assert_eq!(deltas(&RandomWalk::new(7), 10), deltas(&RandomWalk::new(7), 10));
        assert_ne!(deltas(&RandomWalk::new(7), 10), deltas(&RandomWalk::new(8), 10));
    }

    #[test]
    fn test_steps_are_bounded() {
        let walk = RandomWalk::new(1).with_step(0.1);
        for delta in deltas(&walk, 100) {
            assert!(delta.iter().all(|d| d.abs() <= 0.1));
        }
    }

    #[test]
    fn test_always_compatible() {
        let walk = RandomWalk::new(1);
        assert!(walk.is_compatible_processor(&BackendDescriptor::raster_only("gl")));
    }
}
