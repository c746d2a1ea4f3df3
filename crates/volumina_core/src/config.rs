//! # Pipeline Configuration
//!
//! Loaded once at startup from a TOML file:
//!
//! ```toml
//! channel_capacity = 256
//! render_lock_timeout_ms = 10
//! frame_budget_us = 16666
//! failure_threshold = 5
//!
//! [overlays]
//! graph = true
//! box = false
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::DEFAULT_CHANNEL_CAPACITY;
use crate::error::{OverlayError, OverlayResult};

/// Default bounded wait for render-phase channel locks.
pub const DEFAULT_RENDER_LOCK_TIMEOUT_MS: u64 = 10;

/// Default frame budget (~60 FPS).
pub const DEFAULT_FRAME_BUDGET_US: u64 = 16_666;

/// Overlay pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Capacity of newly created overlay channels.
    pub channel_capacity: usize,
    /// Bounded wait for channel locks inside render phases (milliseconds).
    pub render_lock_timeout_ms: u64,
    /// Frame time above which a frame is reported as over budget.
    pub frame_budget_us: u64,
    /// Consecutive failures after which a processor deactivates itself.
    /// `None` keeps retrying forever.
    pub failure_threshold: Option<u32>,
    /// Initial displayed state per overlay name.
    pub overlays: HashMap<String, bool>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            render_lock_timeout_ms: DEFAULT_RENDER_LOCK_TIMEOUT_MS,
            frame_budget_us: DEFAULT_FRAME_BUDGET_US,
            failure_threshold: None,
            overlays: HashMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Config`] on malformed TOML or invalid values.
    pub fn from_toml_str(source: &str) -> OverlayResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| OverlayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Io`] if the file cannot be read and
    /// [`OverlayError::Config`] if its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::Config`] describing the first invalid value.
    pub fn validate(&self) -> OverlayResult<()> {
        if self.channel_capacity == 0 {
            return Err(OverlayError::Config(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.render_lock_timeout_ms == 0 {
            return Err(OverlayError::Config(
                "render_lock_timeout_ms must be at least 1".to_string(),
            ));
        }
        if self.failure_threshold == Some(0) {
            return Err(OverlayError::Config(
                "failure_threshold must be at least 1 (omit it to never deactivate)".to_string(),
            ));
        }
        Ok(())
    }

    /// Render-phase lock timeout.
    #[must_use]
    pub fn render_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.render_lock_timeout_ms)
    }

    /// Frame budget.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        Duration::from_micros(self.frame_budget_us)
    }

    /// Initial displayed state configured for `overlay`, if any.
    #[must_use]
    pub fn initially_displayed(&self, overlay: &str) -> Option<bool> {
        self.overlays.get(overlay).copied()
    }
}
