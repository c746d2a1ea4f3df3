//! # Overlay Contract
//!
//! An overlay is drawn on top of the rendered volume, either in volume space
//! ([`Overlay::render_3d`]) or in screen space ([`Overlay::render_2d`]).
//!
//! ## State machine
//!
//! ```text
//!            toggle()
//!   Hidden ◄──────────► Displayed
//!     │                    │
//!     │ render: no-op      │ render: bounded-wait snapshot
//!     ▼                    ▼
//!  RenderOutcome::Hidden   Contended | Redrawn | Rebuilt
//! ```
//!
//! Both render phases are called every frame. Overlays honor their displayed
//! flag themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::channel::BoundedChannel;
use crate::display::DisplayLink;
use crate::frame::{FrameContext, InitContext};
use crate::toggle::{Hotkey, Toggleable};

/// Result of one render phase call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The overlay is hidden; nothing happened.
    Hidden,
    /// The overlay has nothing to draw in this phase.
    Idle,
    /// The channel lock was not acquired in time; the draw was skipped and
    /// the changed flag left set.
    Contended,
    /// Unchanged data; cached geometry was drawn again.
    Redrawn,
    /// Fresh snapshot; geometry was rebuilt and drawn.
    Rebuilt,
}

impl RenderOutcome {
    /// Returns true if draw commands were issued.
    #[must_use]
    pub const fn drew(self) -> bool {
        matches!(self, Self::Redrawn | Self::Rebuilt)
    }
}

/// A renderable element with a visibility toggle.
pub trait Overlay: Toggleable + Send {
    /// Stable identifier, used in menus and configuration.
    fn name(&self) -> &str;

    /// One-time setup. Stores the display link and builds initial resources.
    /// Missing assets degrade to defaults; initialization itself never fails.
    fn init(&mut self, ctx: &InitContext<'_>, display: DisplayLink);

    /// Returns true if the overlay is displayed.
    fn is_displayed(&self) -> bool;

    /// Shows or hides the overlay.
    fn set_displayed(&self, displayed: bool);

    /// Returns true if data changed since the last successful render.
    fn has_changed(&self) -> bool;

    /// Volume-space phase.
    fn render_3d(&mut self, _frame: &mut FrameContext<'_>) -> RenderOutcome {
        if self.is_displayed() {
            RenderOutcome::Idle
        } else {
            RenderOutcome::Hidden
        }
    }

    /// Screen-space phase.
    fn render_2d(&mut self, _frame: &mut FrameContext<'_>) -> RenderOutcome {
        if self.is_displayed() {
            RenderOutcome::Idle
        } else {
            RenderOutcome::Hidden
        }
    }
}

/// Overlay fed through a [`BoundedChannel`].
pub trait ChannelOverlay: Overlay {
    /// Channel element type.
    type Sample: Clone + Send + Sync + 'static;

    /// The overlay's channel.
    fn channel(&self) -> &Arc<BoundedChannel<Self::Sample>>;
}

/// What a render phase should do with a channel this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh<T> {
    /// The overlay is hidden.
    Hidden,
    /// The lock was not acquired in time.
    Contended,
    /// Nothing changed; reuse cached geometry.
    Unchanged,
    /// Fresh copy of the channel contents.
    Snapshot(Vec<T>),
}

/// Displayed flag, name, hotkey and display link shared by every overlay.
#[derive(Debug)]
pub struct OverlayState {
    name: String,
    displayed: AtomicBool,
    hotkey: Option<Hotkey>,
    display: DisplayLink,
}

impl OverlayState {
    /// Creates a hidden overlay state.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            displayed: AtomicBool::new(false),
            hotkey: None,
            display: DisplayLink::detached(),
        }
    }

    /// Starts displayed.
    #[must_use]
    pub fn shown(self) -> Self {
        self.displayed.store(true, Ordering::Release);
        self
    }

    /// Binds a hotkey.
    #[must_use]
    pub fn with_hotkey(mut self, hotkey: Hotkey) -> Self {
        self.hotkey = Some(hotkey);
        self
    }

    /// Overlay name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound hotkey.
    #[must_use]
    pub fn hotkey(&self) -> Option<Hotkey> {
        self.hotkey
    }

    /// Stores the host's display link.
    pub fn attach(&mut self, display: DisplayLink) {
        self.display = display;
    }

    /// The host's display link.
    #[must_use]
    pub fn display_link(&self) -> &DisplayLink {
        &self.display
    }

    /// Returns true if displayed.
    #[inline]
    #[must_use]
    pub fn is_displayed(&self) -> bool {
        self.displayed.load(Ordering::Acquire)
    }

    /// Sets the displayed flag. Returns the previous value.
    pub fn set_displayed(&self, displayed: bool) -> bool {
        let previous = self.displayed.swap(displayed, Ordering::AcqRel);
        if previous != displayed {
            self.display.request();
        }
        previous
    }

    /// Flips the displayed flag and returns the new value.
    pub fn toggle(&self) -> bool {
        let displayed = !self.displayed.fetch_xor(true, Ordering::AcqRel);
        self.display.request();
        displayed
    }

    /// Decides what to draw from `channel` this frame.
    ///
    /// `force` requests a snapshot even without changes, for overlays that
    /// have no geometry yet. Waits at most `timeout` for the lock.
    pub fn refresh<T: Clone>(
        &self,
        channel: &BoundedChannel<T>,
        timeout: Duration,
        force: bool,
    ) -> Refresh<T> {
        if !self.is_displayed() {
            return Refresh::Hidden;
        }
        if !force && !channel.has_changed() {
            return Refresh::Unchanged;
        }
        match channel.try_take_snapshot(timeout) {
            Some(values) => Refresh::Snapshot(values),
            None => {
                tracing::trace!("Overlay '{}' skipped a frame on lock contention", self.name);
                Refresh::Contended
            }
        }
    }
}
