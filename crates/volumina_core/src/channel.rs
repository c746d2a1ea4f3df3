//! # Bounded Channels
//!
//! A [`BoundedChannel`] stages values written by producer threads until the
//! render thread draws them.
//!
//! ```text
//! Producer (blocking lock)            Render thread (bounded wait)
//!   append(v) ──► [ oldest ... newest ] ──► try_take_snapshot(10ms)
//!                   len <= capacity            │
//!                                              ├── Some(copy) -> rebuild + draw
//!                                              └── None       -> skip this frame
//! ```
//!
//! ## Rules
//!
//! - `len() <= capacity()` after every append (oldest values are evicted first)
//! - Producers may block on the lock, the render thread never waits longer
//!   than the timeout it passes in
//! - Render code iterates over a copy, never over the locked contents

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::display::DisplayLink;
use crate::error::{OverlayError, OverlayResult};

/// Default number of values kept by a channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 512;

/// Thread-safe, capacity-bounded FIFO of the latest values.
pub struct BoundedChannel<T> {
    /// Values, oldest at the front.
    values: Mutex<VecDeque<T>>,
    /// Maximum number of retained values.
    capacity: AtomicUsize,
    /// Set by mutations, cleared by the render phase under the lock.
    changed: AtomicBool,
    /// Where successful appends send their redraw hint.
    display: RwLock<DisplayLink>,
}

impl<T: Clone> BoundedChannel<T> {
    /// Creates a channel with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::build(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a channel holding at most `capacity` values.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::InvalidCapacity`] if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> OverlayResult<Self> {
        if capacity == 0 {
            return Err(OverlayError::InvalidCapacity(capacity));
        }
        Ok(Self::build(capacity))
    }

    fn build(capacity: usize) -> Self {
        Self {
            values: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: AtomicUsize::new(capacity),
            changed: AtomicBool::new(false),
            display: RwLock::new(DisplayLink::detached()),
        }
    }

    /// Routes display requests of future appends to `link`.
    pub fn attach_display(&self, link: DisplayLink) {
        *self.display.write() = link;
    }

    /// Appends a value, evicting the oldest ones beyond capacity.
    ///
    /// Blocks until the lock is available, then requests a display once the
    /// lock has been released.
    pub fn append(&self, value: T) {
        {
            let mut values = self.values.lock();
            values.push_back(value);
            let capacity = self.capacity.load(Ordering::Acquire);
            while values.len() > capacity {
                values.pop_front();
            }
            self.changed.store(true, Ordering::Release);
        }

        self.display.read().request();
    }

    /// Appends several values under a single lock acquisition.
    pub fn extend<I: IntoIterator<Item = T>>(&self, iter: I) {
        {
            let mut values = self.values.lock();
            values.extend(iter);
            let capacity = self.capacity.load(Ordering::Acquire);
            while values.len() > capacity {
                values.pop_front();
            }
            self.changed.store(true, Ordering::Release);
        }

        self.display.read().request();
    }

    /// Removes every value.
    pub fn clear(&self) {
        let mut values = self.values.lock();
        values.clear();
        self.changed.store(true, Ordering::Release);
    }

    /// Returns a consistent copy of the current contents (blocking).
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.values.lock().iter().cloned().collect()
    }

    /// Render-phase snapshot with a bounded wait.
    ///
    /// Returns `None` if the lock could not be acquired within `timeout`;
    /// the changed flag is then left untouched. On success the changed flag
    /// is cleared while the lock is still held, so an append that lands
    /// right after the copy marks the channel dirty again.
    #[must_use]
    pub fn try_take_snapshot(&self, timeout: Duration) -> Option<Vec<T>> {
        let values = self.values.try_lock_for(timeout)?;
        let copy = values.iter().cloned().collect();
        self.changed.store(false, Ordering::Release);
        Some(copy)
    }

    /// Locks the channel for inspection (blocking).
    ///
    /// Render code must not use this; it exists for producers that need a
    /// consistent multi-value read and for exercising contention.
    #[must_use]
    pub fn lock(&self) -> ChannelGuard<'_, T> {
        ChannelGuard {
            guard: self.values.lock(),
        }
    }

    /// Changes the capacity. Existing excess values are only evicted by the
    /// next append.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::InvalidCapacity`] if `capacity` is zero.
    pub fn set_capacity(&self, capacity: usize) -> OverlayResult<()> {
        if capacity == 0 {
            return Err(OverlayError::InvalidCapacity(capacity));
        }
        self.capacity.store(capacity, Ordering::Release);
        Ok(())
    }

    /// Returns the current capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Returns true if the channel holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    /// Returns true if the contents changed since the last render snapshot.
    #[inline]
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }

    /// Returns the newest value, if any.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.values.lock().back().cloned()
    }
}

impl<T: Clone> Default for BoundedChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for BoundedChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedChannel")
            .field("capacity", &self.capacity.load(Ordering::Relaxed))
            .field("changed", &self.changed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Blocking read guard over a channel's contents.
///
/// Holding it blocks producers and makes render phases skip their draw.
pub struct ChannelGuard<'a, T> {
    guard: MutexGuard<'a, VecDeque<T>>,
}

impl<T> Deref for ChannelGuard<'_, T> {
    type Target = VecDeque<T>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}
