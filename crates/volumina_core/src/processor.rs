//! # Processors and Result Listeners
//!
//! A processor turns the current volume into a typed result once per
//! invocation and fans it out to its listeners.
//!
//! ```text
//! compute thread:  process(request)
//!                     │ inactive? ──► skipped
//!                     ▼
//!                  compute() ──Err/panic──► warn!, count, maybe deactivate
//!                     │ Ok(Some(result))
//!                     ▼
//!                  ListenerRegistry::notify ──► listener #1 (overlay channel)
//!                                          └─► listener #2 (auxiliary cache)
//! ```
//!
//! ## Ownership
//!
//! The registry only keeps [`Weak`] references. Whoever registers a
//! listener keeps it alive; dropping it silently unregisters it. Listeners
//! never hold the processor either, so the two sides can be torn down in any
//! order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::backend::BackendDescriptor;
use crate::channel::BoundedChannel;
use crate::error::{OverlayError, OverlayResult};
use crate::toggle::{Hotkey, Toggleable};

/// Subscriber to a processor's results.
///
/// Called synchronously on the processor's thread, which is generally not
/// the render thread.
pub trait ResultListener<R>: Send + Sync {
    /// Receives one result from the processor named `source`.
    fn notify_result(&self, source: &str, result: &R);
}

impl<R, F> ResultListener<R> for F
where
    F: Fn(&str, &R) + Send + Sync,
{
    fn notify_result(&self, source: &str, result: &R) {
        self(source, result);
    }
}

impl<T: Clone + Send> ResultListener<T> for BoundedChannel<T> {
    fn notify_result(&self, _source: &str, result: &T) {
        self.append(result.clone());
    }
}

/// Handle returned by listener registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

struct ListenerEntry<R> {
    token: ListenerToken,
    listener: Weak<dyn ResultListener<R>>,
}

/// Lock-guarded, per-processor listener list.
pub struct ListenerRegistry<R> {
    entries: Mutex<Vec<ListenerEntry<R>>>,
    next_token: AtomicU64,
}

impl<R: 'static> ListenerRegistry<R> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Registers a listener. Duplicates are accepted and notified once per
    /// registration.
    pub fn add(&self, listener: &Arc<dyn ResultListener<R>>) -> ListenerToken {
        let token = ListenerToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push(ListenerEntry {
            token,
            listener: Arc::downgrade(listener),
        });
        token
    }

    /// Registers a concrete listener.
    pub fn add_listener<L: ResultListener<R> + 'static>(&self, listener: &Arc<L>) -> ListenerToken {
        let listener: Arc<dyn ResultListener<R>> = listener.clone();
        self.add(&listener)
    }

    /// Unregisters a listener. Returns false if the token is unknown.
    pub fn remove(&self, token: ListenerToken) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| entry.token != token);
        entries.len() != before
    }

    /// Number of registered listeners that are still alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.listener.strong_count() > 0)
            .count()
    }

    /// Returns true if no live listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `result` to every live listener in registration order and
    /// returns how many were called.
    ///
    /// Listeners run outside the registry lock, so they may add or remove
    /// registrations themselves.
    pub fn notify(&self, source: &str, result: &R) -> usize {
        let live: Vec<Arc<dyn ResultListener<R>>> = {
            let mut entries = self.entries.lock();
            entries.retain(|entry| entry.listener.strong_count() > 0);
            entries.iter().filter_map(|entry| entry.listener.upgrade()).collect()
        };

        for listener in &live {
            listener.notify_result(source, result);
        }
        live.len()
    }
}

impl<R: 'static> Default for ListenerRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Context of one processor invocation: the current render target.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRequest<'a> {
    /// Render layer being processed.
    pub layer_index: usize,
    /// Volume width in voxels.
    pub width: u64,
    /// Volume height in voxels.
    pub height: u64,
    /// Volume depth in voxels.
    pub depth: u64,
    /// Voxel intensities, x fastest then y then z, if readback is available.
    pub voxels: Option<&'a [u8]>,
}

impl<'a> ProcessRequest<'a> {
    /// Creates a request without voxel data.
    #[must_use]
    pub const fn new(layer_index: usize, width: u64, height: u64, depth: u64) -> Self {
        Self {
            layer_index,
            width,
            height,
            depth,
            voxels: None,
        }
    }

    /// Attaches voxel data.
    #[must_use]
    pub const fn with_voxels(mut self, voxels: &'a [u8]) -> Self {
        self.voxels = Some(voxels);
        self
    }

    /// Number of voxels described by the dimensions, `None` on overflow.
    #[must_use]
    pub fn voxel_count(&self) -> Option<u64> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.depth)
    }

    /// Returns the voxel data, checked against the dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::MissingVolume`] if no data is attached and
    /// [`OverlayError::ProcessingFailed`] if its length does not match or
    /// the dimensions overflow.
    pub fn require_voxels(&self, processor: &str) -> OverlayResult<&'a [u8]> {
        let voxels = self
            .voxels
            .ok_or_else(|| OverlayError::MissingVolume(processor.to_string()))?;
        let expected = self.voxel_count().ok_or_else(|| OverlayError::ProcessingFailed {
            processor: processor.to_string(),
            reason: format!(
                "volume {}x{}x{} is too large",
                self.width, self.height, self.depth
            ),
        })?;
        if voxels.len() as u64 != expected {
            return Err(OverlayError::ProcessingFailed {
                processor: processor.to_string(),
                reason: format!(
                    "expected {} voxels for {}x{}x{}, got {}",
                    expected,
                    self.width,
                    self.height,
                    self.depth,
                    voxels.len()
                ),
            });
        }
        Ok(voxels)
    }
}

/// Counters of a processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Invocations that actually computed (active ones).
    pub runs: u64,
    /// Failed computations.
    pub failures: u64,
    /// Failures since the last success.
    pub consecutive_failures: u32,
}

/// State shared by every processor: name, activity, listeners, failures.
pub struct ProcessorCore<R> {
    name: String,
    active: AtomicBool,
    hotkey: Option<Hotkey>,
    listeners: ListenerRegistry<R>,
    /// 0 means never deactivate.
    failure_threshold: AtomicU32,
    consecutive_failures: AtomicU32,
    failures: AtomicU64,
    runs: AtomicU64,
}

impl<R: 'static> ProcessorCore<R> {
    /// Creates an active processor core.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: AtomicBool::new(true),
            hotkey: None,
            listeners: ListenerRegistry::new(),
            failure_threshold: AtomicU32::new(0),
            consecutive_failures: AtomicU32::new(0),
            failures: AtomicU64::new(0),
            runs: AtomicU64::new(0),
        }
    }

    /// Binds a hotkey.
    #[must_use]
    pub fn with_hotkey(mut self, hotkey: Hotkey) -> Self {
        self.hotkey = Some(hotkey);
        self
    }

    /// Processor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound hotkey.
    #[must_use]
    pub fn hotkey(&self) -> Option<Hotkey> {
        self.hotkey
    }

    /// Returns true if the processor runs when invoked.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Enables or disables the processor.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
        if active {
            self.consecutive_failures.store(0, Ordering::Release);
        }
    }

    /// Listener registry.
    #[must_use]
    pub fn listeners(&self) -> &ListenerRegistry<R> {
        &self.listeners
    }

    /// Sets the number of consecutive failures after which the processor
    /// deactivates itself. `None` retries forever.
    pub fn set_failure_threshold(&self, threshold: Option<u32>) {
        self.failure_threshold
            .store(threshold.unwrap_or(0), Ordering::Release);
    }

    /// Delivers a result to every listener; see [`ListenerRegistry::notify`].
    pub fn notify_listeners_of_result(&self, result: &R) -> usize {
        self.listeners.notify(&self.name, result)
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            runs: self.runs.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
        }
    }

    fn record_success(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Release);
    }

    /// Logs and counts a failure. Returns true if it deactivated the
    /// processor.
    fn record_failure(&self, err: &OverlayError) -> bool {
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
        let consecutive = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::warn!("Processor '{}' failed ({} in a row): {}", self.name, consecutive, err);

        let threshold = self.failure_threshold.load(Ordering::Acquire);
        if threshold > 0 && consecutive >= threshold {
            self.active.store(false, Ordering::Release);
            tracing::warn!(
                "Processor '{}' deactivated after {} consecutive failures",
                self.name,
                consecutive
            );
            return true;
        }
        false
    }
}

impl<R: 'static> Toggleable for ProcessorCore<R> {
    fn toggle(&self) -> bool {
        let active = !self.active.fetch_xor(true, Ordering::AcqRel);
        if active {
            self.consecutive_failures.store(0, Ordering::Release);
        }
        active
    }

    fn hotkey(&self) -> Option<Hotkey> {
        self.hotkey
    }
}

/// A typed computation unit.
///
/// Implementors provide the computation; invocation, gating, failure
/// handling and fan-out come from [`FrameProcessor`], which every processor
/// gets for free.
pub trait Processor: Toggleable + Send + Sync {
    /// Result type delivered to listeners.
    type Output: Send + Sync + 'static;

    /// Shared processor state.
    fn core(&self) -> &ProcessorCore<Self::Output>;

    /// Returns true if the processor can run against `backend`.
    ///
    /// Must be pure: it is asked once, at registration.
    fn is_compatible_processor(&self, backend: &BackendDescriptor) -> bool;

    /// Computes one result. `Ok(None)` means nothing to report this time.
    ///
    /// # Errors
    ///
    /// Any error is contained by [`FrameProcessor::process`].
    fn compute(&self, request: &ProcessRequest<'_>) -> OverlayResult<Option<Self::Output>>;

    /// Registers a listener for results.
    fn add_result_listener<L>(&self, listener: &Arc<L>) -> ListenerToken
    where
        L: ResultListener<Self::Output> + 'static,
        Self: Sized,
    {
        self.core().listeners().add_listener(listener)
    }

    /// Unregisters a listener.
    fn remove_result_listener(&self, token: ListenerToken) -> bool {
        self.core().listeners().remove(token)
    }

    /// Number of live listeners.
    fn listener_count(&self) -> usize {
        self.core().listeners().len()
    }
}

/// What happened during one [`FrameProcessor::process`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The processor is inactive and was skipped.
    Inactive,
    /// A result was delivered to this many listeners.
    Delivered(usize),
    /// The computation ran but had nothing to report.
    NoResult,
    /// The computation failed; `deactivated` tells if it switched itself off.
    Failed {
        /// The failure reached the deactivation threshold.
        deactivated: bool,
    },
}

/// Type-erased processor, as driven by the host every frame.
pub trait FrameProcessor: Toggleable + Send + Sync {
    /// Processor name.
    fn name(&self) -> &str;
    /// Compatibility with the active backend.
    fn is_compatible(&self, backend: &BackendDescriptor) -> bool;
    /// Returns true if the processor is active.
    fn is_active(&self) -> bool;
    /// Enables or disables the processor.
    fn set_active(&self, active: bool);
    /// Sets the self-deactivation threshold.
    fn set_failure_threshold(&self, threshold: Option<u32>);
    /// Runs one invocation. Computation errors and panics never escape:
    /// they are logged and counted.
    fn process(&self, request: &ProcessRequest<'_>) -> ProcessOutcome;
    /// Counters.
    fn stats(&self) -> ProcessorStats;
}

impl<P: Processor> FrameProcessor for P {
    fn name(&self) -> &str {
        self.core().name()
    }

    fn is_compatible(&self, backend: &BackendDescriptor) -> bool {
        self.is_compatible_processor(backend)
    }

    fn is_active(&self) -> bool {
        self.core().is_active()
    }

    fn set_active(&self, active: bool) {
        self.core().set_active(active);
    }

    fn set_failure_threshold(&self, threshold: Option<u32>) {
        self.core().set_failure_threshold(threshold);
    }

    fn process(&self, request: &ProcessRequest<'_>) -> ProcessOutcome {
        let core = self.core();
        if !core.is_active() {
            return ProcessOutcome::Inactive;
        }

        // A panicking computation counts as a failure; the rest of the frame goes on.
        let computed = panic::catch_unwind(AssertUnwindSafe(|| self.compute(request)))
            .unwrap_or_else(|payload| {
                Err(OverlayError::ProcessingFailed {
                    processor: core.name().to_string(),
                    reason: format!("panicked: {}", panic_message(&*payload)),
                })
            });

        match computed {
            Ok(Some(result)) => {
                core.record_success();
                ProcessOutcome::Delivered(core.notify_listeners_of_result(&result))
            }
            Ok(None) => {
                core.record_success();
                ProcessOutcome::NoResult
            }
            Err(err) => ProcessOutcome::Failed {
                deactivated: core.record_failure(&err),
            },
        }
    }

    fn stats(&self) -> ProcessorStats {
        self.core().stats()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        return message;
    }
    payload
        .downcast_ref::<String>()
        .map_or("unknown panic", String::as_str)
}
