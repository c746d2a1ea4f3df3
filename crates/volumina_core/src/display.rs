//! Display requests - the only way the pipeline talks back to the host.
//!
//! ```text
//! Producer thread                     Render thread
//!   channel.append() ──► request_display() ──► [pending: 0/1] ──► take_pending()
//!   channel.append() ──► request_display() ──┘   (coalesced)
//! ```
//!
//! Requests are hints. Many of them may collapse into a single redraw, and
//! nothing in the pipeline assumes the redraw happens immediately.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};

/// Host-side receiver of redraw hints.
///
/// Implementations must be non-blocking and callable from any thread.
pub trait DisplayRequestSink: Send + Sync {
    /// Signals that new content is available and a redraw is warranted.
    fn request_display(&self);
}

/// Non-owning link from a channel or overlay to the host's sink.
///
/// The host owns the sink; components only keep a [`Weak`] so they never
/// extend its lifetime. Once the sink is gone, requests are dropped.
#[derive(Clone, Default)]
pub struct DisplayLink {
    sink: Option<Weak<dyn DisplayRequestSink>>,
}

impl DisplayLink {
    /// Creates an unattached link.
    #[must_use]
    pub const fn detached() -> Self {
        Self { sink: None }
    }

    /// Creates a link to the given sink.
    #[must_use]
    pub fn new(sink: Weak<dyn DisplayRequestSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Creates a link from a strong handle without taking ownership.
    #[must_use]
    pub fn to(sink: &Arc<dyn DisplayRequestSink>) -> Self {
        Self::new(Arc::downgrade(sink))
    }

    /// Returns true if the sink is still alive.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.sink.as_ref().is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Forwards a display request if the sink is still alive.
    ///
    /// Returns true if the request reached a sink.
    pub fn request(&self) -> bool {
        match self.sink.as_ref().and_then(Weak::upgrade) {
            Some(sink) => {
                sink.request_display();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for DisplayLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayLink")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Coalescing display request queue for the host render loop.
///
/// At most one redraw is pending at any time; extra requests only bump the
/// counter.
pub struct DisplayRequests {
    sender: Sender<()>,
    receiver: Receiver<()>,
    requested: AtomicU64,
}

impl DisplayRequests {
    /// Creates a new request queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = bounded(1);
        Self {
            sender,
            receiver,
            requested: AtomicU64::new(0),
        }
    }

    /// Creates a shared queue ready to be handed out as a sink.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Consumes the pending redraw, if any.
    pub fn take_pending(&self) -> bool {
        self.receiver.try_recv().is_ok()
    }

    /// Returns true if a redraw is pending, without consuming it.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Blocks the calling thread until a redraw is requested or the timeout
    /// elapses. Meant for idle host loops, never for the render phase.
    pub fn wait_for_request(&self, timeout: Duration) -> bool {
        self.receiver.recv_timeout(timeout).is_ok()
    }

    /// Total number of requests received, coalesced or not.
    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.requested.load(Ordering::Relaxed)
    }
}

impl Default for DisplayRequests {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayRequestSink for DisplayRequests {
    fn request_display(&self) {
        self.requested.fetch_add(1, Ordering::Relaxed);
        // Full means a redraw is already pending.
        let _ = self.sender.try_send(());
    }
}
