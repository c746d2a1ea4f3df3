//! # Overlay / Processor Adapter
//!
//! Couples a processor to a channel-fed overlay without either knowing the
//! other:
//!
//! ```text
//!              ┌──────────────── OverlayProcessorAdapter ───────────────┐
//!  process() ──► Processor ──► overlay channel (append)  ──► render_2d/3d
//!              │           └──► auxiliary listeners (e.g. latest value)  │
//!              └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The processor only keeps weak references; the adapter owns the overlay
//! and keeps its auxiliary listeners alive. Showing the adapter again after
//! it was hidden always starts from an empty channel.

use std::sync::Arc;

use volumina_core::{
    BoundedChannel, ChannelOverlay, DisplayLink, FrameContext, FrameProcessor, Hotkey,
    InitContext, ListenerToken, Overlay, Processor, RenderOutcome, ResultListener, Toggleable,
};

/// A channel overlay driven by a processor, behind a single overlay facade.
pub struct OverlayProcessorAdapter<O, P>
where
    O: ChannelOverlay,
    P: Processor<Output = O::Sample> + 'static,
{
    overlay: O,
    processor: Arc<P>,
    auxiliary: Vec<Arc<dyn ResultListener<O::Sample>>>,
    tokens: Vec<ListenerToken>,
    hotkey: Option<Hotkey>,
}

impl<O, P> OverlayProcessorAdapter<O, P>
where
    O: ChannelOverlay,
    P: Processor<Output = O::Sample> + 'static,
{
    /// Wires `processor` results into `overlay`'s channel.
    pub fn new(overlay: O, processor: Arc<P>) -> Self {
        let token = processor.add_result_listener(overlay.channel());
        let hotkey = overlay.hotkey();
        Self {
            overlay,
            processor,
            auxiliary: Vec::new(),
            tokens: vec![token],
            hotkey,
        }
    }

    /// Registers an additional listener, kept alive by the adapter.
    #[must_use]
    pub fn with_listener<L>(mut self, listener: Arc<L>) -> Self
    where
        L: ResultListener<O::Sample> + 'static,
    {
        self.tokens.push(self.processor.add_result_listener(&listener));
        self.auxiliary.push(listener);
        self
    }

    /// Overrides the hotkey of the delegated overlay.
    #[must_use]
    pub fn with_hotkey(mut self, hotkey: Hotkey) -> Self {
        self.hotkey = Some(hotkey);
        self
    }

    /// Delegated overlay.
    #[must_use]
    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    /// Mutable access to the delegated overlay.
    pub fn overlay_mut(&mut self) -> &mut O {
        &mut self.overlay
    }

    /// Wrapped processor.
    #[must_use]
    pub fn processor(&self) -> &Arc<P> {
        &self.processor
    }

    /// Wrapped processor, type-erased for the host.
    #[must_use]
    pub fn frame_processor(&self) -> Arc<dyn FrameProcessor> {
        self.processor.clone()
    }

    /// Number of listeners the adapter registered on the processor.
    #[must_use]
    pub fn registered_listeners(&self) -> usize {
        self.tokens.len()
    }

    fn show(&self) {
        // Clear first: everything appended after this point is fresh.
        self.overlay.channel().clear();
        self.overlay.set_displayed(true);
    }
}

impl<O, P> Drop for OverlayProcessorAdapter<O, P>
where
    O: ChannelOverlay,
    P: Processor<Output = O::Sample> + 'static,
{
    fn drop(&mut self) {
        for token in self.tokens.drain(..) {
            self.processor.remove_result_listener(token);
        }
    }
}

impl<O, P> Toggleable for OverlayProcessorAdapter<O, P>
where
    O: ChannelOverlay,
    P: Processor<Output = O::Sample> + 'static,
{
    fn toggle(&self) -> bool {
        let displayed = self.overlay.toggle();
        if displayed {
            self.overlay.channel().clear();
        }
        displayed
    }

    fn hotkey(&self) -> Option<Hotkey> {
        self.hotkey
    }
}

impl<O, P> Overlay for OverlayProcessorAdapter<O, P>
where
    O: ChannelOverlay,
    P: Processor<Output = O::Sample> + 'static,
{
    fn name(&self) -> &str {
        self.overlay.name()
    }

    fn init(&mut self, ctx: &InitContext<'_>, display: DisplayLink) {
        self.overlay.init(ctx, display);
    }

    fn is_displayed(&self) -> bool {
        self.overlay.is_displayed()
    }

    fn set_displayed(&self, displayed: bool) {
        if displayed && !self.overlay.is_displayed() {
            self.show();
        } else {
            self.overlay.set_displayed(displayed);
        }
    }

    fn has_changed(&self) -> bool {
        self.overlay.has_changed()
    }

    fn render_3d(&mut self, frame: &mut FrameContext<'_>) -> RenderOutcome {
        self.overlay.render_3d(frame)
    }

    fn render_2d(&mut self, frame: &mut FrameContext<'_>) -> RenderOutcome {
        self.overlay.render_2d(frame)
    }
}

impl<O, P> ChannelOverlay for OverlayProcessorAdapter<O, P>
where
    O: ChannelOverlay,
    P: Processor<Output = O::Sample> + 'static,
{
    type Sample = O::Sample;

    fn channel(&self) -> &Arc<BoundedChannel<O::Sample>> {
        self.overlay.channel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlays::GraphOverlay;
    use parking_lot::Mutex;
    use volumina_core::{
        BackendDescriptor, OverlayResult, ProcessOutcome, ProcessRequest, ProcessorCore,
    };

    struct Sequence {
        core: ProcessorCore<f64>,
        next: Mutex<f64>,
    }

    impl Sequence {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                core: ProcessorCore::new("sequence"),
                next: Mutex::new(0.0),
            })
        }
    }

    impl Toggleable for Sequence {
        fn toggle(&self) -> bool {
            self.core.toggle()
        }
    }

    impl Processor for Sequence {
        type Output = f64;

        fn core(&self) -> &ProcessorCore<f64> {
            &self.core
        }

        fn is_compatible_processor(&self, _backend: &BackendDescriptor) -> bool {
            true
        }

        fn compute(&self, _request: &ProcessRequest<'_>) -> OverlayResult<Option<f64>> {
            let mut next = self.next.lock();
            *next += 1.0;
            Ok(Some(*next))
        }
    }

    fn run(processor: &Sequence, times: usize) {
        let request = ProcessRequest::new(0, 8, 8, 8);
        for _ in 0..times {
            processor.process(&request);
        }
    }

    #[test]
    fn test_results_reach_overlay_and_auxiliary_listener() {
        let processor = Sequence::new();
        let latest = Arc::new(Mutex::new(None));
        let cache = {
            let latest = Arc::clone(&latest);
            Arc::new(move |_: &str, value: &f64| *latest.lock() = Some(*value))
        };
        let adapter = OverlayProcessorAdapter::new(
            GraphOverlay::with_capacity("graph", 5).unwrap(),
            Arc::clone(&processor),
        )
        .with_listener(cache);

        assert_eq!(adapter.registered_listeners(), 2);
        assert_eq!(
            processor.process(&ProcessRequest::new(0, 1, 1, 1)),
            ProcessOutcome::Delivered(2)
        );
        assert_eq!(adapter.channel().snapshot(), vec![1.0]);
        assert_eq!(*latest.lock(), Some(1.0));
    }

    #[test]
    fn test_show_after_hide_starts_empty() {
        let processor = Sequence::new();
        let adapter = OverlayProcessorAdapter::new(
            GraphOverlay::with_capacity("graph", 5).unwrap(),
            Arc::clone(&processor),
        );
        assert!(adapter.toggle());
        run(&processor, 5);
        assert_eq!(adapter.channel().len(), 5);

        assert!(!adapter.toggle());
        assert_eq!(adapter.channel().len(), 5);
        assert!(adapter.toggle());
        assert!(adapter.channel().snapshot().is_empty());
    }

    #[test]
    fn test_set_displayed_also_clears() {
        let processor = Sequence::new();
        let adapter = OverlayProcessorAdapter::new(
            GraphOverlay::with_capacity("graph", 5).unwrap(),
            Arc::clone(&processor),
        );
        run(&processor, 3);
        adapter.set_displayed(true);
        assert!(adapter.channel().is_empty());

        run(&processor, 2);
        adapter.set_displayed(true);
        assert_eq!(adapter.channel().len(), 2);
    }

    #[test]
    fn test_drop_unregisters() {
        let processor = Sequence::new();
        let adapter = OverlayProcessorAdapter::new(
            GraphOverlay::with_capacity("graph", 5).unwrap(),
            Arc::clone(&processor),
        );
        assert_eq!(processor.core().listeners().len(), 1);

        drop(adapter);
        assert!(processor.core().listeners().is_empty());
        run(&processor, 1);
    }

    #[test]
    fn test_concurrent_toggles_alternate() {
        let processor = Sequence::new();
        let adapter = OverlayProcessorAdapter::new(
            GraphOverlay::with_capacity("graph", 5).unwrap(),
            Arc::clone(&processor),
        );

        let shows: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| (0..500).filter(|_| adapter.toggle()).count()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(shows, 1000);
        assert!(!adapter.is_displayed());
    }
}
