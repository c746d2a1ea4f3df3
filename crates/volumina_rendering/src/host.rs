//! # Overlay Host
//!
//! Registry of overlays and processors, driven by the renderer once per
//! frame.
//!
//! ```text
//! ┌──────────────────────────── FRAME ────────────────────────────┐
//! │  compute thread: ProcessorSet::process_all(request)           │
//! │                    └── inactive processors are skipped        │
//! │                                                               │
//! │  render thread:  render_frame()                               │
//! │    ├── Phase 1: render_3d on every overlay (volume space)     │
//! │    ├── Phase 2: render_2d on every overlay (screen space)     │
//! │    └── FrameReport (drawn / contended / hidden, budget)       │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Processors incompatible with the backend are rejected at registration
//! and never invoked.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use volumina_core::{
    AssetSource, BackendDescriptor, DisplayLink, DisplayRequestSink, DisplayRequests, DrawList,
    FrameContext, FrameProcessor, FrameTransforms, InitContext, Key, MemoryAssets, Modifiers,
    Overlay, PipelineConfig, ProcessOutcome, ProcessRequest, RenderOutcome, Viewport,
};

/// Outcome of running every registered processor once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Processors that computed.
    pub invoked: u32,
    /// Inactive processors that were skipped.
    pub inactive: u32,
    /// Results delivered to at least zero listeners.
    pub delivered: u32,
    /// Failed computations.
    pub failed: u32,
}

/// Shared handle on the host's processors, usable from a compute thread.
#[derive(Clone, Default)]
pub struct ProcessorSet {
    processors: Arc<RwLock<Vec<Arc<dyn FrameProcessor>>>>,
}

impl ProcessorSet {
    /// Runs every processor once, in registration order.
    pub fn process_all(&self, request: &ProcessRequest<'_>) -> ProcessSummary {
        let processors: Vec<Arc<dyn FrameProcessor>> = self.processors.read().clone();
        let mut summary = ProcessSummary::default();
        for processor in &processors {
            match processor.process(request) {
                ProcessOutcome::Inactive => summary.inactive += 1,
                ProcessOutcome::Delivered(_) => {
                    summary.invoked += 1;
                    summary.delivered += 1;
                }
                ProcessOutcome::NoResult => summary.invoked += 1,
                ProcessOutcome::Failed { .. } => {
                    summary.invoked += 1;
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    /// Number of processors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processors.read().len()
    }

    /// Returns true if no processor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processors.read().is_empty()
    }

    /// Looks a processor up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn FrameProcessor>> {
        self.processors
            .read()
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    fn push(&self, processor: Arc<dyn FrameProcessor>) {
        self.processors.write().push(processor);
    }

    fn snapshot(&self) -> Vec<Arc<dyn FrameProcessor>> {
        self.processors.read().clone()
    }
}

impl std::fmt::Debug for ProcessorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorSet")
            .field("len", &self.len())
            .finish()
    }
}

/// Result of a single frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number, starting at 1.
    pub frame_number: u64,
    /// Time spent in both render phases (microseconds).
    pub frame_time_us: u32,
    /// Render phase calls that issued draw commands.
    pub drawn: u32,
    /// Render phase calls skipped on lock contention.
    pub contended: u32,
    /// Overlays that were hidden.
    pub hidden: u32,
    /// Draw commands in the frame's list.
    pub commands: u32,
    /// Frame exceeded the configured budget.
    pub over_budget: bool,
}

/// Aggregated host statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    /// Frames rendered.
    pub total_frames: u64,
    /// Worst frame time (microseconds).
    pub worst_frame_time_us: u32,
    /// Frames over budget.
    pub frames_over_budget: u32,
    /// Render phase calls skipped on contention, all frames.
    pub contended_draws: u64,
}

/// Owns overlays and processors and drives them every frame.
pub struct OverlayHost {
    config: PipelineConfig,
    backend: BackendDescriptor,
    overlays: Vec<Box<dyn Overlay>>,
    processors: ProcessorSet,
    /// Kept for overlays added after init.
    assets: Arc<dyn AssetSource>,
    display: Arc<DisplayRequests>,
    draw_list: DrawList,
    initialized: bool,
    frame_count: u64,
    stats: HostStats,
}

impl OverlayHost {
    /// Creates an empty host for `backend`.
    #[must_use]
    pub fn new(config: PipelineConfig, backend: BackendDescriptor) -> Self {
        Self {
            config,
            backend,
            overlays: Vec::new(),
            processors: ProcessorSet::default(),
            assets: Arc::new(MemoryAssets::new()),
            display: DisplayRequests::shared(),
            draw_list: DrawList::new(),
            initialized: false,
            frame_count: 0,
            stats: HostStats::default(),
        }
    }

    /// Active backend.
    #[must_use]
    pub fn backend(&self) -> &BackendDescriptor {
        &self.backend
    }

    /// Pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Display requests raised by overlays and channels.
    #[must_use]
    pub fn display_requests(&self) -> &Arc<DisplayRequests> {
        &self.display
    }

    /// Registers an overlay. Overlays added after [`OverlayHost::init`] are
    /// initialized on the spot with the same assets.
    pub fn add_overlay(&mut self, overlay: Box<dyn Overlay>) {
        if let Some(displayed) = self.config.initially_displayed(overlay.name()) {
            overlay.set_displayed(displayed);
        }
        tracing::info!("Overlay '{}' registered", overlay.name());
        self.overlays.push(overlay);

        if self.initialized {
            let link = self.display_link();
            if let Some(overlay) = self.overlays.last_mut() {
                let ctx = InitContext {
                    backend: &self.backend,
                    assets: self.assets.as_ref(),
                    channel_capacity: self.config.channel_capacity,
                };
                overlay.init(&ctx, link);
            }
        }
    }

    /// Registers a processor. Returns false, and drops it, if it cannot run
    /// on the active backend.
    pub fn add_processor(&mut self, processor: Arc<dyn FrameProcessor>) -> bool {
        if !processor.is_compatible(&self.backend) {
            tracing::info!(
                "Processor '{}' excluded: incompatible with backend '{}'",
                processor.name(),
                self.backend.name
            );
            return false;
        }
        processor.set_failure_threshold(self.config.failure_threshold);
        tracing::info!("Processor '{}' registered", processor.name());
        self.processors.push(processor);
        true
    }

    /// Registers an overlay together with the processor feeding it.
    /// The overlay is kept even if the processor is excluded.
    pub fn add_overlay_with_processor(
        &mut self,
        overlay: Box<dyn Overlay>,
        processor: Arc<dyn FrameProcessor>,
    ) -> bool {
        self.add_overlay(overlay);
        self.add_processor(processor)
    }

    /// Initializes every overlay. The host keeps `assets` for overlays
    /// registered later.
    pub fn init<A: AssetSource + 'static>(&mut self, assets: A) {
        self.assets = Arc::new(assets);
        let link = self.display_link();
        let ctx = InitContext {
            backend: &self.backend,
            assets: self.assets.as_ref(),
            channel_capacity: self.config.channel_capacity,
        };
        for overlay in &mut self.overlays {
            overlay.init(&ctx, link.clone());
        }
        self.initialized = true;
        tracing::info!(
            "Overlay host initialized: {} overlays, {} processors on '{}'",
            self.overlays.len(),
            self.processors.len(),
            self.backend.name
        );
    }

    /// Handle for running processors, possibly on another thread.
    #[must_use]
    pub fn processor_set(&self) -> ProcessorSet {
        self.processors.clone()
    }

    /// Runs every processor once on the calling thread.
    pub fn process_frame(&self, request: &ProcessRequest<'_>) -> ProcessSummary {
        self.processors.process_all(request)
    }

    /// Renders one frame: volume-space phase, then screen-space phase.
    #[allow(clippy::cast_possible_truncation)]
    pub fn render_frame(&mut self, transforms: FrameTransforms, viewport: Viewport) -> FrameReport {
        let frame_start = Instant::now();
        self.frame_count += 1;
        self.draw_list.begin_frame();

        let mut report = FrameReport {
            frame_number: self.frame_count,
            ..FrameReport::default()
        };
        let lock_timeout = self.config.render_lock_timeout();
        let mut frame = FrameContext::new(&mut self.draw_list, transforms, viewport, lock_timeout);

        // === PHASE 1: Volume space ===
        for overlay in &mut self.overlays {
            let outcome = overlay.render_3d(&mut frame);
            tally(&mut report, outcome);
        }

        // === PHASE 2: Screen space ===
        for overlay in &mut self.overlays {
            let outcome = overlay.render_2d(&mut frame);
            if outcome == RenderOutcome::Hidden {
                continue;
            }
            tally(&mut report, outcome);
        }

        report.commands = u32::try_from(frame.draw_list().len()).unwrap_or(u32::MAX);
        let frame_time = frame_start.elapsed();
        let total_us = frame_time.as_micros().min(u128::from(u32::MAX)) as u32;
        report.frame_time_us = total_us;
        report.over_budget = frame_time > self.config.frame_budget();

        self.stats.total_frames += 1;
        self.stats.worst_frame_time_us = self.stats.worst_frame_time_us.max(total_us);
        self.stats.contended_draws += u64::from(report.contended);
        if report.over_budget {
            self.stats.frames_over_budget += 1;
            tracing::warn!(
                "Frame {} over budget: {}us > {}us",
                report.frame_number,
                total_us,
                self.config.frame_budget_us
            );
        }
        report
    }

    /// Commands of the last rendered frame.
    #[must_use]
    pub fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Toggles every overlay and processor bound to `key` + `modifiers`.
    /// Returns how many were toggled.
    pub fn handle_key(&self, key: Key, modifiers: Modifiers) -> usize {
        let mut toggled = 0;
        for overlay in &self.overlays {
            if overlay.hotkey().is_some_and(|h| h.matches(key, modifiers)) {
                let displayed = overlay.toggle();
                tracing::debug!("Overlay '{}' displayed: {}", overlay.name(), displayed);
                toggled += 1;
            }
        }
        for processor in self.processors.snapshot() {
            if processor.hotkey().is_some_and(|h| h.matches(key, modifiers)) {
                let active = processor.toggle();
                tracing::debug!("Processor '{}' active: {}", processor.name(), active);
                toggled += 1;
            }
        }
        if toggled > 0 {
            self.display.request_display();
        }
        toggled
    }

    /// Toggles the overlay named `name`. Returns its new displayed state.
    pub fn toggle_overlay(&self, name: &str) -> Option<bool> {
        let overlay = self.overlays.iter().find(|o| o.name() == name)?;
        let displayed = overlay.toggle();
        self.display.request_display();
        Some(displayed)
    }

    /// Names of the registered overlays, in registration order.
    #[must_use]
    pub fn overlay_names(&self) -> Vec<&str> {
        self.overlays.iter().map(|o| o.name()).collect()
    }

    /// Looks an overlay up by name.
    #[must_use]
    pub fn overlay(&self, name: &str) -> Option<&dyn Overlay> {
        self.overlays
            .iter()
            .find(|o| o.name() == name)
            .map(|o| &**o)
    }

    /// Statistics.
    #[must_use]
    pub fn stats(&self) -> HostStats {
        self.stats
    }

    /// Frames rendered so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn display_link(&self) -> DisplayLink {
        let sink: Arc<dyn DisplayRequestSink> = self.display.clone();
        DisplayLink::to(&sink)
    }
}

fn tally(report: &mut FrameReport, outcome: RenderOutcome) {
    match outcome {
        RenderOutcome::Hidden => report.hidden += 1,
        RenderOutcome::Contended => report.contended += 1,
        RenderOutcome::Redrawn | RenderOutcome::Rebuilt => report.drawn += 1,
        RenderOutcome::Idle => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlays::{BoxOverlay, GraphOverlay};
    use crate::image_quality::{ImageQualityOverlay, READOUT_FONT_PATH};
    use crate::processors::{RandomWalk, TenengradProcessor};
    use volumina_core::{ChannelOverlay, DrawCommand, Hotkey};

    fn host(backend: BackendDescriptor) -> OverlayHost {
        OverlayHost::new(PipelineConfig::default(), backend)
    }

    #[test]
    fn test_incompatible_processor_is_excluded() {
        let mut host = host(BackendDescriptor::raster_only("gl"));
        let tenengrad = Arc::new(TenengradProcessor::new());

        assert!(!host.add_processor(tenengrad.clone()));
        assert!(host.add_processor(Arc::new(RandomWalk::new(1))));
        assert_eq!(host.processor_set().len(), 1);

        let summary = host.process_frame(&ProcessRequest::new(0, 4, 4, 4));
        assert_eq!(summary.invoked, 1);
        assert_eq!(tenengrad.stats().runs, 0);
    }

    #[test]
    fn test_hidden_overlays_draw_nothing() {
        let mut host = host(BackendDescriptor::raster_only("gl"));
        host.add_overlay(Box::new(BoxOverlay::new()));
        host.init(MemoryAssets::new());

        let report = host.render_frame(FrameTransforms::default(), Viewport::new(640, 480));
        assert_eq!(report.frame_number, 1);
        assert_eq!(report.hidden, 1);
        assert_eq!(report.commands, 0);
        assert!(host.draw_list().is_empty());
    }

    #[test]
    fn test_phases_in_order() {
        let mut host = host(BackendDescriptor::raster_only("gl"));
        let graph = GraphOverlay::with_capacity("graph", 8).unwrap().shown();
        graph.add_point(1.0);
        host.add_overlay(Box::new(graph));
        host.add_overlay(Box::new(BoxOverlay::new().shown()));
        host.init(MemoryAssets::new());

        let report = host.render_frame(FrameTransforms::default(), Viewport::new(640, 480));
        assert_eq!(report.drawn, 2);
        let names: Vec<&str> = host.draw_list().commands().iter().map(|c| c.overlay()).collect();
        assert_eq!(names, vec!["box", "graph"]);
    }

    #[test]
    fn test_config_sets_initial_visibility() {
        let config = PipelineConfig::from_toml_str("[overlays]\nbox = true").unwrap();
        let mut host = OverlayHost::new(config, BackendDescriptor::raster_only("gl"));
        host.add_overlay(Box::new(BoxOverlay::new()));
        assert_eq!(host.overlay("box").map(|o| o.is_displayed()), Some(true));
    }

    #[test]
    fn test_handle_key_toggles_and_requests_display() {
        let mut host = host(BackendDescriptor::raster_only("gl"));
        host.add_overlay(Box::new(BoxOverlay::new()));
        let walk = Arc::new(RandomWalk::new(3).with_hotkey(Hotkey::key(Key::B)));
        host.add_processor(walk.clone());
        host.init(MemoryAssets::new());
        let _ = host.display_requests().take_pending();

        assert_eq!(host.handle_key(Key::B, Modifiers::NONE), 2);
        assert_eq!(host.overlay("box").map(|o| o.is_displayed()), Some(true));
        assert!(!walk.is_active());
        assert!(host.display_requests().take_pending());

        assert_eq!(host.handle_key(Key::B, Modifiers::CTRL), 0);
        assert_eq!(host.handle_key(Key::B, Modifiers::NONE), 2);
        assert!(walk.is_active());
    }

    #[test]
    fn test_toggle_overlay_by_name() {
        let mut host = host(BackendDescriptor::raster_only("gl"));
        host.add_overlay(Box::new(BoxOverlay::new()));
        assert_eq!(host.overlay_names(), vec!["box"]);
        assert_eq!(host.toggle_overlay("box"), Some(true));
        assert_eq!(host.toggle_overlay("box"), Some(false));
        assert_eq!(host.toggle_overlay("missing"), None);
    }

    #[test]
    fn test_processor_set_runs_on_another_thread() {
        let mut host = host(BackendDescriptor::raster_only("gl"));
        host.add_processor(Arc::new(RandomWalk::new(9)));
        let set = host.processor_set();

        let summary = std::thread::spawn(move || set.process_all(&ProcessRequest::new(0, 1, 1, 1)))
            .join()
            .unwrap();
        assert_eq!(summary.delivered, 1);
        let walk = host.processor_set().get("random_walk").unwrap();
        assert_eq!(walk.stats().runs, 1);
    }

    #[test]
    fn test_configured_capacity_reaches_default_overlays() {
        let config = PipelineConfig::from_toml_str("channel_capacity = 3").unwrap();
        let mut host = OverlayHost::new(config, BackendDescriptor::raster_only("gl"));
        let graph = GraphOverlay::new("graph");
        let channel = Arc::clone(graph.channel());
        host.add_overlay(Box::new(graph));
        host.init(MemoryAssets::new());

        for i in 0..10 {
            channel.append(f64::from(i));
        }
        assert_eq!(channel.capacity(), 3);
        assert_eq!(channel.snapshot(), vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_late_overlay_uses_host_assets() {
        let mut host = host(BackendDescriptor::compute("opencl"));
        host.init(MemoryAssets::new().with(READOUT_FONT_PATH, vec![0, 1, 0, 0]));

        let quality = ImageQualityOverlay::new(4).unwrap();
        let processor = Arc::clone(quality.processor());
        host.add_overlay(Box::new(quality));
        assert_eq!(host.toggle_overlay("image_quality"), Some(true));

        let voxels = vec![0u8; 9];
        let _ = processor.process(&ProcessRequest::new(0, 3, 3, 1).with_voxels(&voxels));
        host.render_frame(FrameTransforms::default(), Viewport::new(640, 480));

        let fonts: Vec<&str> = host
            .draw_list()
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { font_family, .. } => Some(font_family.as_str()),
                DrawCommand::Geometry { .. } => None,
            })
            .collect();
        assert_eq!(fonts, vec!["SourceCodeProLight"]);
    }

    #[test]
    fn test_empty_overlay_is_not_counted_as_drawn() {
        let mut host = host(BackendDescriptor::raster_only("gl"));
        host.add_overlay(Box::new(GraphOverlay::new("graph").shown()));
        host.init(MemoryAssets::new());

        let report = host.render_frame(FrameTransforms::default(), Viewport::new(640, 480));
        assert_eq!(report.drawn, 0);
        assert_eq!(report.commands, 0);
    }

    #[test]
    fn test_frame_budget_from_config() {
        let config = PipelineConfig::from_toml_str("frame_budget_us = 0").unwrap();
        let mut host = OverlayHost::new(config, BackendDescriptor::raster_only("gl"));
        host.add_overlay(Box::new(BoxOverlay::new().shown()));
        host.init(MemoryAssets::new());

        let report = host.render_frame(FrameTransforms::default(), Viewport::new(640, 480));
        assert!(report.over_budget);
        assert_eq!(host.stats().frames_over_budget, 1);
    }
}
