//! Bounding box of the volume. Static: built once, never changes.

use volumina_core::{
    DisplayLink, FrameContext, Hotkey, InitContext, Key, Overlay, OverlayState, Primitive,
    RenderOutcome, RenderPhase, Toggleable,
};

use crate::geometry::{GeometryBuffer, OverlayVertex};

/// Box line color.
pub const BOX_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.5];

/// Half extent of the box in volume coordinates.
pub const BOX_HALF_EXTENT: f32 = 1.0;

/// The 12 edges of the volume's bounding box.
pub struct BoxOverlay {
    state: OverlayState,
    geometry: GeometryBuffer,
}

impl BoxOverlay {
    /// Creates a hidden box overlay named `box`, toggled with `B`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: OverlayState::new("box").with_hotkey(Hotkey::key(Key::B)),
            geometry: GeometryBuffer::with_capacity(24),
        }
    }

    /// Starts displayed.
    #[must_use]
    pub fn shown(mut self) -> Self {
        self.state = self.state.shown();
        self
    }

    /// Geometry built at init.
    #[must_use]
    pub fn geometry(&self) -> &GeometryBuffer {
        &self.geometry
    }

    fn build(&mut self) {
        let e = BOX_HALF_EXTENT;
        let corner = |i: u8| {
            OverlayVertex::new(
                if i & 1 == 0 { -e } else { e },
                if i & 2 == 0 { -e } else { e },
                if i & 4 == 0 { -e } else { e },
            )
        };

        self.geometry.begin();
        for a in 0..8u8 {
            for bit in [1u8, 2, 4] {
                // Each edge once: from the corner with the bit cleared.
                if a & bit == 0 {
                    self.geometry.segment(corner(a), corner(a | bit));
                }
            }
        }
        self.geometry.finish();
    }
}

impl Default for BoxOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Toggleable for BoxOverlay {
    fn toggle(&self) -> bool {
        self.state.toggle()
    }

    fn hotkey(&self) -> Option<Hotkey> {
        self.state.hotkey()
    }
}

impl Overlay for BoxOverlay {
    fn name(&self) -> &str {
        self.state.name()
    }

    fn init(&mut self, _ctx: &InitContext<'_>, display: DisplayLink) {
        self.state.attach(display);
        self.build();
    }

    fn is_displayed(&self) -> bool {
        self.state.is_displayed()
    }

    fn set_displayed(&self, displayed: bool) {
        self.state.set_displayed(displayed);
    }

    fn has_changed(&self) -> bool {
        false
    }

    fn render_3d(&mut self, frame: &mut FrameContext<'_>) -> RenderOutcome {
        if !self.state.is_displayed() {
            return RenderOutcome::Hidden;
        }
        if self.geometry.is_empty() {
            return RenderOutcome::Idle;
        }
        let command = self.geometry.draw_command(
            self.state.name(),
            RenderPhase::Scene3D,
            Primitive::Lines,
            BOX_COLOR,
            frame.transforms.scene(),
        );
        frame.draw(command);
        RenderOutcome::Redrawn
    }
}
