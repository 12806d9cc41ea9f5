//! Before/after comparison slider.
//!
//! Two images are stacked; the front one is clipped to the left `position`
//! percent of the container. The UI layer feeds pointer and touch events in,
//! then reads the clip width and divider offset back out when rendering.
//!
//! ```text
//! Pointer ─┐                          ┌─► position (0..=100)
//! Touch   ─┼──► ComparisonSlider ─────┤
//! Resize  ─┘                          └─► is_dragging
//! ```
//!
//! In [`SlideMode::Drag`] the divider follows the pointer only while it is
//! held down. A release anywhere ends the drag, so while in drag mode the
//! surface must forward releases observed outside its own bounds (see
//! [`ComparisonSlider::listens_globally`]). In [`SlideMode::Hover`] the divider
//! tracks the pointer without a press.

use serde::{Deserialize, Serialize};

/// Divider position on a fresh slider, in percent.
pub const DEFAULT_POSITION: f32 = 50.0;

/// How pointer movement drives the divider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideMode {
    /// Press, drag, release.
    #[default]
    Drag,
    /// Follow the pointer continuously.
    Hover,
}

/// Horizontal extent of the slider surface, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerRect {
    pub left: f32,
    pub width: f32,
}

impl ContainerRect {
    pub fn new(left: f32, width: f32) -> Self {
        Self { left, width }
    }

    /// Percentage of the width at `client_x`, clamped to `0..=100`.
    ///
    /// `None` when the surface has no usable width yet (not laid out).
    pub fn percent_at(&self, client_x: f32) -> Option<f32> {
        if !(self.width.is_finite() && self.width > 0.0) || !client_x.is_finite() {
            return None;
        }
        let pct = (client_x - self.left) / self.width * 100.0;
        Some(pct.clamp(0.0, 100.0))
    }
}

/// Input events understood by the slider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SliderInput {
    PointerMove { client_x: f32 },
    PointerDown,
    /// Release, on the surface or anywhere else in the window.
    PointerUp,
    TouchStart,
    /// Client x of every current contact point.
    TouchMove { touches: Vec<f32> },
    TouchEnd,
    /// The surface was laid out again.
    Resize(ContainerRect),
}

/// Divider state for one mounted comparison surface
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSlider {
    mode: SlideMode,
    rect: ContainerRect,
    position: f32,
    is_dragging: bool,
}

impl ComparisonSlider {
    /// Fresh slider with the divider centred.
    pub fn new(mode: SlideMode, rect: ContainerRect) -> Self {
        Self {
            mode,
            rect,
            position: DEFAULT_POSITION,
            is_dragging: false,
        }
    }

    pub fn mode(&self) -> SlideMode {
        self.mode
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    pub fn rect(&self) -> ContainerRect {
        self.rect
    }

    /// Width of the clipped front image, in percent of the container.
    pub fn clip_width_percent(&self) -> f32 {
        self.position
    }

    /// Left offset of the divider handle, in percent of the container.
    pub fn handle_left_percent(&self) -> f32 {
        self.position
    }

    /// Whether releases must be observed window-wide rather than on the surface.
    pub fn listens_globally(&self) -> bool {
        self.mode == SlideMode::Drag
    }

    /// Feed one event. Returns `true` if the divider moved.
    pub fn handle(&mut self, input: SliderInput) -> bool {
        match input {
            SliderInput::PointerMove { client_x } => self.pointer_move(client_x),
            SliderInput::PointerDown => {
                self.press_start();
                false
            }
            SliderInput::PointerUp => {
                self.press_end();
                false
            }
            SliderInput::TouchStart => {
                self.touch_start();
                false
            }
            SliderInput::TouchMove { touches } => self.touch_move(&touches),
            SliderInput::TouchEnd => {
                self.touch_end();
                false
            }
            SliderInput::Resize(rect) => {
                self.rect = rect;
                false
            }
        }
    }

    /// Pointer moved to `client_x`. Applied in hover mode, or in drag mode while pressed.
    pub fn pointer_move(&mut self, client_x: f32) -> bool {
        let tracking = match self.mode {
            SlideMode::Hover => true,
            SlideMode::Drag => self.is_dragging,
        };
        if !tracking {
            return false;
        }
        self.move_to(client_x)
    }

    pub fn press_start(&mut self) {
        if self.mode == SlideMode::Drag {
            self.is_dragging = true;
        }
    }

    /// Ends any drag, whatever the mode.
    pub fn press_end(&mut self) {
        self.is_dragging = false;
    }

    pub fn touch_start(&mut self) {
        self.is_dragging = true;
    }

    /// Touch has no hover: any move with a contact point drives the divider from the first contact.
    pub fn touch_move(&mut self, touches: &[f32]) -> bool {
        match touches.first() {
            Some(&client_x) => self.move_to(client_x),
            None => false,
        }
    }

    pub fn touch_end(&mut self) {
        self.is_dragging = false;
    }

    fn move_to(&mut self, client_x: f32) -> bool {
        match self.rect.percent_at(client_x) {
            Some(pct) if pct != self.position => {
                self.position = pct;
                true
            }
            _ => false,
        }
    }
}

/// The two images being compared.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComparePair {
    /// Back image, shown in full.
    pub first: Option<String>,
    /// Front image, clipped to the divider.
    pub second: Option<String>,
}

impl ComparePair {
    pub fn new(first: Option<String>, second: Option<String>) -> Self {
        Self { first, second }
    }

    /// Both images present. Until then the surface shows a loading placeholder.
    pub fn is_ready(&self) -> bool {
        self.first.is_some() && self.second.is_some()
    }
}
