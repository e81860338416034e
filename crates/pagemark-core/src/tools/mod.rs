//! Tool modes and the pointer bindings each one installs.

use crate::shapes::{SerializableColor, ShapeStyle};
use serde::{Deserialize, Serialize};

/// Available interaction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolMode {
    /// Press-drag-release draws a straight line.
    Line,
    /// Clicking a line removes it.
    Eraser,
}

impl ToolMode {
    pub fn label(&self) -> &'static str {
        match self {
            ToolMode::Line => "Line",
            ToolMode::Eraser => "Eraser",
        }
    }

    fn bindings(self) -> PointerBindings {
        match self {
            ToolMode::Line => PointerBindings::LineDrawing,
            ToolMode::Eraser => PointerBindings::Erase,
        }
    }
}

/// Which canvas pointer handlers are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerBindings {
    /// No mode handlers; pointer input only reaches objects.
    #[default]
    Detached,
    /// Down/move/up drive line creation.
    LineDrawing,
    /// Object clicks remove the object.
    Erase,
}

/// Tracks the active mode. At most one set of bindings is attached at a time.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    current: Option<ToolMode>,
    bindings: PointerBindings,
}

impl ToolManager {
    /// Create a manager with no mode active.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<ToolMode> {
        self.current
    }

    pub fn bindings(&self) -> PointerBindings {
        self.bindings
    }

    pub fn is_active(&self, mode: ToolMode) -> bool {
        self.current == Some(mode)
    }

    /// Switch to `mode`, swapping the previous bindings for the new ones.
    ///
    /// Returns `false` and leaves everything untouched if `mode` is already active.
    pub fn activate(&mut self, mode: ToolMode) -> bool {
        if self.is_active(mode) {
            return false;
        }
        if let Some(previous) = self.current {
            log::debug!("Detaching {} bindings", previous.label());
        }
        self.current = Some(mode);
        self.bindings = mode.bindings();
        true
    }
}

/// Width bounds accepted for new lines.
pub const MIN_STROKE_WIDTH: f64 = 1.0;
pub const MAX_STROKE_WIDTH: f64 = 10.0;

/// Clamp a width to the accepted range, rounding to a whole pixel.
///
/// Returns `None` for non-finite input.
pub fn clamp_stroke_width(width: f64) -> Option<f64> {
    width
        .is_finite()
        .then(|| width.round().clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH))
}

/// Style applied to newly drawn lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawingDefaults {
    pub color: SerializableColor,
    pub width: f64,
}

impl Default for DrawingDefaults {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            width: 5.0,
        }
    }
}

impl DrawingDefaults {
    /// Build defaults, clamping the width into range.
    pub fn new(color: SerializableColor, width: f64) -> Self {
        let width = clamp_stroke_width(width).unwrap_or(Self::default().width);
        Self { color, width }
    }

    /// Style for a new line.
    pub fn style(&self) -> ShapeStyle {
        ShapeStyle::new(self.color, self.width)
    }
}
