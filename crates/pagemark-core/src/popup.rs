//! State behind the line options popup.

use crate::shapes::{SerializableColor, ShapeId};
use crate::tools::{DrawingDefaults, clamp_stroke_width};
use kurbo::Point;

/// What the popup asks the surface to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PopupIntent {
    ColorChanged(SerializableColor),
    WidthChanged(f64),
    Close,
}

/// Popup visibility, placement and the values it is editing.
///
/// Color edits are meant to preview on the bound line; width edits are only
/// staged. Both become the drawing defaults when the popup closes.
#[derive(Debug, Clone, PartialEq)]
pub struct LineOptionsPopup {
    visible: bool,
    /// Anchor in canvas coordinates.
    position: Point,
    color: SerializableColor,
    width: f64,
    target: Option<ShapeId>,
}

impl Default for LineOptionsPopup {
    fn default() -> Self {
        let defaults = DrawingDefaults::default();
        Self {
            visible: false,
            position: Point::ZERO,
            color: defaults.color,
            width: defaults.width,
            target: None,
        }
    }
}

impl LineOptionsPopup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn color(&self) -> SerializableColor {
        self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// The line whose color previews live.
    pub fn target(&self) -> Option<ShapeId> {
        self.target
    }

    /// Show at `position`, bound to `target` and pre-filled with its stroke.
    pub fn open(&mut self, position: Point, target: ShapeId, color: SerializableColor, width: f64) {
        self.visible = true;
        self.position = position;
        self.target = Some(target);
        self.color = color;
        self.width = clamp_stroke_width(width).unwrap_or(self.width);
    }

    /// Hide without committing anything.
    pub fn hide(&mut self) {
        self.visible = false;
        self.target = None;
    }

    /// Stage a color.
    pub fn set_color(&mut self, color: SerializableColor) {
        self.color = color;
    }

    /// Stage a width, clamped to the accepted range.
    ///
    /// Returns `false` if the input was not a finite number.
    pub fn set_width(&mut self, width: f64) -> bool {
        match clamp_stroke_width(width) {
            Some(w) => {
                self.width = w;
                true
            }
            None => false,
        }
    }

    /// Hide and hand back the staged values as new defaults.
    pub fn close(&mut self) -> DrawingDefaults {
        self.hide();
        DrawingDefaults::new(self.color, self.width)
    }
}
