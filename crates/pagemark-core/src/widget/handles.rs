//! Handle definitions for the active object frame.

use crate::shapes::{Line, SerializableColor, ShapeTrait};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A handle drawn on the active object.
#[derive(Debug, Clone)]
pub struct Handle {
    /// The kind of handle.
    pub kind: HandleKind,
    /// Position in canvas coordinates.
    pub position: Point,
    /// Visual shape of the handle.
    pub shape: HandleShape,
}

/// Which part of the object a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Start,
    End,
}

/// Visual shape of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleShape {
    Square,
    #[default]
    Circle,
}

impl Handle {
    /// Create a new handle.
    pub fn new(kind: HandleKind, position: Point) -> Self {
        Self {
            kind,
            position,
            shape: HandleShape::default(),
        }
    }

    /// Set the handle shape.
    pub fn with_shape(mut self, shape: HandleShape) -> Self {
        self.shape = shape;
        self
    }
}

/// Appearance of the active-object frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionStyle {
    /// Handle shape.
    pub corner_style: HandleShape,
    /// Frame and handle color.
    pub color: SerializableColor,
    /// Handle diameter in surface pixels.
    pub corner_size: f64,
    /// Gap between the object bounds and the frame, in surface pixels.
    pub padding: f64,
    /// Dash pattern of the frame.
    pub border_dash: [f64; 2],
    /// Draw handles as outlines only.
    pub transparent_corners: bool,
}

impl Default for SelectionStyle {
    fn default() -> Self {
        Self {
            corner_style: HandleShape::Circle,
            color: SerializableColor::new(0x44, 0x47, 0xa9, 255),
            corner_size: 6.0,
            padding: 10.0,
            border_dash: [5.0, 5.0],
            transparent_corners: false,
        }
    }
}

/// Endpoint handles for a line.
pub fn line_handles(line: &Line, style: &SelectionStyle) -> Vec<Handle> {
    vec![
        Handle::new(HandleKind::Start, line.start).with_shape(style.corner_style),
        Handle::new(HandleKind::End, line.end).with_shape(style.corner_style),
    ]
}

/// Frame around a line's bounds, padded by `style.padding` surface pixels.
pub fn selection_frame(line: &Line, style: &SelectionStyle, zoom: f64) -> Rect {
    let pad = style.padding / zoom;
    line.bounds().inflate(pad, pad)
}
