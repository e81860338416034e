//! Viewport transform between surface pixels and canvas space.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Camera holds the canvas viewport transform.
///
/// Resizing the surface rescales the zoom uniformly so annotations keep their
/// position relative to the page. The offset stays at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset
    pub offset: Vec2,
    /// Current zoom level (1.0 = one canvas unit per pixel)
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Create a new camera with an identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts canvas coordinates to surface coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Get the inverse transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a surface point to canvas coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a canvas point to surface coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Replace the viewport with a pure uniform scale.
    ///
    /// Non-positive or non-finite zoom values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() || zoom <= 0.0 {
            log::warn!("Ignoring invalid zoom {zoom}");
            return;
        }
        self.offset = Vec2::ZERO;
        self.zoom = zoom;
    }
}
