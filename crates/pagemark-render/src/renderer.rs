//! Renderer trait abstraction.

use kurbo::{Affine, Point, Rect, Size};
use pagemark_core::canvas::Canvas;
use pagemark_core::widget::SelectionStyle;
use peniko::Color;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The canvas to render.
    pub canvas: &'a Canvas,
    /// Window size in logical pixels.
    pub viewport_size: Size,
    /// Where the canvas's top-left corner sits in the window, in logical pixels.
    pub canvas_origin: Point,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Color outside the canvas.
    pub background_color: Color,
    /// Color of the canvas itself, under the page image.
    pub paper_color: Color,
    /// Active object frame appearance.
    pub selection: SelectionStyle,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(canvas: &'a Canvas, viewport_size: Size) -> Self {
        Self {
            canvas,
            viewport_size,
            canvas_origin: Point::ZERO,
            scale_factor: 1.0,
            background_color: Color::from_rgba8(229, 231, 235, 255),
            paper_color: Color::WHITE,
            selection: SelectionStyle::default(),
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the canvas position inside the window.
    pub fn with_canvas_origin(mut self, origin: Point) -> Self {
        self.canvas_origin = origin;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the active object frame style.
    pub fn with_selection_style(mut self, style: SelectionStyle) -> Self {
        self.selection = style;
        self
    }

    /// Window (logical) to physical pixels.
    pub fn screen_transform(&self) -> Affine {
        Affine::scale(self.scale_factor)
    }

    /// Canvas space to physical pixels.
    pub fn canvas_transform(&self) -> Affine {
        self.screen_transform()
            * Affine::translate(self.canvas_origin.to_vec2())
            * self.canvas.camera.transform()
    }

    /// The canvas element in logical window pixels.
    pub fn canvas_rect(&self) -> Rect {
        Rect::from_origin_size(self.canvas_origin, self.canvas.size())
    }
}

/// Trait for rendering backends.
///
/// Implementations can use Vello, wgpu directly, or other rendering engines.
pub trait Renderer: Send + Sync {
    /// Build the scene/command buffer for a frame.
    ///
    /// This method is called once per frame and should prepare all drawing commands.
    fn build_scene(&mut self, ctx: &RenderContext);
}
