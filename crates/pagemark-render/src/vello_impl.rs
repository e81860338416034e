//! Vello-based renderer implementation.

use crate::renderer::{RenderContext, Renderer};
use kurbo::{Affine, Rect, Shape as KurboShape, Stroke};
use pagemark_core::canvas::PageBackground;
use pagemark_core::shapes::{Line, ShapeTrait};
use pagemark_core::widget::{Handle, HandleShape, SelectionStyle, line_handles, selection_frame};
use peniko::{Color, Fill};
use vello::Scene;

/// Vello-based renderer for GPU-accelerated 2D graphics.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
    /// Current zoom level (for zoom-independent UI elements).
    zoom: f64,
    /// Last uploaded page, keyed by (generation, page).
    page_cache: Option<((u64, u32), peniko::ImageData)>,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    /// Create a new Vello renderer.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            zoom: 1.0,
            page_cache: None,
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    fn page_image(&mut self, background: &PageBackground) -> peniko::ImageData {
        let key = (background.image.generation, background.image.page);
        if let Some((cached_key, data)) = &self.page_cache {
            if *cached_key == key {
                return data.clone();
            }
        }
        let image = &background.image;
        let data = peniko::ImageData {
            data: peniko::Blob::new(image.rgba.clone()),
            format: peniko::ImageFormat::Rgba8,
            width: image.width,
            height: image.height,
            alpha_type: peniko::ImageAlphaType::Alpha,
        };
        log::debug!("Uploading page {} ({}x{})", image.page, image.width, image.height);
        self.page_cache = Some((key, data.clone()));
        data
    }

    fn render_background(&mut self, background: &PageBackground, transform: Affine) {
        let image = &background.image;
        if image.width == 0 || image.height == 0 {
            return;
        }
        let data = self.page_image(background);
        let rect = background.rect;
        let image_transform = transform
            * Affine::translate((rect.x0, rect.y0))
            * Affine::scale_non_uniform(
                rect.width() / f64::from(image.width),
                rect.height() / f64::from(image.height),
            );
        self.scene.draw_image(&peniko::ImageBrush::from(data), image_transform);
    }

    fn render_line(&mut self, line: &Line, transform: Affine) {
        let stroke = Stroke::new(line.style.stroke_width);
        self.scene
            .stroke(&stroke, transform, line.style.stroke(), None, &line.to_path());
    }

    /// Dashed frame plus endpoint handles around the active line.
    /// Sizes are divided by zoom so they stay constant on screen.
    fn render_selection(&mut self, line: &Line, style: &SelectionStyle, transform: Affine) {
        let color: Color = style.color.into();
        let frame = selection_frame(line, style, self.zoom);
        let dashes = [style.border_dash[0] / self.zoom, style.border_dash[1] / self.zoom];
        let stroke = Stroke::new(1.0 / self.zoom).with_dashes(0.0, dashes);
        self.scene
            .stroke(&stroke, transform, color, None, &frame.to_path(0.1));

        for handle in line_handles(line, style) {
            self.render_handle(&handle, style, transform);
        }
    }

    fn render_handle(&mut self, handle: &Handle, style: &SelectionStyle, transform: Affine) {
        let color: Color = style.color.into();
        let half = style.corner_size / 2.0 / self.zoom;
        let pos = handle.position;
        let path = match handle.shape {
            HandleShape::Circle => kurbo::Circle::new(pos, half).to_path(0.1),
            HandleShape::Square => {
                Rect::new(pos.x - half, pos.y - half, pos.x + half, pos.y + half).to_path(0.1)
            }
        };
        if style.transparent_corners {
            self.scene.stroke(
                &Stroke::new(1.0 / self.zoom),
                transform,
                color,
                None,
                &path,
            );
        } else {
            self.scene.fill(Fill::NonZero, transform, color, None, &path);
        }
    }

    /// Paint the window area around the canvas so strokes and the page do not
    /// spill outside it.
    fn render_gutter(&mut self, ctx: &RenderContext) {
        let view = Rect::from_origin_size(kurbo::Point::ZERO, ctx.viewport_size);
        let canvas = ctx.canvas_rect().intersect(view);
        let bands = [
            Rect::new(view.x0, view.y0, view.x1, canvas.y0),
            Rect::new(view.x0, canvas.y1, view.x1, view.y1),
            Rect::new(view.x0, canvas.y0, canvas.x0, canvas.y1),
            Rect::new(canvas.x1, canvas.y0, view.x1, canvas.y1),
        ];
        let transform = ctx.screen_transform();
        for band in bands {
            if band.width() > 0.0 && band.height() > 0.0 {
                self.scene.fill(
                    Fill::NonZero,
                    transform,
                    ctx.background_color,
                    None,
                    &band.to_path(0.1),
                );
            }
        }
    }
}

impl Renderer for VelloRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.scene.reset();
        self.zoom = ctx.canvas.zoom();

        let screen = ctx.screen_transform();
        self.scene.fill(
            Fill::NonZero,
            screen,
            ctx.paper_color,
            None,
            &ctx.canvas_rect().to_path(0.1),
        );

        let transform = ctx.canvas_transform();
        if let Some(background) = ctx.canvas.background() {
            self.render_background(background, transform);
        } else {
            self.page_cache = None;
        }

        for line in ctx.canvas.lines() {
            self.render_line(line, transform);
        }

        if let Some(line) = ctx.canvas.active_object().and_then(|id| ctx.canvas.line(id)) {
            self.render_selection(line, &ctx.selection, transform);
        }

        self.render_gutter(ctx);
    }
}
