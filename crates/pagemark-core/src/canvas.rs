//! Scene graph: annotation document plus runtime canvas state.

use crate::camera::Camera;
use crate::document::PageImage;
use crate::shapes::{Line, Shape, ShapeId};
use kurbo::{Point, Rect, Size};
use std::collections::HashMap;

/// Pointer hit tolerance in surface pixels.
pub const HIT_TOLERANCE: f64 = 4.0;

/// All annotations on the canvas.
#[derive(Debug, Clone, Default)]
pub struct CanvasDocument {
    /// All shapes in the document, keyed by ID.
    pub shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    pub z_order: Vec<ShapeId>,
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape to the document.
    pub fn add_shape(&mut self, shape: Shape) {
        let id = shape.id();
        self.z_order.push(id);
        self.shapes.insert(id, shape);
    }

    /// Remove a shape from the document.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        self.z_order.retain(|&shape_id| shape_id != id);
        self.shapes.remove(&id)
    }

    /// Get a shape by ID.
    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    /// Get a mutable reference to a shape by ID.
    pub fn get_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    /// Get shapes in z-order (back to front).
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    /// Find shapes at a point (in canvas coordinates), front to back.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|&id| {
                self.shapes
                    .get(&id)
                    .filter(|s| s.hit_test(point, tolerance))
                    .map(|_| id)
            })
            .collect()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Get the number of shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }
}

/// Notifications the canvas raises for its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasEvent {
    ObjectAdded(ShapeId),
    ObjectRemoved(ShapeId),
}

/// The page image drawn behind all annotations.
#[derive(Debug, Clone)]
pub struct PageBackground {
    pub image: PageImage,
    /// Placement in canvas coordinates.
    pub rect: Rect,
}

/// Runtime canvas state.
#[derive(Debug, Clone)]
pub struct Canvas {
    /// The annotations.
    pub document: CanvasDocument,
    /// Viewport transform.
    pub camera: Camera,
    size: Size,
    active_object: Option<ShapeId>,
    selection_enabled: bool,
    background: Option<PageBackground>,
    events: Vec<CanvasEvent>,
    needs_render: bool,
}

impl Canvas {
    /// Create a canvas of `width` x `height` surface pixels.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            document: CanvasDocument::new(),
            camera: Camera::new(),
            size: Size::new(width, height),
            active_object: None,
            selection_enabled: true,
            background: None,
            events: Vec::new(),
            needs_render: true,
        }
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Resize the canvas element. The viewport transform is left alone.
    pub fn set_dimensions(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
        self.needs_render = true;
    }

    pub fn zoom(&self) -> f64 {
        self.camera.zoom
    }

    /// Set the viewport to a uniform scale of `zoom`.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.camera.set_zoom(zoom);
        self.needs_render = true;
    }

    /// Centre of the visible area in canvas coordinates.
    pub fn center(&self) -> Point {
        self.camera
            .screen_to_world(Point::new(self.size.width / 2.0, self.size.height / 2.0))
    }

    /// Convert a surface-local pointer position into canvas coordinates.
    pub fn get_pointer(&self, raw: Point) -> Point {
        self.camera.screen_to_world(raw)
    }

    /// Topmost shape under a surface-local pointer position.
    pub fn find_target(&self, raw: Point) -> Option<ShapeId> {
        let point = self.get_pointer(raw);
        self.document
            .shapes_at_point(point, HIT_TOLERANCE / self.camera.zoom)
            .first()
            .copied()
    }

    /// Add a shape and queue an [`CanvasEvent::ObjectAdded`].
    pub fn add(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.document.add_shape(shape);
        self.events.push(CanvasEvent::ObjectAdded(id));
        id
    }

    /// Remove a shape, dropping it as active object if needed.
    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let removed = self.document.remove_shape(id)?;
        if self.active_object == Some(id) {
            self.active_object = None;
        }
        self.events.push(CanvasEvent::ObjectRemoved(id));
        self.needs_render = true;
        Some(removed)
    }

    /// Drain pending events in the order they were raised.
    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn line(&self, id: ShapeId) -> Option<&Line> {
        self.document.get_shape(id).and_then(Shape::as_line)
    }

    pub fn line_mut(&mut self, id: ShapeId) -> Option<&mut Line> {
        self.document.get_shape_mut(id).and_then(Shape::as_line_mut)
    }

    /// Lines in z-order.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.document.shapes_ordered().filter_map(Shape::as_line)
    }

    /// Whether rubber-band multi-selection is allowed.
    pub fn selection_enabled(&self) -> bool {
        self.selection_enabled
    }

    pub fn set_selection_enabled(&mut self, enabled: bool) {
        self.selection_enabled = enabled;
    }

    /// Mark every shape selectable or not.
    pub fn set_all_selectable(&mut self, selectable: bool) {
        for shape in self.document.shapes.values_mut() {
            shape.set_selectable(selectable);
        }
    }

    pub fn active_object(&self) -> Option<ShapeId> {
        self.active_object
    }

    /// Make `id` the active object. Returns `false` if it is missing or not selectable.
    pub fn set_active_object(&mut self, id: ShapeId) -> bool {
        match self.document.get_shape(id) {
            Some(shape) if shape.is_selectable() => {
                self.active_object = Some(id);
                self.needs_render = true;
                true
            }
            _ => false,
        }
    }

    pub fn discard_active_object(&mut self) {
        if self.active_object.take().is_some() {
            self.needs_render = true;
        }
    }

    pub fn background(&self) -> Option<&PageBackground> {
        self.background.as_ref()
    }

    /// Install `image` as the background, scaled to the visible height and centred.
    pub fn set_background(&mut self, image: PageImage) {
        let rect = self.fit_to_height(image.width, image.height);
        self.background = Some(PageBackground { image, rect });
        self.needs_render = true;
    }

    pub fn clear_background(&mut self) {
        if self.background.take().is_some() {
            self.needs_render = true;
        }
    }

    fn fit_to_height(&self, width: u32, height: u32) -> Rect {
        let visible_height = self.size.height / self.camera.zoom;
        let scale = if height == 0 {
            0.0
        } else {
            visible_height / f64::from(height)
        };
        let placed = Size::new(f64::from(width) * scale, f64::from(height) * scale);
        Rect::from_center_size(self.center(), placed)
    }

    /// Ask for a repaint on the next frame.
    pub fn request_render(&mut self) {
        self.needs_render = true;
    }

    /// Take the pending repaint flag.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_render)
    }
}
