//! The drawing surface: canvas host, tool modes and the line gesture.
//!
//! Raw pointer positions handed to the surface are surface-local device
//! pixels. The canvas converts them to canvas space through the viewport
//! transform, and line endpoints are stored in canvas space.

use crate::canvas::{Canvas, CanvasEvent};
use crate::config::{PopupReveal, SurfaceConfig};
use crate::document::{
    DEFAULT_TARGET_HEIGHT, FileReaderInfo, PageImage, PageRequest, PageSource, PdfFile,
    RenderedPage,
};
use crate::error::{PageError, PageResult};
use crate::input::{MouseButton, PointerEvent};
use crate::popup::{LineOptionsPopup, PopupIntent};
use crate::shapes::{Line, Shape, ShapeId};
use crate::tools::{DrawingDefaults, PointerBindings, ToolManager, ToolMode};
use kurbo::Point;
use std::collections::HashSet;

/// Owns every piece of mutable drawing state for one document view.
#[derive(Debug)]
pub struct DrawingSurface {
    config: SurfaceConfig,
    canvas: Option<Canvas>,
    tools: ToolManager,
    defaults: DrawingDefaults,
    /// Line being drawn between pointer-down and pointer-up.
    in_progress: Option<ShapeId>,
    mouse_down: bool,
    /// Lines waiting for their default color to be re-applied once added.
    pending_color: HashSet<ShapeId>,
    popup: LineOptionsPopup,
    file_reader: FileReaderInfo,
}

impl Default for DrawingSurface {
    fn default() -> Self {
        Self::new(SurfaceConfig::default())
    }
}

impl DrawingSurface {
    pub fn new(config: SurfaceConfig) -> Self {
        let defaults = config.drawing_defaults();
        Self {
            config,
            canvas: None,
            tools: ToolManager::new(),
            defaults,
            in_progress: None,
            mouse_down: false,
            pending_color: HashSet::new(),
            popup: LineOptionsPopup::new(),
            file_reader: FileReaderInfo::new(),
        }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn defaults(&self) -> DrawingDefaults {
        self.defaults
    }

    pub fn mode(&self) -> Option<ToolMode> {
        self.tools.current()
    }

    pub fn bindings(&self) -> PointerBindings {
        self.tools.bindings()
    }

    pub fn popup(&self) -> &LineOptionsPopup {
        &self.popup
    }

    pub fn file_reader(&self) -> &FileReaderInfo {
        &self.file_reader
    }

    /// The line currently being drawn.
    pub fn in_progress(&self) -> Option<ShapeId> {
        self.in_progress
    }

    pub fn is_drawing(&self) -> bool {
        self.mouse_down
    }

    /// Tool controls only work once a file has rendered and a canvas exists.
    pub fn can_activate_tools(&self) -> bool {
        self.file_reader.is_loaded() && self.canvas.is_some()
    }

    /// Create the canvas to fit `container_width`. Does nothing if it already exists.
    pub fn init_canvas(&mut self, container_width: f64) {
        if self.canvas.is_some() {
            return;
        }
        if !container_width.is_finite() || container_width <= 0.0 {
            log::debug!("Deferring canvas creation, container width {container_width}");
            return;
        }
        let height = container_width / self.config.aspect_ratio;
        let mut canvas = Canvas::new(container_width, height);
        if let Some(image) = self.file_reader.current_image() {
            canvas.set_background(image.clone());
        }
        log::info!("Canvas created at {container_width}x{height}");
        self.canvas = Some(canvas);
    }

    pub fn activate_line_tool(&mut self) -> bool {
        self.activate(ToolMode::Line)
    }

    pub fn activate_eraser(&mut self) -> bool {
        self.activate(ToolMode::Eraser)
    }

    /// Switch tool mode.
    ///
    /// Returns `true` if the mode changed. Re-activating the current mode and
    /// activating before a file is loaded are both no-ops.
    pub fn activate(&mut self, mode: ToolMode) -> bool {
        if !self.file_reader.is_loaded() {
            log::debug!("Ignoring {} activation, no file loaded", mode.label());
            return false;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            log::debug!("Ignoring {} activation, no canvas", mode.label());
            return false;
        };
        if !self.tools.activate(mode) {
            return false;
        }
        self.mouse_down = false;
        self.in_progress = None;
        canvas.set_selection_enabled(false);
        canvas.set_all_selectable(false);
        canvas.discard_active_object();
        canvas.request_render();
        log::info!("{} mode active", mode.label());
        true
    }

    /// Primary-button press anywhere on the surface.
    ///
    /// A press on a line goes to [`Self::on_object_pointer_down`]; anything
    /// else starts a gesture for the active mode.
    pub fn pointer_down(&mut self, raw: Point) {
        let target = self.canvas.as_ref().and_then(|c| c.find_target(raw));
        match target {
            Some(id) => self.on_object_pointer_down(id, raw),
            None => {
                if let Some(canvas) = self.canvas.as_mut() {
                    canvas.discard_active_object();
                }
                self.on_pointer_down(raw);
            }
        }
    }

    pub fn pointer_move(&mut self, raw: Point) {
        self.on_pointer_move(raw);
    }

    pub fn pointer_up(&mut self) {
        self.on_pointer_up();
    }

    /// Route a surface-local pointer event. Only the primary button draws.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            } => self.pointer_down(position),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up {
                button: MouseButton::Left,
                ..
            } => self.pointer_up(),
            _ => {}
        }
    }

    /// Begin a line at the pointer, using the current defaults.
    pub fn on_pointer_down(&mut self, raw: Point) {
        if self.tools.bindings() != PointerBindings::LineDrawing {
            return;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        self.mouse_down = true;
        self.popup.hide();

        let point = canvas.get_pointer(raw);
        let line = Line::at(point, self.defaults.style());
        let id = line.id;
        self.pending_color.insert(id);
        canvas.add(Shape::Line(line));
        canvas.request_render();
        self.in_progress = Some(id);
        log::debug!("Line {id} started at ({:.1}, {:.1})", point.x, point.y);

        if self.config.popup_reveal == PopupReveal::GestureStart {
            self.popup
                .open(point, id, self.defaults.color, self.defaults.width);
        }
        self.process_canvas_events();
    }

    /// Drag the in-progress line's end point to the pointer.
    pub fn on_pointer_move(&mut self, raw: Point) {
        if !self.mouse_down {
            return;
        }
        let (Some(canvas), Some(id)) = (self.canvas.as_mut(), self.in_progress) else {
            return;
        };
        let point = canvas.get_pointer(raw);
        let Some(line) = canvas.line_mut(id) else {
            return;
        };
        line.end = point;
        canvas.request_render();
    }

    /// Finish the gesture and, by default, reveal the popup at the line's end.
    pub fn on_pointer_up(&mut self) {
        if !self.mouse_down {
            return;
        }
        self.mouse_down = false;
        let Some(id) = self.in_progress.take() else {
            return;
        };
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        if let Some(line) = canvas.line(id) {
            log::debug!("Line {id} finished, length {:.1}", line.length());
            if self.config.popup_reveal == PopupReveal::GestureEnd {
                self.popup.open(
                    line.end,
                    id,
                    line.style.stroke_color,
                    line.style.stroke_width,
                );
            }
        }
        canvas.request_render();
    }

    /// A press landed on an existing object.
    pub fn on_object_pointer_down(&mut self, id: ShapeId, raw: Point) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        if self.tools.bindings() == PointerBindings::Erase {
            if canvas.remove(id).is_some() {
                log::info!("Erased line {id}");
            }
            self.process_canvas_events();
            return;
        }
        let point = canvas.get_pointer(raw);
        let Some(line) = canvas.line(id) else {
            return;
        };
        let (color, width, selectable) =
            (line.style.stroke_color, line.style.stroke_width, line.selectable);
        self.popup.open(point, id, color, width);
        if selectable {
            canvas.set_active_object(id);
        }
        canvas.request_render();
    }

    /// Open a new file. Returns the request for its first page.
    pub fn on_file_selected(&mut self, file: PdfFile) -> PageRequest {
        log::info!("Opened {} ({} bytes)", file.name, file.bytes.len());
        self.file_reader.select_file(file);
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.clear_background();
        }
        self.current_request()
    }

    /// Take a renderer result: record the page count and show the image.
    pub fn on_page_rendered(&mut self, rendered: RenderedPage) -> bool {
        if rendered.image.generation != self.file_reader.generation() {
            log::debug!("Discarding page from an earlier file");
            return false;
        }
        self.file_reader.set_total_pages(rendered.total_pages);
        self.on_page_image_ready(rendered.image)
    }

    /// Install a page image as the canvas background.
    ///
    /// Images that do not answer the current request are dropped. Before the
    /// canvas exists the image is kept and applied when it is created.
    pub fn on_page_image_ready(&mut self, image: PageImage) -> bool {
        if !self.file_reader.accept_image(image.clone()) {
            log::debug!(
                "Discarding stale image for page {} (generation {})",
                image.page,
                image.generation
            );
            return false;
        }
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.set_background(image);
        }
        true
    }

    pub fn next_page(&mut self) -> Option<PageRequest> {
        self.file_reader.next().then(|| self.current_request())
    }

    pub fn previous_page(&mut self) -> Option<PageRequest> {
        self.file_reader.previous().then(|| self.current_request())
    }

    pub fn go_to_page(&mut self, page: u32) -> Option<PageRequest> {
        self.file_reader.go_to(page).then(|| self.current_request())
    }

    /// Ask `source` for `request` and feed the result back in.
    ///
    /// On failure the current page falls back to the one still on screen.
    pub fn fetch_page(&mut self, source: &dyn PageSource, request: PageRequest) -> PageResult<()> {
        let Some(file) = self.file_reader.file().cloned() else {
            return Ok(());
        };
        match render_answering(source, &file, &request) {
            Ok(rendered) => {
                self.on_page_rendered(rendered);
                Ok(())
            }
            Err(e) => {
                if request.generation == self.file_reader.generation()
                    && self.file_reader.revert_to_shown_page()
                {
                    log::warn!(
                        "Page {} failed, staying on page {}",
                        request.page,
                        self.file_reader.current_page()
                    );
                }
                Err(e)
            }
        }
    }

    /// Open `file` and render its first page through `source`.
    pub fn load_file(&mut self, file: PdfFile, source: &dyn PageSource) -> PageResult<()> {
        let request = self.on_file_selected(file);
        self.fetch_page(source, request)
    }

    /// Track a new container width with a uniform zoom.
    pub fn on_resize(&mut self, new_width: f64) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        if !new_width.is_finite() || new_width <= 0.0 || canvas.width() <= 0.0 {
            return;
        }
        if (new_width - canvas.width()).abs() < f64::EPSILON {
            return;
        }
        let ratio = canvas.width() / canvas.height();
        let scale = new_width / canvas.width();
        let zoom = canvas.zoom() * scale;
        canvas.set_dimensions(new_width, new_width / ratio);
        canvas.set_zoom(zoom);
        log::debug!("Resized canvas to {new_width:.0}, zoom {zoom:.3}");
    }

    /// React to the line options popup.
    pub fn apply_popup_intent(&mut self, intent: PopupIntent) {
        match intent {
            PopupIntent::ColorChanged(color) => {
                self.popup.set_color(color);
                let target = self.popup.target();
                if let (Some(canvas), Some(id)) = (self.canvas.as_mut(), target) {
                    if let Some(line) = canvas.line_mut(id) {
                        line.style.stroke_color = color;
                        canvas.request_render();
                    }
                }
            }
            PopupIntent::WidthChanged(width) => {
                if !self.popup.set_width(width) {
                    log::debug!("Ignoring width {width}");
                }
            }
            PopupIntent::Close => {
                if !self.popup.is_visible() {
                    return;
                }
                self.defaults = self.popup.close();
                log::info!(
                    "Drawing defaults now {} / {}",
                    self.defaults.color,
                    self.defaults.width
                );
            }
        }
    }

    /// Popup anchor in surface-local pixels, while it is visible.
    pub fn popup_screen_position(&self) -> Option<Point> {
        let canvas = self.canvas.as_ref()?;
        self.popup
            .is_visible()
            .then(|| canvas.camera.world_to_screen(self.popup.position()))
    }

    /// Take the pending repaint flag.
    pub fn take_render_request(&mut self) -> bool {
        self.canvas
            .as_mut()
            .is_some_and(|canvas| canvas.take_render_request())
    }

    fn current_request(&self) -> PageRequest {
        let height = self
            .canvas
            .as_ref()
            .map(|c| c.height().round().max(1.0) as u32)
            .unwrap_or(DEFAULT_TARGET_HEIGHT)
            .max(DEFAULT_TARGET_HEIGHT);
        self.file_reader.request(height)
    }

    fn process_canvas_events(&mut self) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        for event in canvas.take_events() {
            match event {
                CanvasEvent::ObjectAdded(id) => {
                    if self.pending_color.remove(&id) {
                        if let Some(line) = canvas.line_mut(id) {
                            line.style.stroke_color = self.defaults.color;
                            canvas.request_render();
                        }
                    }
                }
                CanvasEvent::ObjectRemoved(id) => {
                    self.pending_color.remove(&id);
                    if self.in_progress == Some(id) {
                        self.in_progress = None;
                        self.mouse_down = false;
                    }
                    if self.popup.target() == Some(id) {
                        self.popup.hide();
                    }
                }
            }
        }
    }
}

/// Render `request`, rejecting an image for any other page.
fn render_answering(
    source: &dyn PageSource,
    file: &PdfFile,
    request: &PageRequest,
) -> PageResult<RenderedPage> {
    let rendered = source.render_page(file, request)?;
    if !rendered.image.answers(request) {
        return Err(PageError::Render {
            page: request.page,
            reason: format!("renderer answered page {}", rendered.image.page),
        });
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SerializableColor;
    use std::cell::RefCell;

    /// Renders every page as a solid image and records what was asked for.
    struct FakeSource {
        total_pages: u32,
        requests: RefCell<Vec<PageRequest>>,
    }

    impl FakeSource {
        fn new(total_pages: u32) -> Self {
            Self {
                total_pages,
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSource for FakeSource {
        fn render_page(&self, _file: &PdfFile, request: &PageRequest) -> PageResult<RenderedPage> {
            self.requests.borrow_mut().push(*request);
            if request.page > self.total_pages {
                return Err(PageError::PageOutOfRange {
                    page: request.page,
                    total: self.total_pages,
                });
            }
            Ok(RenderedPage {
                total_pages: self.total_pages,
                image: PageImage::new(request, 3, 4, vec![255; 48])?,
            })
        }
    }

    fn pdf(name: &str) -> PdfFile {
        PdfFile::new(name, b"%PDF-1.7".to_vec())
    }

    fn ready_surface() -> DrawingSurface {
        let mut surface = DrawingSurface::default();
        surface.init_canvas(800.0);
        surface.load_file(pdf("a.pdf"), &FakeSource::new(3)).unwrap();
        surface
    }

    fn draw(surface: &mut DrawingSurface, from: Point, moves: &[Point]) -> ShapeId {
        surface.pointer_down(from);
        let id = surface.in_progress().unwrap();
        for &p in moves {
            surface.pointer_move(p);
        }
        surface.pointer_up();
        id
    }

    fn line(surface: &DrawingSurface, id: ShapeId) -> &Line {
        surface.canvas().unwrap().line(id).unwrap()
    }

    #[test]
    fn test_init_canvas_uses_aspect_ratio() {
        let mut surface = DrawingSurface::default();
        surface.init_canvas(800.0);
        let canvas = surface.canvas().unwrap();
        assert!((canvas.width() - 800.0).abs() < f64::EPSILON);
        assert!((canvas.height() - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_operations_without_canvas_are_noops() {
        let mut surface = DrawingSurface::default();
        surface.on_pointer_down(Point::new(1.0, 1.0));
        surface.on_pointer_move(Point::new(2.0, 2.0));
        surface.on_pointer_up();
        surface.on_resize(100.0);
        surface.apply_popup_intent(PopupIntent::ColorChanged(SerializableColor::white()));
        assert!(surface.canvas().is_none());
        assert!(!surface.is_drawing());
    }

    #[test]
    fn test_line_tool_requires_file() {
        let mut surface = DrawingSurface::default();
        surface.init_canvas(800.0);
        assert!(!surface.can_activate_tools());
        assert!(!surface.activate_line_tool());
        assert_eq!(surface.mode(), None);

        surface.load_file(pdf("a.pdf"), &FakeSource::new(1)).unwrap();
        assert!(surface.activate_line_tool());
        assert_eq!(surface.bindings(), PointerBindings::LineDrawing);
    }

    #[test]
    fn test_activation_is_idempotent() {
        let mut surface = ready_surface();
        assert!(surface.activate_line_tool());
        assert!(!surface.activate_line_tool());
        assert_eq!(surface.mode(), Some(ToolMode::Line));
    }

    #[test]
    fn test_activation_locks_existing_objects() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        let id = draw(&mut surface, Point::new(10.0, 10.0), &[Point::new(60.0, 10.0)]);
        assert!(line(&surface, id).selectable);

        surface.activate_eraser();
        let canvas = surface.canvas().unwrap();
        assert!(!canvas.selection_enabled());
        assert!(!line(&surface, id).selectable);
        assert_eq!(canvas.active_object(), None);
    }

    #[test]
    fn test_pointer_down_outside_line_mode_does_nothing() {
        let mut surface = ready_surface();
        surface.pointer_down(Point::new(10.0, 10.0));
        assert!(!surface.is_drawing());
        assert!(surface.canvas().unwrap().document.is_empty());
    }

    #[test]
    fn test_gesture_tracks_last_move_and_defaults() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        let moves = [Point::new(20.0, 30.0), Point::new(90.0, 5.0), Point::new(70.0, 40.0)];
        let id = draw(&mut surface, Point::new(10.0, 10.0), &moves);

        let l = line(&surface, id);
        assert_eq!(l.start, Point::new(10.0, 10.0));
        assert_eq!(l.end, Point::new(70.0, 40.0));
        assert_eq!(l.style.stroke_color, SerializableColor::black());
        assert!((l.style.stroke_width - 5.0).abs() < f64::EPSILON);
        assert_eq!(surface.in_progress(), None);
    }

    #[test]
    fn test_pointer_events_route_primary_button() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        surface.handle_pointer_event(PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Right,
        });
        assert!(!surface.is_drawing());

        surface.handle_pointer_event(PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Left,
        });
        let id = surface.in_progress().unwrap();
        surface.handle_pointer_event(PointerEvent::Move {
            position: Point::new(30.0, 10.0),
        });
        surface.handle_pointer_event(PointerEvent::Up {
            position: Point::new(30.0, 10.0),
            button: MouseButton::Left,
        });
        assert!(!surface.is_drawing());
        assert_eq!(line(&surface, id).end, Point::new(30.0, 10.0));
    }

    #[test]
    fn test_zero_length_line_is_kept() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        let id = draw(&mut surface, Point::new(10.0, 10.0), &[]);
        assert!(line(&surface, id).length().abs() < f64::EPSILON);
    }

    #[test]
    fn test_move_and_up_without_down_are_noops() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        surface.pointer_move(Point::new(5.0, 5.0));
        surface.pointer_up();
        assert!(surface.canvas().unwrap().document.is_empty());
        assert!(!surface.popup().is_visible());
    }

    #[test]
    fn test_popup_opens_at_gesture_end() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        surface.pointer_down(Point::new(10.0, 10.0));
        assert!(!surface.popup().is_visible());
        surface.pointer_move(Point::new(50.0, 50.0));
        surface.pointer_up();

        let popup = surface.popup();
        assert!(popup.is_visible());
        assert_eq!(popup.position(), Point::new(50.0, 50.0));
        assert_eq!(surface.popup_screen_position(), Some(Point::new(50.0, 50.0)));
    }

    #[test]
    fn test_popup_at_gesture_start_when_configured() {
        let config = SurfaceConfig {
            popup_reveal: PopupReveal::GestureStart,
            ..SurfaceConfig::default()
        };
        let mut surface = DrawingSurface::new(config);
        surface.init_canvas(800.0);
        surface.load_file(pdf("a.pdf"), &FakeSource::new(1)).unwrap();
        surface.activate_line_tool();

        surface.pointer_down(Point::new(10.0, 10.0));
        assert!(surface.popup().is_visible());
        assert_eq!(surface.popup().position(), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_new_gesture_hides_popup_without_commit() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        draw(&mut surface, Point::new(10.0, 10.0), &[Point::new(50.0, 10.0)]);
        surface.apply_popup_intent(PopupIntent::WidthChanged(9.0));

        surface.pointer_down(Point::new(10.0, 300.0));
        assert!(!surface.popup().is_visible());
        assert!((surface.defaults().width - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clicking_line_prefills_popup_with_that_line() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        let first = draw(&mut surface, Point::new(10.0, 10.0), &[Point::new(200.0, 10.0)]);
        surface.apply_popup_intent(PopupIntent::WidthChanged(2.0));
        surface.apply_popup_intent(PopupIntent::ColorChanged(SerializableColor::new(255, 0, 0, 255)));
        surface.apply_popup_intent(PopupIntent::Close);
        let second = draw(&mut surface, Point::new(10.0, 300.0), &[Point::new(200.0, 300.0)]);
        surface.apply_popup_intent(PopupIntent::Close);

        surface.pointer_down(Point::new(100.0, 11.0));
        let popup = surface.popup();
        assert_eq!(popup.target(), Some(first));
        assert_eq!(popup.color(), SerializableColor::new(255, 0, 0, 255));
        assert!((popup.width() - 5.0).abs() < f64::EPSILON);
        assert_eq!(popup.position(), Point::new(100.0, 11.0));
        // The press selected a line instead of drawing a new one.
        assert!(!surface.is_drawing());
        assert_eq!(surface.canvas().unwrap().document.len(), 2);

        surface.pointer_down(Point::new(100.0, 301.0));
        assert_eq!(surface.popup().target(), Some(second));
        assert!((surface.popup().width() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clicked_selectable_line_becomes_active() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        let id = draw(&mut surface, Point::new(10.0, 10.0), &[Point::new(200.0, 10.0)]);
        surface.pointer_down(Point::new(100.0, 10.0));
        assert_eq!(surface.canvas().unwrap().active_object(), Some(id));

        surface.pointer_down(Point::new(400.0, 400.0));
        assert_eq!(surface.canvas().unwrap().active_object(), None);
    }

    #[test]
    fn test_color_previews_live_width_staged() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        let id = draw(&mut surface, Point::new(10.0, 10.0), &[Point::new(50.0, 10.0)]);
        let green = SerializableColor::new(0, 255, 0, 255);

        surface.apply_popup_intent(PopupIntent::ColorChanged(green));
        surface.apply_popup_intent(PopupIntent::WidthChanged(9.0));
        assert_eq!(line(&surface, id).style.stroke_color, green);
        assert!((line(&surface, id).style.stroke_width - 5.0).abs() < f64::EPSILON);
        assert_eq!(surface.defaults(), DrawingDefaults::default());
    }

    #[test]
    fn test_close_commits_defaults_for_next_line() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        draw(&mut surface, Point::new(10.0, 10.0), &[Point::new(50.0, 10.0)]);
        let blue = SerializableColor::new(0, 0, 255, 255);
        surface.apply_popup_intent(PopupIntent::ColorChanged(blue));
        surface.apply_popup_intent(PopupIntent::WidthChanged(7.0));
        surface.apply_popup_intent(PopupIntent::Close);
        assert!(!surface.popup().is_visible());

        let next = draw(&mut surface, Point::new(10.0, 300.0), &[Point::new(50.0, 300.0)]);
        assert_eq!(line(&surface, next).style.stroke_color, blue);
        assert!((line(&surface, next).style.stroke_width - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_width_input_never_escapes_range() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        let inputs = [-5.0, 0.0, 0.4, 10.6, 250.0, f64::NAN, f64::NEG_INFINITY];
        for (i, input) in inputs.into_iter().enumerate() {
            let y = 50.0 + 70.0 * i as f64;
            draw(&mut surface, Point::new(10.0, y), &[Point::new(20.0, y)]);
            surface.apply_popup_intent(PopupIntent::WidthChanged(input));
            surface.apply_popup_intent(PopupIntent::Close);
            let width = surface.defaults().width;
            assert!((1.0..=10.0).contains(&width), "{input} produced {width}");
        }
    }

    #[test]
    fn test_close_when_hidden_is_noop() {
        let mut surface = ready_surface();
        surface.apply_popup_intent(PopupIntent::WidthChanged(9.0));
        surface.apply_popup_intent(PopupIntent::Close);
        assert_eq!(surface.defaults(), DrawingDefaults::default());
    }

    #[test]
    fn test_eraser_removes_clicked_line() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        let id = draw(&mut surface, Point::new(10.0, 10.0), &[Point::new(200.0, 10.0)]);
        assert!(surface.popup().is_visible());

        surface.activate_eraser();
        surface.pointer_down(Point::new(100.0, 10.0));
        assert!(surface.canvas().unwrap().line(id).is_none());
        assert!(!surface.popup().is_visible());
        // Pressing empty canvas in eraser mode draws nothing.
        surface.pointer_down(Point::new(100.0, 100.0));
        assert!(surface.canvas().unwrap().document.is_empty());
    }

    #[test]
    fn test_resize_preserves_proportions() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        let id = draw(&mut surface, Point::new(100.0, 150.0), &[Point::new(400.0, 300.0)]);

        surface.on_resize(400.0);
        let canvas = surface.canvas().unwrap();
        assert!((canvas.width() - 400.0).abs() < 1e-9);
        assert!((canvas.height() - 300.0).abs() < 1e-9);
        assert!((canvas.zoom() - 0.5).abs() < 1e-9);

        let end = canvas.camera.world_to_screen(line(&surface, id).end);
        assert!((end.x / canvas.width() - 400.0 / 800.0).abs() < 1e-9);
        assert!((end.y / canvas.height() - 300.0 / 600.0).abs() < 1e-9);

        surface.on_resize(1200.0);
        let canvas = surface.canvas().unwrap();
        assert!((canvas.zoom() - 1.5).abs() < 1e-9);
        assert!((canvas.height() - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_ignores_invalid_width() {
        let mut surface = ready_surface();
        surface.on_resize(0.0);
        surface.on_resize(-10.0);
        surface.on_resize(f64::NAN);
        let canvas = surface.canvas().unwrap();
        assert!((canvas.width() - 800.0).abs() < f64::EPSILON);
        assert!((canvas.zoom() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drawing_after_resize_uses_canvas_space() {
        let mut surface = ready_surface();
        surface.on_resize(400.0);
        surface.activate_line_tool();
        let id = draw(&mut surface, Point::new(10.0, 10.0), &[Point::new(50.0, 20.0)]);
        let l = line(&surface, id);
        assert_eq!(l.start, Point::new(20.0, 20.0));
        assert_eq!(l.end, Point::new(100.0, 40.0));
        assert_eq!(surface.popup_screen_position(), Some(Point::new(50.0, 20.0)));
    }

    #[test]
    fn test_file_selection_resets_page() {
        let mut surface = ready_surface();
        let source = FakeSource::new(3);
        let request = surface.next_page().unwrap();
        surface.fetch_page(&source, request).unwrap();
        assert_eq!(surface.file_reader().current_page(), 2);

        surface.load_file(pdf("b.pdf"), &FakeSource::new(7)).unwrap();
        let reader = surface.file_reader();
        assert_eq!(reader.current_page(), 1);
        assert_eq!(reader.total_pages(), Some(7));
        assert_eq!(reader.file().unwrap().name, "b.pdf");
    }

    #[test]
    fn test_stale_image_never_shown() {
        let mut surface = ready_surface();
        let source = FakeSource::new(3);
        let request = surface.next_page().unwrap();
        let stale = source.render_page(&pdf("a.pdf"), &request).unwrap();

        let fresh_request = surface.on_file_selected(pdf("b.pdf"));
        assert!(surface.canvas().unwrap().background().is_none());
        assert!(!surface.on_page_rendered(stale.clone()));
        assert!(!surface.on_page_image_ready(stale.image));
        assert!(surface.canvas().unwrap().background().is_none());

        surface.fetch_page(&source, fresh_request).unwrap();
        let background = surface.canvas().unwrap().background().unwrap();
        assert_eq!(background.image.generation, fresh_request.generation);
        assert_eq!(background.image.page, 1);
    }

    #[test]
    fn test_page_image_before_canvas_applied_later() {
        let mut surface = DrawingSurface::default();
        surface.load_file(pdf("a.pdf"), &FakeSource::new(2)).unwrap();
        assert!(surface.file_reader().current_image().is_some());

        surface.init_canvas(400.0);
        let background = surface.canvas().unwrap().background().unwrap();
        assert!((background.rect.height() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_background_replaced_on_navigation() {
        let mut surface = ready_surface();
        let source = FakeSource::new(3);
        let request = surface.go_to_page(3).unwrap();
        surface.fetch_page(&source, request).unwrap();
        assert_eq!(surface.canvas().unwrap().background().unwrap().image.page, 3);
        assert!(surface.next_page().is_none());
        let request = surface.previous_page().unwrap();
        assert_eq!(request.page, 2);
    }

    #[test]
    fn test_request_height_tracks_canvas() {
        let mut surface = DrawingSurface::default();
        surface.init_canvas(3200.0);
        let request = surface.on_file_selected(pdf("a.pdf"));
        assert_eq!(request.target_height, 2400);
        assert_eq!(request.page, 1);
    }

    #[test]
    fn test_three_page_scenario() {
        let source = FakeSource::new(3);
        let mut surface = DrawingSurface::default();
        surface.init_canvas(800.0);
        surface.load_file(pdf("three.pdf"), &source).unwrap();
        assert_eq!(surface.file_reader().total_pages(), Some(3));
        assert_eq!(surface.file_reader().current_page(), 1);
        assert!(surface.canvas().unwrap().background().is_some());

        assert!(surface.activate_line_tool());
        let first = draw(&mut surface, Point::new(10.0, 10.0), &[Point::new(50.0, 50.0)]);
        let l = line(&surface, first);
        assert_eq!(l.end, Point::new(50.0, 50.0));
        assert_eq!(l.style.stroke_color, SerializableColor::black());
        assert!((l.style.stroke_width - 5.0).abs() < f64::EPSILON);

        let popup = surface.popup();
        assert!(popup.is_visible());
        assert_eq!(popup.position(), Point::new(50.0, 50.0));
        assert_eq!(popup.color(), SerializableColor::black());
        assert!((popup.width() - 5.0).abs() < f64::EPSILON);

        surface.apply_popup_intent(PopupIntent::WidthChanged(8.0));
        surface.apply_popup_intent(PopupIntent::Close);

        let second = draw(&mut surface, Point::new(300.0, 300.0), &[Point::new(400.0, 350.0)]);
        assert!((line(&surface, second).style.stroke_width - 8.0).abs() < f64::EPSILON);
        assert!((line(&surface, first).style.stroke_width - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fetch_rejects_mismatched_page() {
        struct WrongPage;
        impl PageSource for WrongPage {
            fn render_page(&self, _: &PdfFile, request: &PageRequest) -> PageResult<RenderedPage> {
                let other = PageRequest {
                    page: request.page + 1,
                    ..*request
                };
                Ok(RenderedPage {
                    total_pages: 5,
                    image: PageImage::new(&other, 1, 1, vec![0; 4])?,
                })
            }
        }
        let mut surface = DrawingSurface::default();
        let err = surface.load_file(pdf("a.pdf"), &WrongPage).unwrap_err();
        assert!(matches!(err, PageError::Render { page: 1, .. }));
        assert!(surface.file_reader().current_image().is_none());
    }

    #[test]
    fn test_failed_fetch_keeps_shown_page() {
        let mut surface = ready_surface();
        let request = surface.next_page().unwrap();
        assert!(surface.fetch_page(&FakeSource::new(1), request).is_err());

        let shown = surface.canvas().unwrap().background().unwrap().image.page;
        assert_eq!(surface.file_reader().current_page(), shown);
        assert_eq!(shown, 1);

        let request = surface.next_page().unwrap();
        assert_eq!(request.page, 2);
        surface.fetch_page(&FakeSource::new(3), request).unwrap();
        assert_eq!(surface.canvas().unwrap().background().unwrap().image.page, 2);
    }

    #[test]
    fn test_failed_load_keeps_tools_disabled() {
        struct Broken;
        impl PageSource for Broken {
            fn render_page(&self, _: &PdfFile, _: &PageRequest) -> PageResult<RenderedPage> {
                Err(PageError::Load("not a pdf".to_string()))
            }
        }
        let mut surface = DrawingSurface::default();
        surface.init_canvas(800.0);
        assert!(surface.load_file(pdf("broken.pdf"), &Broken).is_err());
        assert!(!surface.can_activate_tools());
        assert!(!surface.activate_line_tool());
        assert_eq!(surface.mode(), None);
    }

    #[test]
    fn test_added_line_gets_default_color() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        let mut stray = Line::at(Point::new(5.0, 5.0), DrawingDefaults::default().style());
        stray.style.stroke_color = SerializableColor::new(200, 0, 0, 255);
        let id = stray.id;
        surface.pending_color.insert(id);
        surface.canvas.as_mut().unwrap().add(Shape::Line(stray));

        surface.process_canvas_events();
        assert!(surface.pending_color.is_empty());
        assert_eq!(line(&surface, id).style.stroke_color, surface.defaults().color);
    }

    #[test]
    fn test_gesture_drains_color_reassertion() {
        let mut surface = ready_surface();
        surface.activate_line_tool();
        surface.pointer_down(Point::new(10.0, 10.0));
        assert!(surface.pending_color.is_empty());
        surface.pointer_up();
    }

    #[test]
    fn test_source_error_propagates() {
        let mut surface = ready_surface();
        let source = FakeSource::new(1);
        let request = surface.next_page().unwrap();
        assert!(matches!(
            surface.fetch_page(&source, request),
            Err(PageError::PageOutOfRange { page: 2, total: 1 })
        ));
    }
}
