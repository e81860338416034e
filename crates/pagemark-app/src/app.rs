//! Core application state and lifecycle.

use kurbo::{Point, Size};
use pagemark_core::config::SurfaceConfig;
use pagemark_core::document::{PageRequest, PdfFile};
use pagemark_core::error::{PageError, PageResult};
use pagemark_core::popup::PopupIntent;
use pagemark_core::surface::DrawingSurface;
use pagemark_core::tools::ToolMode;
use pagemark_render::{RenderContext, Renderer, VelloRenderer};
use pagemark_widgets::sizing;
use peniko::Color;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use vello::util::RenderSurface;
use vello::wgpu::PresentMode;
use vello::{AaConfig, RenderParams, RendererOptions, Scene};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::event_handler::{CanvasLayout, EventHandler, map_button};
use crate::pdf::PdfiumPageSource;
use crate::ui::{UiAction, UiView, render_ui};

/// Shell errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Event loop error: {0}")]
    EventLoop(String),
    #[error("Window error: {0}")]
    Window(String),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Renderer error: {0}")]
    Renderer(String),
}

#[cfg(feature = "native")]
mod file_ops {
    use std::path::PathBuf;

    /// Ask the user for a PDF.
    pub fn pick_pdf() -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Upload PDF")
            .add_filter("PDF", &["pdf"])
            .pick_file()
    }
}

#[cfg(not(feature = "native"))]
mod file_ops {
    use std::path::PathBuf;

    pub fn pick_pdf() -> Option<PathBuf> {
        log::warn!("File dialog unavailable without the `native` feature");
        None
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Window color around the canvas.
    pub background_color: Color,
    pub surface: SurfaceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Pagemark".to_string(),
            width: 1280,
            height: 900,
            background_color: Color::from_rgba8(229, 231, 235, 255),
            surface: SurfaceConfig::default(),
        }
    }
}

/// Runtime state for the application.
struct AppState {
    // Windowing
    window: Arc<Window>,
    surface: RenderSurface<'static>,

    // Rendering
    vello_renderer: vello::Renderer,
    scene_renderer: VelloRenderer,
    /// Vello renders to Rgba8Unorm; the surface may be Bgra8Unorm.
    texture_blitter: vello::wgpu::util::TextureBlitter,

    // egui
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    // State
    drawing: DrawingSurface,
    events: EventHandler,
    pages: Option<PdfiumPageSource>,
    /// Last user-facing error, shown in the toolbar.
    status: Option<String>,
    config: AppConfig,
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    state: Option<AppState>,
    render_cx: Option<vello::util::RenderContext>,
    /// PDF to open once the window exists.
    initial_file: Option<PathBuf>,
    /// First fatal error, reported by [`App::run`].
    error: Option<AppError>,
}

impl App {
    /// Create a new application with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a new application with custom configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            state: None,
            render_cx: None,
            initial_file: None,
            error: None,
        }
    }

    /// Open `path` as soon as the window is up.
    pub fn with_initial_file(mut self, path: Option<PathBuf>) -> Self {
        self.initial_file = path;
        self
    }

    /// Run the application until the window closes.
    pub async fn run(config: AppConfig, initial_file: Option<PathBuf>) -> Result<(), AppError> {
        let event_loop = EventLoop::new().map_err(|e| AppError::EventLoop(e.to_string()))?;
        let mut app = App::with_config(config).with_initial_file(initial_file);
        event_loop
            .run_app(&mut app)
            .map_err(|e| AppError::EventLoop(e.to_string()))?;
        match app.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| AppError::Window(e.to_string()))?,
        );

        let size = window.inner_size();
        let (width, height) = if size.width == 0 || size.height == 0 {
            (self.config.width, self.config.height)
        } else {
            (size.width, size.height)
        };

        let render_cx = self
            .render_cx
            .get_or_insert_with(vello::util::RenderContext::new);
        let surface = pollster::block_on(render_cx.create_surface(
            window.clone(),
            width,
            height,
            PresentMode::AutoVsync,
        ))
        .map_err(|e| AppError::Surface(e.to_string()))?;

        let device = &render_cx.devices[surface.dev_id].device;
        let vello_renderer = vello::Renderer::new(device, RendererOptions::default())
            .map_err(|e| AppError::Renderer(e.to_string()))?;
        let texture_blitter =
            vello::wgpu::util::TextureBlitter::new(device, surface.config.format);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface.config.format,
            egui_wgpu::RendererOptions::default(),
        );

        log::info!("Pagemark initialized - {}x{}", width, height);

        let mut state = AppState {
            window: window.clone(),
            surface,
            vello_renderer,
            scene_renderer: VelloRenderer::new(),
            texture_blitter,
            egui_ctx,
            egui_state,
            egui_renderer,
            drawing: DrawingSurface::new(self.config.surface.clone()),
            events: EventHandler::new(),
            pages: None,
            status: None,
            config: self.config.clone(),
        };
        state.sync_layout();

        if let Some(path) = self.initial_file.take() {
            state.open_file(&path);
        }

        self.state = Some(state);
        window.request_redraw();
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Bind Pdfium on first use.
fn page_source(slot: &mut Option<PdfiumPageSource>) -> PageResult<&PdfiumPageSource> {
    if slot.is_none() {
        *slot = Some(PdfiumPageSource::new()?);
    }
    slot.as_ref()
        .ok_or_else(|| PageError::LibraryUnavailable("Pdfium is not bound".to_string()))
}

impl AppState {
    /// The container is the window area below the toolbar. Keep the canvas
    /// sized to its width and the pointer mapping in step.
    fn sync_layout(&mut self) {
        let scale_factor = self.window.scale_factor();
        let physical = self.window.inner_size();
        let container_width = f64::from(physical.width) / scale_factor;

        self.drawing.init_canvas(container_width);
        self.drawing.on_resize(container_width);

        let size = self
            .drawing
            .canvas()
            .map(|canvas| canvas.size())
            .unwrap_or(Size::ZERO);
        self.events.set_layout(CanvasLayout {
            origin: Point::new(0.0, f64::from(sizing::TOOLBAR_HEIGHT)),
            size,
            scale_factor,
        });
    }

    fn report(&mut self, message: String) {
        log::error!("{message}");
        self.status = Some(message);
    }

    fn open_file(&mut self, path: &Path) {
        let file = match PdfFile::load(path) {
            Ok(file) => file,
            Err(e) => return self.report(e.to_string()),
        };
        let source = match page_source(&mut self.pages) {
            Ok(source) => source,
            Err(e) => return self.report(format!("PDF renderer unavailable: {e}")),
        };
        self.status = None;
        if let Err(e) = self.drawing.load_file(file, source) {
            self.report(e.to_string());
        }
    }

    fn fetch(&mut self, request: PageRequest) {
        let source = match page_source(&mut self.pages) {
            Ok(source) => source,
            Err(e) => return self.report(format!("PDF renderer unavailable: {e}")),
        };
        match self.drawing.fetch_page(source, request) {
            Ok(()) => self.status = None,
            Err(e) => self.report(e.to_string()),
        }
    }

    fn apply_action(&mut self, action: UiAction) {
        match action {
            UiAction::OpenFile => {
                if let Some(path) = file_ops::pick_pdf() {
                    self.open_file(&path);
                }
            }
            UiAction::SetMode(ToolMode::Line) => {
                self.drawing.activate_line_tool();
            }
            UiAction::SetMode(ToolMode::Eraser) => {
                self.drawing.activate_eraser();
            }
            UiAction::PreviousPage => {
                if let Some(request) = self.drawing.previous_page() {
                    self.fetch(request);
                }
            }
            UiAction::NextPage => {
                if let Some(request) = self.drawing.next_page() {
                    self.fetch(request);
                }
            }
            UiAction::Popup(intent) => self.drawing.apply_popup_intent(intent),
        }
    }

    fn build_scene(&mut self) -> Scene {
        let Some(canvas) = self.drawing.canvas() else {
            return Scene::new();
        };
        let scale_factor = self.window.scale_factor();
        let physical = self.window.inner_size();
        let viewport_size = Size::new(
            f64::from(physical.width) / scale_factor,
            f64::from(physical.height) / scale_factor,
        );
        let render_ctx = RenderContext::new(canvas, viewport_size)
            .with_scale_factor(scale_factor)
            .with_canvas_origin(self.events.layout().origin)
            .with_background(self.config.background_color)
            .with_selection_style(self.drawing.config().selection.clone());
        self.scene_renderer.build_scene(&render_ctx);
        self.scene_renderer.take_scene()
    }

    fn redraw(&mut self, render_cx: &vello::util::RenderContext) {
        // Run egui and apply the action it reports.
        let view = UiView::from_surface(&self.drawing, &self.events.layout(), self.status.as_deref());
        let egui_input = self.egui_state.take_egui_input(&self.window);
        let mut action = None;
        let egui_output = self.egui_ctx.run(egui_input, |ctx| {
            action = render_ui(ctx, &view);
        });
        let ui_changed = action.is_some();
        if let Some(action) = action {
            self.apply_action(action);
        }

        self.egui_state
            .handle_platform_output(&self.window, egui_output.platform_output);
        let egui_primitives = self
            .egui_ctx
            .tessellate(egui_output.shapes, egui_output.pixels_per_point);

        // This frame satisfies any pending repaint.
        self.drawing.take_render_request();
        let scene = self.build_scene();

        let device_handle = &render_cx.devices[self.surface.dev_id];
        let device = &device_handle.device;
        let queue = &device_handle.queue;

        let surface_texture = match self.surface.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Failed to get surface texture: {:?}", e);
                return;
            }
        };

        let width = self.surface.config.width;
        let height = self.surface.config.height;
        let params = RenderParams {
            base_color: self.config.background_color,
            width,
            height,
            antialiasing_method: AaConfig::Area,
        };

        // Vello's compute shaders need a StorageBinding Rgba8Unorm target.
        let render_texture = device.create_texture(&vello::wgpu::TextureDescriptor {
            label: Some("vello render texture"),
            size: vello::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: vello::wgpu::TextureDimension::D2,
            format: vello::wgpu::TextureFormat::Rgba8Unorm,
            usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                | vello::wgpu::TextureUsages::COPY_SRC
                | vello::wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let render_texture_view =
            render_texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

        if let Err(e) = self.vello_renderer.render_to_texture(
            device,
            queue,
            &scene,
            &render_texture_view,
            &params,
        ) {
            log::error!("Failed to render: {:?}", e);
            return;
        }

        let surface_view = surface_texture
            .texture
            .create_view(&vello::wgpu::TextureViewDescriptor::default());

        {
            let mut blit_encoder =
                device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                    label: Some("blit encoder"),
                });
            self.texture_blitter.copy(
                device,
                &mut blit_encoder,
                &render_texture_view,
                &surface_view,
            );
            queue.submit(std::iter::once(blit_encoder.finish()));
        }

        for (id, image_delta) in &egui_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: egui_output.pixels_per_point,
        };

        {
            let mut egui_encoder =
                device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
                    label: Some("egui encoder"),
                });
            self.egui_renderer.update_buffers(
                device,
                queue,
                &mut egui_encoder,
                &egui_primitives,
                &screen_descriptor,
            );

            let render_pass = egui_encoder.begin_render_pass(&vello::wgpu::RenderPassDescriptor {
                label: Some("egui render pass"),
                color_attachments: &[Some(vello::wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: vello::wgpu::Operations {
                        // Keep the Vello content underneath.
                        load: vello::wgpu::LoadOp::Load,
                        store: vello::wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            // egui-wgpu wants a 'static render pass.
            let mut render_pass = render_pass.forget_lifetime();
            self.egui_renderer
                .render(&mut render_pass, &egui_primitives, &screen_descriptor);
            drop(render_pass);

            queue.submit(std::iter::once(egui_encoder.finish()));
        }

        for id in &egui_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
        surface_texture.present();

        let egui_busy = egui_output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|viewport| viewport.repaint_delay.is_zero());
        if ui_changed || egui_busy {
            self.window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        log::info!("Creating window...");
        if let Err(e) = self.init(event_loop) {
            log::error!("{e}");
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        let egui_response = state.egui_state.on_window_event(&state.window, &event);
        let egui_wants_pointer = egui_response.consumed
            || state.egui_ctx.is_pointer_over_area()
            || state.egui_ctx.wants_pointer_input();
        if egui_response.repaint {
            state.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(render_cx) = self.render_cx.as_mut() {
                    render_cx.resize_surface(&mut state.surface, size.width, size.height);
                }
                state.sync_layout();
                state.window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                state.sync_layout();
                state.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let Some(render_cx) = self.render_cx.as_ref() else {
                    return;
                };
                state.redraw(render_cx);
            }

            WindowEvent::CursorMoved { position, .. } => {
                let event = state.events.cursor_moved(Point::new(position.x, position.y));
                if egui_wants_pointer && !state.events.is_captured() {
                    return;
                }
                if let Some(event) = event {
                    state.drawing.handle_pointer_event(event);
                    if state.drawing.take_render_request() {
                        state.window.request_redraw();
                    }
                }
            }

            WindowEvent::MouseInput {
                state: btn_state,
                button,
                ..
            } => {
                let Some(button) = map_button(button) else {
                    return;
                };
                let pressed = btn_state == ElementState::Pressed;
                if pressed && egui_wants_pointer {
                    return;
                }
                if let Some(event) = state.events.mouse_input(button, pressed) {
                    state.drawing.handle_pointer_event(event);
                    state.drawing.take_render_request();
                    state.window.request_redraw();
                }
            }

            WindowEvent::CursorLeft { .. } => {
                if let Some(event) = state.events.cursor_left() {
                    state.drawing.handle_pointer_event(event);
                    state.window.request_redraw();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if state.egui_ctx.wants_keyboard_input() || event.state != ElementState::Pressed {
                    return;
                }
                if event.logical_key == Key::Named(NamedKey::Escape) && state.drawing.popup().is_visible() {
                    state.drawing.apply_popup_intent(PopupIntent::Close);
                    state.window.request_redraw();
                }
            }

            _ => {}
        }
    }
}
