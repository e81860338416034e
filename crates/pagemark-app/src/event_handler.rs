//! Translates window pointer events into surface-local pointer events.

use kurbo::{Point, Rect, Size};
use pagemark_core::input::{InputState, MouseButton, PointerEvent};

/// Where the canvas sits inside the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    /// Top-left of the canvas in logical window pixels.
    pub origin: Point,
    /// Canvas size in logical pixels.
    pub size: Size,
    /// Physical pixels per logical pixel.
    pub scale_factor: f64,
}

impl Default for CanvasLayout {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            size: Size::ZERO,
            scale_factor: 1.0,
        }
    }
}

impl CanvasLayout {
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.origin, self.size)
    }

    /// Physical window position to surface-local logical pixels.
    pub fn to_local(&self, physical: Point) -> Point {
        let scale = if self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        };
        Point::new(
            physical.x / scale - self.origin.x,
            physical.y / scale - self.origin.y,
        )
    }

    /// Surface-local point to logical window pixels.
    pub fn to_window(&self, local: Point) -> Point {
        local + self.origin.to_vec2()
    }

    fn contains_local(&self, local: Point) -> bool {
        local.x >= 0.0 && local.y >= 0.0 && local.x < self.size.width && local.y < self.size.height
    }
}

/// Turns raw cursor and button events into [`PointerEvent`]s for the surface.
///
/// Presses only count inside the canvas. Once a press has started on the
/// canvas, moves and the release are delivered wherever the pointer goes.
#[derive(Debug, Default)]
pub struct EventHandler {
    layout: CanvasLayout,
    input: InputState,
    /// Whether the primary button went down on the canvas.
    captured: bool,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(&self) -> CanvasLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: CanvasLayout) {
        self.layout = layout;
    }

    /// Last pointer position in surface-local pixels.
    pub fn pointer_position(&self) -> Point {
        self.input.pointer_position
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Cursor moved to `physical` window pixels.
    pub fn cursor_moved(&mut self, physical: Point) -> Option<PointerEvent> {
        let position = self.layout.to_local(physical);
        let event = PointerEvent::Move { position };
        self.input.handle_pointer_event(event);
        (self.captured || self.layout.contains_local(position)).then_some(event)
    }

    /// Button pressed or released at the last cursor position.
    pub fn mouse_input(&mut self, button: MouseButton, pressed: bool) -> Option<PointerEvent> {
        let position = self.input.pointer_position;
        if pressed {
            let event = PointerEvent::Down { position, button };
            self.input.handle_pointer_event(event);
            if button != MouseButton::Left || !self.layout.contains_local(position) {
                return None;
            }
            self.captured = true;
            Some(event)
        } else {
            let event = PointerEvent::Up { position, button };
            self.input.handle_pointer_event(event);
            if button != MouseButton::Left || !self.captured {
                return None;
            }
            self.captured = false;
            Some(event)
        }
    }

    /// The pointer left the window. Ends any press in progress.
    pub fn cursor_left(&mut self) -> Option<PointerEvent> {
        let was_pressed = self.input.is_button_pressed(MouseButton::Left) && self.captured;
        self.input.release_all();
        self.captured = false;
        was_pressed.then_some(PointerEvent::Up {
            position: self.input.pointer_position,
            button: MouseButton::Left,
        })
    }
}

/// Map a winit mouse button to ours.
pub fn map_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}
