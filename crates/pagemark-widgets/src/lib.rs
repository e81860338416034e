//! egui widgets shared by the pagemark toolbar and line options popup.
//!
//! - **Buttons**: toggle buttons for tool modes, plain text buttons
//! - **Swatch**: quick color swatches
//! - **Layout**: section labels, separators, panel frames

pub mod buttons;
pub mod layout;
pub mod swatch;

pub use buttons::{TextButton, ToggleButton};
pub use layout::{panel_frame, section_label, separator, toolbar_frame, vertical_separator};
pub use swatch::{ColorSwatch, QUICK_COLORS, colors_match};

/// Standard sizing constants used across widgets.
pub mod sizing {
    /// Swatch diameter
    pub const SMALL: f32 = 20.0;
    /// Toolbar button height
    pub const MEDIUM: f32 = 28.0;
    /// Standard corner radius
    pub const CORNER_RADIUS: u8 = 4;
    /// Panel corner radius
    pub const PANEL_RADIUS: u8 = 8;
    /// Height of the toolbar strip above the canvas, in logical pixels
    pub const TOOLBAR_HEIGHT: f32 = 48.0;
}

/// Standard colors used across widgets.
pub mod theme {
    use egui::Color32;

    /// Text color (dark gray)
    pub const TEXT: Color32 = Color32::from_rgb(60, 60, 60);
    /// Muted text color
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(120, 120, 120);
    /// Disabled text color
    pub const TEXT_DISABLED: Color32 = Color32::from_rgb(180, 180, 180);
    /// Border color
    pub const BORDER: Color32 = Color32::from_rgb(220, 220, 220);
    /// Active tool color (blue)
    pub const ACCENT: Color32 = Color32::from_rgb(59, 130, 246);
    /// Hover background
    pub const HOVER_BG: Color32 = Color32::from_rgb(235, 235, 235);
    /// Idle button background
    pub const BUTTON_BG: Color32 = Color32::from_rgb(245, 245, 245);
    /// Panel background
    pub const PANEL_BG: Color32 = Color32::from_rgba_premultiplied(250, 250, 252, 250);
}
