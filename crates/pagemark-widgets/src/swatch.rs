//! Quick color swatches for the line options popup.

use egui::{Color32, CursorIcon, Rect, Sense, Stroke, Ui, vec2};

use crate::{sizing, theme};

/// Preset stroke colors offered next to the full color picker.
pub const QUICK_COLORS: &[(&str, Color32)] = &[
    ("Black", Color32::from_rgb(0, 0, 0)),
    ("Red", Color32::from_rgb(239, 68, 68)),
    ("Amber", Color32::from_rgb(245, 158, 11)),
    ("Green", Color32::from_rgb(34, 197, 94)),
    ("Blue", Color32::from_rgb(59, 130, 246)),
    ("Purple", Color32::from_rgb(168, 85, 247)),
];

/// Compare two colors ignoring alpha.
pub fn colors_match(a: Color32, b: Color32) -> bool {
    a.r() == b.r() && a.g() == b.g() && a.b() == b.b()
}

/// A circular color swatch.
pub struct ColorSwatch<'a> {
    color: Color32,
    tooltip: &'a str,
    selected: bool,
}

impl<'a> ColorSwatch<'a> {
    /// Create a new color swatch.
    pub fn new(color: Color32, tooltip: &'a str) -> Self {
        Self {
            color,
            tooltip,
            selected: false,
        }
    }

    /// Set whether this swatch is selected.
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Show the swatch and return (clicked, rect).
    pub fn show(self, ui: &mut Ui) -> (bool, Rect) {
        let size = vec2(sizing::SMALL, sizing::SMALL);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click());

        if ui.is_rect_visible(rect) {
            let center = rect.center();
            let radius = rect.width().min(rect.height()) / 2.0;
            ui.painter().circle_filled(center, radius, self.color);
            if self.selected {
                ui.painter()
                    .circle_stroke(center, radius, Stroke::new(2.0, theme::ACCENT));
            } else {
                ui.painter()
                    .circle_stroke(center, radius, Stroke::new(1.0, theme::BORDER));
            }
        }

        let clicked = response.clicked();
        response
            .on_hover_text(self.tooltip)
            .on_hover_cursor(CursorIcon::PointingHand);
        (clicked, rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_match_ignores_alpha() {
        let a = Color32::from_rgba_unmultiplied(10, 20, 30, 255);
        let b = Color32::from_rgba_unmultiplied(10, 20, 30, 255);
        assert!(colors_match(a, b));
        assert!(!colors_match(a, Color32::from_rgb(10, 20, 31)));
    }

    #[test]
    fn test_quick_colors_start_with_black() {
        assert_eq!(QUICK_COLORS[0].1, Color32::BLACK);
    }
}
