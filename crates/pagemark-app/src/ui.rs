//! Toolbar and line options popup, drawn with egui.

use egui::{Align2, Color32, Context, Pos2, Vec2};
use pagemark_core::popup::PopupIntent;
use pagemark_core::shapes::SerializableColor;
use pagemark_core::surface::DrawingSurface;
use pagemark_core::tools::{MAX_STROKE_WIDTH, MIN_STROKE_WIDTH, ToolMode};
use pagemark_widgets::{
    ColorSwatch, QUICK_COLORS, TextButton, ToggleButton, colors_match, panel_frame, section_label,
    separator, sizing, theme, toolbar_frame, vertical_separator,
};

use crate::event_handler::CanvasLayout;

/// Actions the UI asks the app to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Show the file dialog and open a PDF.
    OpenFile,
    /// Switch tool mode.
    SetMode(ToolMode),
    PreviousPage,
    NextPage,
    /// Forward to the line options popup.
    Popup(PopupIntent),
}

/// What the popup shows this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupView {
    /// Top-left of the popup in logical window pixels.
    pub anchor: Pos2,
    pub color: SerializableColor,
    pub width: f64,
}

/// Snapshot of the surface state the UI reads each frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiView {
    pub file_name: Option<String>,
    pub can_activate: bool,
    pub mode: Option<ToolMode>,
    pub page: u32,
    pub total_pages: Option<u32>,
    pub popup: Option<PopupView>,
    /// Last error worth showing to the user.
    pub status: Option<String>,
}

impl UiView {
    pub fn from_surface(surface: &DrawingSurface, layout: &CanvasLayout, status: Option<&str>) -> Self {
        let reader = surface.file_reader();
        let popup = surface.popup_screen_position().map(|local| {
            let window = layout.to_window(local);
            PopupView {
                anchor: Pos2::new(window.x as f32, window.y as f32),
                color: surface.popup().color(),
                width: surface.popup().width(),
            }
        });
        Self {
            file_name: reader.file().map(|f| f.name.clone()),
            can_activate: surface.can_activate_tools(),
            mode: surface.mode(),
            page: reader.current_page(),
            total_pages: reader.total_pages(),
            popup,
            status: status.map(str::to_owned),
        }
    }

    /// Toolbar page indicator, e.g. "2 / 7".
    pub fn page_label(&self) -> String {
        match self.total_pages {
            Some(total) => format!("{} / {}", self.page, total),
            None => format!("{} / -", self.page),
        }
    }
}

fn to_color32(color: SerializableColor) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn from_color32(color: Color32) -> SerializableColor {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    SerializableColor::new(r, g, b, a)
}

/// Render the whole UI. Returns at most one action per frame.
pub fn render_ui(ctx: &Context, view: &UiView) -> Option<UiAction> {
    let toolbar_action = render_toolbar(ctx, view);
    let popup_action = view
        .popup
        .as_ref()
        .and_then(|popup| render_line_options(ctx, popup.anchor, popup.color, popup.width))
        .map(UiAction::Popup);
    toolbar_action.or(popup_action)
}

fn render_toolbar(ctx: &Context, view: &UiView) -> Option<UiAction> {
    let mut action = None;

    egui::TopBottomPanel::top("toolbar")
        .exact_height(sizing::TOOLBAR_HEIGHT)
        .frame(toolbar_frame())
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.spacing_mut().item_spacing = Vec2::new(4.0, 0.0);

                if TextButton::new("Upload PDF").show(ui) {
                    action = Some(UiAction::OpenFile);
                }
                if let Some(name) = &view.file_name {
                    ui.label(egui::RichText::new(name).size(12.0).color(theme::TEXT_MUTED));
                }

                vertical_separator(ui);

                for mode in [ToolMode::Line, ToolMode::Eraser] {
                    if ToggleButton::new(mode.label(), view.mode == Some(mode))
                        .enabled(view.can_activate)
                        .min_width(56.0)
                        .show(ui)
                    {
                        action = Some(UiAction::SetMode(mode));
                    }
                }

                vertical_separator(ui);

                let has_file = view.file_name.is_some();
                let at_first = view.page <= 1;
                let at_last = view.total_pages.is_none_or(|total| view.page >= total);
                if TextButton::new("Prev").enabled(has_file && !at_first).show(ui) {
                    action = Some(UiAction::PreviousPage);
                }
                ui.label(egui::RichText::new(view.page_label()).size(12.0).color(theme::TEXT));
                if TextButton::new("Next").enabled(has_file && !at_last).show(ui) {
                    action = Some(UiAction::NextPage);
                }

                if let Some(status) = &view.status {
                    vertical_separator(ui);
                    ui.label(
                        egui::RichText::new(status)
                            .size(12.0)
                            .color(Color32::from_rgb(185, 28, 28)),
                    );
                }
            });
        });

    action
}

/// The line options popup at `anchor`.
///
/// Pure in its inputs: it only reports what the user touched.
pub fn render_line_options(
    ctx: &Context,
    anchor: Pos2,
    color: SerializableColor,
    width: f64,
) -> Option<PopupIntent> {
    let mut intent = None;

    egui::Area::new(egui::Id::new("line_options"))
        .fixed_pos(anchor)
        .pivot(Align2::LEFT_TOP)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            panel_frame().show(ui, |ui| {
                ui.set_width(180.0);
                section_label(ui, "Color");
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing = Vec2::new(4.0, 0.0);
                    let mut picked = to_color32(color);
                    if egui::color_picker::color_edit_button_srgba(
                        ui,
                        &mut picked,
                        egui::color_picker::Alpha::Opaque,
                    )
                    .changed()
                    {
                        intent = Some(PopupIntent::ColorChanged(from_color32(picked)));
                    }
                    for (name, swatch) in QUICK_COLORS {
                        let selected = colors_match(*swatch, to_color32(color));
                        let (clicked, _) = ColorSwatch::new(*swatch, name).selected(selected).show(ui);
                        if clicked {
                            intent = Some(PopupIntent::ColorChanged(from_color32(*swatch)));
                        }
                    }
                });

                separator(ui);

                section_label(ui, "Width");
                let mut staged = width;
                let slider = egui::Slider::new(&mut staged, MIN_STROKE_WIDTH..=MAX_STROKE_WIDTH)
                    .step_by(1.0)
                    .integer();
                if ui.add(slider).changed() {
                    intent = Some(PopupIntent::WidthChanged(staged));
                }

                separator(ui);

                if TextButton::new("Close").show(ui) {
                    intent = Some(PopupIntent::Close);
                }
            });
        });

    intent
}
