//! Pagemark Application
//!
//! Desktop shell: windowing, the toolbar and popup UI, pointer routing,
//! and Pdfium page rendering around a [`pagemark_core::DrawingSurface`].

mod app;
mod event_handler;
mod pdf;
mod ui;

pub use app::{App, AppConfig, AppError};
pub use event_handler::{CanvasLayout, EventHandler};
pub use pdf::{PDFIUM_LIB_ENV, PdfiumPageSource};
pub use ui::{PopupView, UiAction, UiView, render_line_options, render_ui};
