//! Pagemark Core Library
//!
//! Platform-agnostic state and interaction logic for drawing line
//! annotations over a rendered PDF page.

pub mod camera;
pub mod canvas;
pub mod config;
pub mod document;
pub mod error;
pub mod input;
pub mod popup;
pub mod shapes;
pub mod surface;
pub mod tools;
pub mod widget;

pub use camera::Camera;
pub use canvas::{Canvas, CanvasDocument, CanvasEvent, PageBackground};
pub use config::{PopupReveal, SurfaceConfig};
pub use document::{FileReaderInfo, PageImage, PageRequest, PageSource, PdfFile, RenderedPage};
pub use error::{ConfigError, PageError, PageResult};
pub use input::{InputState, MouseButton, PointerEvent};
pub use popup::{LineOptionsPopup, PopupIntent};
pub use surface::DrawingSurface;
pub use tools::{DrawingDefaults, PointerBindings, ToolManager, ToolMode};
pub use widget::{Handle, HandleKind, HandleShape, SelectionStyle};
