//! Page rasterization through Pdfium.

use pagemark_core::document::{PageImage, PageRequest, PageSource, PdfFile, RenderedPage};
use pagemark_core::error::{PageError, PageResult};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Environment variable pointing at a Pdfium shared library.
pub const PDFIUM_LIB_ENV: &str = "PAGEMARK_PDFIUM_LIB";

/// Platform file name of the Pdfium shared library.
pub fn library_file_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "pdfium.dll"
    } else if cfg!(target_os = "macos") {
        "libpdfium.dylib"
    } else {
        "libpdfium.so"
    }
}

/// Pick a local Pdfium library: the explicit override first, then a copy
/// sitting in `exe_dir`.
pub fn local_library_path(explicit: Option<PathBuf>, exe_dir: Option<&Path>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let candidate = exe_dir?.join(library_file_name());
        candidate.exists().then_some(candidate)
    })
}

/// [`PageSource`] backed by a dynamically bound Pdfium.
pub struct PdfiumPageSource {
    pdfium: Pdfium,
}

impl PdfiumPageSource {
    /// Bind to a local Pdfium if one is found, else the system library.
    pub fn new() -> PageResult<Self> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let explicit = std::env::var_os(PDFIUM_LIB_ENV).map(PathBuf::from);

        let bindings = match local_library_path(explicit, exe_dir.as_deref()) {
            Some(path) => {
                log::info!("Binding Pdfium from {}", path.display());
                Pdfium::bind_to_library(&path)
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| PageError::LibraryUnavailable(e.to_string()))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageSource for PdfiumPageSource {
    fn render_page(&self, file: &PdfFile, request: &PageRequest) -> PageResult<RenderedPage> {
        let document = self
            .pdfium
            .load_pdf_from_byte_vec(file.bytes.as_ref().clone(), None)
            .map_err(|e| PageError::Load(e.to_string()))?;
        let pages = document.pages();
        let total_pages = u32::try_from(pages.len()).unwrap_or(0);
        if request.page == 0 || request.page > total_pages {
            return Err(PageError::PageOutOfRange {
                page: request.page,
                total: total_pages,
            });
        }

        let render_error = |reason: String| PageError::Render {
            page: request.page,
            reason,
        };
        let index = PdfPageIndex::try_from(request.page - 1).map_err(|e| render_error(e.to_string()))?;
        let page = pages.get(index).map_err(|e| render_error(e.to_string()))?;
        let target_height = i32::try_from(request.target_height).unwrap_or(i32::MAX);
        let bitmap = page
            .render_with_config(&PdfRenderConfig::new().set_target_height(target_height))
            .map_err(|e| render_error(e.to_string()))?;

        let rgba = bitmap.as_image().to_rgba8();
        let (width, height) = (rgba.width(), rgba.height());
        log::debug!(
            "Rendered page {}/{} of {} at {}x{}",
            request.page,
            total_pages,
            file.name,
            width,
            height
        );
        let image = PageImage::new(request, width, height, rgba.into_raw())?;
        Ok(RenderedPage { total_pages, image })
    }
}
