//! PDF file and page state shared with the page renderer.

use crate::error::{PageError, PageResult};
use std::fmt;
use std::sync::Arc;

/// A user-selected PDF file held in memory.
#[derive(Clone)]
pub struct PdfFile {
    /// Display name (file name without directories).
    pub name: String,
    /// Raw file contents.
    pub bytes: Arc<Vec<u8>>,
}

impl PdfFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Read a PDF from disk.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> PageResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| PageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }
}

impl fmt::Debug for PdfFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A request for one rendered page.
///
/// `generation` identifies the file selection that issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    /// 1-based page number.
    pub page: u32,
    /// Desired image height in pixels.
    pub target_height: u32,
}

/// A rendered page, as straight (unpremultiplied) RGBA8.
#[derive(Clone, PartialEq)]
pub struct PageImage {
    pub generation: u64,
    pub page: u32,
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<Vec<u8>>,
}

impl PageImage {
    /// Wrap raw pixels for `request`, checking the buffer size.
    pub fn new(request: &PageRequest, width: u32, height: u32, rgba: Vec<u8>) -> PageResult<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(PageError::InvalidImage {
                len: rgba.len(),
                expected,
            });
        }
        Ok(Self {
            generation: request.generation,
            page: request.page,
            width,
            height,
            rgba: Arc::new(rgba),
        })
    }

    /// Whether this image answers `request`.
    pub fn answers(&self, request: &PageRequest) -> bool {
        self.generation == request.generation && self.page == request.page
    }
}

impl fmt::Debug for PageImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageImage")
            .field("generation", &self.generation)
            .field("page", &self.page)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// What the page renderer hands back for a request.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Number of pages in the document.
    pub total_pages: u32,
    pub image: PageImage,
}

/// Turns `{file, page}` into a page image and the document's page count.
pub trait PageSource {
    fn render_page(&self, file: &PdfFile, request: &PageRequest) -> PageResult<RenderedPage>;
}

/// Page height requested before the canvas exists.
pub const DEFAULT_TARGET_HEIGHT: u32 = 1200;

/// Which file is open, which page is shown, and its latest image.
#[derive(Debug, Clone)]
pub struct FileReaderInfo {
    file: Option<PdfFile>,
    total_pages: Option<u32>,
    current_page: u32,
    current_image: Option<PageImage>,
    generation: u64,
}

impl Default for FileReaderInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl FileReaderInfo {
    /// Nothing loaded yet.
    pub fn new() -> Self {
        Self {
            file: None,
            total_pages: None,
            current_page: 1,
            current_image: None,
            generation: 0,
        }
    }

    pub fn file(&self) -> Option<&PdfFile> {
        self.file.as_ref()
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// Whether the renderer has answered for the open file.
    pub fn is_loaded(&self) -> bool {
        self.has_file() && self.total_pages.is_some()
    }

    /// Page count, once the renderer has reported it.
    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    /// 1-based current page.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn current_image(&self) -> Option<&PageImage> {
        self.current_image.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the open file. Resets to page 1 and drops the old image.
    pub fn select_file(&mut self, file: PdfFile) {
        self.generation += 1;
        self.file = Some(file);
        self.total_pages = None;
        self.current_page = 1;
        self.current_image = None;
    }

    /// Request for the current page.
    pub fn request(&self, target_height: u32) -> PageRequest {
        PageRequest {
            generation: self.generation,
            page: self.current_page,
            target_height: target_height.max(1),
        }
    }

    /// Record the page count and pull the current page into range.
    pub fn set_total_pages(&mut self, total: u32) {
        let total = total.max(1);
        self.total_pages = Some(total);
        self.current_page = self.current_page.clamp(1, total);
    }

    /// Store `image` if it answers the current request.
    ///
    /// Returns `false` for images from an earlier file or page.
    pub fn accept_image(&mut self, image: PageImage) -> bool {
        if !self.has_file()
            || image.generation != self.generation
            || image.page != self.current_page
        {
            return false;
        }
        self.current_image = Some(image);
        true
    }

    /// Move to `page`, clamped to the known page range.
    ///
    /// Returns `true` if the page changed.
    pub fn go_to(&mut self, page: u32) -> bool {
        if !self.has_file() {
            return false;
        }
        let upper = self.total_pages.unwrap_or(1);
        let page = page.clamp(1, upper);
        if page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    /// Step back to the page whose image is on screen.
    ///
    /// Returns `true` if the current page changed.
    pub fn revert_to_shown_page(&mut self) -> bool {
        match &self.current_image {
            Some(image) if image.page != self.current_page => {
                self.current_page = image.page;
                true
            }
            _ => false,
        }
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current_page.saturating_add(1))
    }

    pub fn previous(&mut self) -> bool {
        self.go_to(self.current_page.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> PdfFile {
        PdfFile::new("doc.pdf", b"%PDF-1.7".to_vec())
    }

    fn image_for(request: &PageRequest) -> PageImage {
        PageImage::new(request, 2, 1, vec![0; 8]).unwrap()
    }

    #[test]
    fn test_nothing_loaded() {
        let info = FileReaderInfo::new();
        assert!(!info.has_file());
        assert_eq!(info.current_page(), 1);
        assert_eq!(info.total_pages(), None);
    }

    #[test]
    fn test_select_file_resets_state() {
        let mut info = FileReaderInfo::new();
        info.select_file(file());
        info.set_total_pages(3);
        info.next();
        let req = info.request(100);
        assert!(info.accept_image(image_for(&req)));

        info.select_file(file());
        assert_eq!(info.current_page(), 1);
        assert_eq!(info.total_pages(), None);
        assert!(info.current_image().is_none());
        assert_eq!(info.generation(), 2);
    }

    #[test]
    fn test_navigation_clamps() {
        let mut info = FileReaderInfo::new();
        info.select_file(file());
        // Unknown total allows only page 1.
        assert!(!info.next());
        info.set_total_pages(3);
        assert!(info.next());
        assert!(info.next());
        assert!(!info.next());
        assert_eq!(info.current_page(), 3);
        assert!(info.go_to(1));
        assert!(!info.previous());
        assert!(info.go_to(99));
        assert_eq!(info.current_page(), 3);
    }

    #[test]
    fn test_total_pages_pulls_page_into_range() {
        let mut info = FileReaderInfo::new();
        info.select_file(file());
        info.set_total_pages(5);
        info.go_to(5);
        info.set_total_pages(2);
        assert_eq!(info.current_page(), 2);
    }

    #[test]
    fn test_stale_image_rejected() {
        let mut info = FileReaderInfo::new();
        info.select_file(file());
        let old = info.request(100);
        info.select_file(file());
        assert!(!info.accept_image(image_for(&old)));
        assert!(info.current_image().is_none());

        let current = info.request(100);
        assert!(info.accept_image(image_for(&current)));
    }

    #[test]
    fn test_image_for_other_page_rejected() {
        let mut info = FileReaderInfo::new();
        info.select_file(file());
        info.set_total_pages(2);
        let first = info.request(100);
        info.next();
        assert!(!info.accept_image(image_for(&first)));
    }

    #[test]
    fn test_revert_to_shown_page() {
        let mut info = FileReaderInfo::new();
        info.select_file(file());
        assert!(!info.revert_to_shown_page());
        info.set_total_pages(3);
        let first = info.request(100);
        assert!(info.accept_image(image_for(&first)));

        info.go_to(3);
        assert!(info.revert_to_shown_page());
        assert_eq!(info.current_page(), 1);
        assert!(!info.revert_to_shown_page());
    }

    #[test]
    fn test_loaded_once_page_count_known() {
        let mut info = FileReaderInfo::new();
        assert!(!info.is_loaded());
        info.select_file(file());
        assert!(!info.is_loaded());
        info.set_total_pages(2);
        assert!(info.is_loaded());
    }

    #[test]
    fn test_page_image_size_checked() {
        let req = PageRequest {
            generation: 1,
            page: 1,
            target_height: 10,
        };
        let err = PageImage::new(&req, 4, 4, vec![0; 10]).unwrap_err();
        assert!(matches!(err, PageError::InvalidImage { len: 10, expected: 64 }));
    }
}
