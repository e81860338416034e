//! Error types for page rendering and configuration.

use thiserror::Error;

/// Errors raised while turning a PDF page into an image.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("PDF library unavailable: {0}")]
    LibraryUnavailable(String),
    #[error("Failed to load PDF: {0}")]
    Load(String),
    #[error("Page {page} out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },
    #[error("Failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },
    #[error("Page image is {len} bytes, expected {expected}")]
    InvalidImage { len: usize, expected: usize },
}

/// Result type for page operations.
pub type PageResult<T> = Result<T, PageError>;

/// Errors raised while loading the surface configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Could not determine config directory")]
    NoConfigDir,
}
