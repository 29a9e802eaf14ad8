//! PDF page access: embedded text and embedded page images.

mod extractor;

pub use extractor::{PdfExtractor, PdfPage};

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the text of each page, in page order.
    fn extract_page_texts(&self) -> Result<Vec<String>>;

    /// Extract embedded images from a page (1-indexed).
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;
}
