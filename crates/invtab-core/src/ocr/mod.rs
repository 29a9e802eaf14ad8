//! Region and text collaborators.
//!
//! The engine only talks to [`RegionDetector`] and [`TextRecognizer`]. The
//! default detector finds ruled table cells with plain morphology; the native
//! recognizer wraps `pure-onnx-ocr` and is compiled with the `native` feature.

mod detector;
mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;

pub use detector::RuledLineDetector;
pub use preprocessing::{adaptive_threshold_inv, crop_region, normalize_cell_text, open_lines, LineAxis};
#[cfg(feature = "native")]
pub use pure_engine::PureOcrRecognizer;

use image::{DynamicImage, GrayImage};

use crate::error::OcrError;
use crate::table::Region;

/// Result type for collaborator calls.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Finds text-bearing rectangles in a grayscale page.
pub trait RegionDetector: Send + Sync {
    /// Detect regions. Returned regions may carry empty text.
    fn detect(&self, image: &GrayImage) -> Result<Vec<Region>>;
}

/// Turns an image into text.
///
/// Implementations return lines in reading order separated by `\n`, with the
/// fragments of one line separated by single spaces.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}

impl<T: RegionDetector + ?Sized> RegionDetector for Box<T> {
    fn detect(&self, image: &GrayImage) -> Result<Vec<Region>> {
        (**self).detect(image)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        (**self).recognize(image)
    }
}
