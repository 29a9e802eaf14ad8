//! Table reconstruction from detected regions.
//!
//! Regions are grouped into rows by vertical position ([`RowClusterer`]), and
//! each row's ordered cell texts are mapped onto the line-item schema by column
//! position ([`FieldMapper`]).

mod cluster;
mod mapper;

pub use cluster::{ClusterThresholds, RowClusterer};
pub use mapper::{FieldDescriptor, FieldMapper, CANONICAL_COLUMNS};

use serde::{Deserialize, Serialize};

/// A detected text-bearing rectangle in image pixel space plus its recognized text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Recognized text; empty until the recognizer has run over the region.
    #[serde(default)]
    pub text: String,
}

impl Region {
    /// Create a region with no text yet.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            text: String::new(),
        }
    }

    /// Attach recognized text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Area in pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Expand by `padding` on every side, clipped to `(0, 0)..(image_width, image_height)`.
    pub fn padded(&self, padding: u32, image_width: u32, image_height: u32) -> Self {
        let x = self.x.saturating_sub(padding);
        let y = self.y.saturating_sub(padding);
        let right = self.right().saturating_add(padding).min(image_width).max(x);
        let bottom = self.bottom().saturating_add(padding).min(image_height).max(y);

        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
            text: self.text.clone(),
        }
    }
}

/// Regions sharing an approximate vertical band, ordered left to right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Representative vertical position: the `y` of the region that opened the row.
    pub y: u32,
    /// Member regions sorted by ascending `x`.
    pub regions: Vec<Region>,
}

impl Row {
    /// Number of columns in this row.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the row has no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Cell texts in column order.
    pub fn texts(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.text.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_clips_to_image() {
        let region = Region::new(1, 3, 10, 10);
        let padded = region.padded(2, 12, 100);

        assert_eq!(padded.x, 0);
        assert_eq!(padded.y, 1);
        assert_eq!(padded.right(), 12);
        assert_eq!(padded.bottom(), 15);
    }

    #[test]
    fn test_area() {
        assert_eq!(Region::new(0, 0, 70_000, 70_000).area(), 4_900_000_000);
    }
}
