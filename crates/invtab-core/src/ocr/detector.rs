//! Ruled-table cell detection.

use image::GrayImage;
use tracing::debug;

use crate::models::config::DetectionConfig;
use crate::table::Region;

use super::preprocessing::{adaptive_threshold_inv, open_lines, LineAxis};
use super::{RegionDetector, Result};

/// Finds table cells bounded by printed horizontal and vertical rules.
///
/// Cells come back with empty text; the recognizer fills them in later.
#[derive(Debug, Clone, Default)]
pub struct RuledLineDetector {
    config: DetectionConfig,
}

impl RuledLineDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Binary mask of ruled lines (true = line pixel).
    fn line_mask(&self, image: &GrayImage) -> Vec<bool> {
        let (width, height) = image.dimensions();
        let binary = adaptive_threshold_inv(
            image,
            self.config.block_size,
            self.config.threshold_offset,
        );

        let scale = self.config.line_scale.max(1);
        let horizontal = open_lines(&binary, LineAxis::Horizontal, width / scale);
        let vertical = open_lines(&binary, LineAxis::Vertical, height / scale);

        horizontal
            .pixels()
            .zip(vertical.pixels())
            .map(|(h, v)| h[0] > 0 || v[0] > 0)
            .collect()
    }
}

impl RegionDetector for RuledLineDetector {
    fn detect(&self, image: &GrayImage) -> Result<Vec<Region>> {
        let (width, height) = image.dimensions();
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 {
            return Ok(Vec::new());
        }

        let lines = self.line_mask(image);
        let line_pixels = lines.iter().filter(|&&l| l).count();
        debug!("Ruled-line mask has {} line pixels", line_pixels);
        if line_pixels == 0 {
            return Ok(Vec::new());
        }

        let mut visited = vec![false; w * h];
        let mut cells = Vec::new();

        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                if lines[idx] || visited[idx] {
                    continue;
                }
                if let Some(cell) = enclosed_component(&lines, &mut visited, x, y, w, h) {
                    cells.push(cell);
                }
            }
        }

        debug!("Detected {} ruled cells", cells.len());
        Ok(cells)
    }
}

/// Flood-fill the 4-connected non-line component at `(start_x, start_y)`.
///
/// Returns its bounding box unless the component touches the image border.
fn enclosed_component(
    lines: &[bool],
    visited: &mut [bool],
    start_x: usize,
    start_y: usize,
    width: usize,
    height: usize,
) -> Option<Region> {
    let mut stack = vec![(start_x, start_y)];
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (start_x, start_x, start_y, start_y);
    let mut touches_border = false;

    while let Some((x, y)) = stack.pop() {
        let idx = y * width + x;
        if visited[idx] || lines[idx] {
            continue;
        }
        visited[idx] = true;

        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);

        if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
            touches_border = true;
        }

        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < width {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < height {
            stack.push((x, y + 1));
        }
    }

    if touches_border {
        return None;
    }

    Some(Region::new(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}
