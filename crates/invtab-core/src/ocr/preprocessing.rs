//! Binarization and morphology helpers for ruled-table detection.

use image::{DynamicImage, GrayImage, Luma};

use crate::table::Region;

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// Adaptive mean threshold of the inverted image.
///
/// A pixel becomes foreground when its inverted value exceeds the inverted
/// local mean over a `block_size` window minus `offset`. Dark ink on light
/// paper therefore comes out white.
pub fn adaptive_threshold_inv(image: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return result;
    }

    let integral = integral_image(image);
    let stride = width as usize + 1;
    let half = (block_size / 2) as usize;
    let (w, h) = (width as usize, height as usize);

    for y in 0..h {
        let y0 = y.saturating_sub(half);
        let y1 = (y + half + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(half);
            let x1 = (x + half + 1).min(w);

            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((y1 - y0) * (x1 - x0)) as u64;

            let mean_inv = 255 - (sum / count) as i32;
            let pixel_inv = 255 - image.get_pixel(x as u32, y as u32)[0] as i32;

            let value = if pixel_inv > mean_inv - offset {
                FOREGROUND
            } else {
                BACKGROUND
            };
            result.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }

    result
}

fn integral_image(image: &GrayImage) -> Vec<u64> {
    let (width, height) = image.dimensions();
    let stride = width as usize + 1;
    let mut integral = vec![0u64; stride * (height as usize + 1)];

    for y in 0..height as usize {
        let mut row_sum = 0u64;
        for x in 0..width as usize {
            row_sum += image.get_pixel(x as u32, y as u32)[0] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    integral
}

/// Direction of a straight line kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAxis {
    Horizontal,
    Vertical,
}

/// Morphological opening (erode then dilate) with a straight line kernel of `length` pixels.
///
/// Keeps only foreground runs at least `length` long along `axis`.
pub fn open_lines(mask: &GrayImage, axis: LineAxis, length: u32) -> GrayImage {
    let length = length.max(1);
    let eroded = morph_line(mask, axis, length, true);
    morph_line(&eroded, axis, length, false)
}

/// One pass of erosion (`erode = true`) or dilation along `axis`.
fn morph_line(mask: &GrayImage, axis: LineAxis, length: u32, erode: bool) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut out = GrayImage::new(width, height);
    // Anchor at the kernel centre; dilation uses the reflected kernel so that
    // erode + dilate restores surviving runs exactly.
    let mut before = (length / 2) as i64;
    let mut after = length as i64 - before - 1;
    if !erode {
        std::mem::swap(&mut before, &mut after);
    }

    for y in 0..height {
        for x in 0..width {
            let (pos, limit) = match axis {
                LineAxis::Horizontal => (x as i64, width as i64),
                LineAxis::Vertical => (y as i64, height as i64),
            };

            let mut hit = erode;
            for p in (pos - before)..=(pos + after) {
                let set = if p < 0 || p >= limit {
                    // Border pixels neither erode nor dilate.
                    erode
                } else {
                    let (px, py) = match axis {
                        LineAxis::Horizontal => (p as u32, y),
                        LineAxis::Vertical => (x, p as u32),
                    };
                    mask.get_pixel(px, py)[0] == FOREGROUND
                };
                if erode && !set {
                    hit = false;
                    break;
                }
                if !erode && set {
                    hit = true;
                    break;
                }
            }

            if hit {
                out.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
    }

    out
}

/// Crop a region out of the page image, clamped to the image bounds.
pub fn crop_region(image: &DynamicImage, region: &Region) -> DynamicImage {
    let x = region.x.min(image.width().saturating_sub(1));
    let y = region.y.min(image.height().saturating_sub(1));
    let width = region.width.min(image.width() - x).max(1);
    let height = region.height.min(image.height() - y).max(1);
    image.crop_imm(x, y, width, height)
}

/// Collapse recognized cell text to one trimmed line.
pub fn normalize_cell_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }

    #[test]
    fn test_threshold_marks_dark_ink() {
        let mut image = white(20, 20);
        for x in 0..20 {
            image.put_pixel(x, 10, Luma([0]));
        }
        let mask = adaptive_threshold_inv(&image, 15, -2);

        assert_eq!(mask.get_pixel(5, 10)[0], 255);
        assert_eq!(mask.get_pixel(5, 3)[0], 0);
    }

    #[test]
    fn test_uniform_page_has_no_foreground() {
        let mask = adaptive_threshold_inv(&white(16, 16), 15, -2);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_open_lines_keeps_long_runs_only() {
        let mut mask = GrayImage::new(30, 10);
        for x in 0..30 {
            mask.put_pixel(x, 2, Luma([255]));
        }
        for x in 5..9 {
            mask.put_pixel(x, 6, Luma([255]));
        }

        let lines = open_lines(&mask, LineAxis::Horizontal, 10);
        assert_eq!(lines.get_pixel(15, 2)[0], 255);
        assert_eq!(lines.get_pixel(0, 2)[0], 255);
        assert_eq!(lines.get_pixel(6, 6)[0], 0);

        let vertical = open_lines(&mask, LineAxis::Vertical, 5);
        assert!(vertical.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_crop_region_clamped() {
        let image = DynamicImage::ImageLuma8(white(50, 40));
        let crop = crop_region(&image, &Region::new(40, 30, 20, 20));
        assert_eq!((crop.width(), crop.height()), (10, 10));
    }

    #[test]
    fn test_normalize_cell_text() {
        assert_eq!(normalize_cell_text("  Laser\nCutting \t 6MM "), "Laser Cutting 6MM");
        assert_eq!(normalize_cell_text("\n"), "");
    }
}
