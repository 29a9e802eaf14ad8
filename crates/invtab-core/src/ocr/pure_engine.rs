//! Text recognizer backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{Result, TextRecognizer};

/// A recognized fragment reduced to what line assembly needs.
struct Fragment {
    text: String,
    top: f64,
    bottom: f64,
    left: f64,
}

/// `TextRecognizer` running the detection and recognition models of `pure-onnx-ocr`.
pub struct PureOcrRecognizer {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
    keep_unk: bool,
}

impl PureOcrRecognizer {
    /// Load models from the directory and file names named in `config`.
    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        Self::from_dir(&config.model_dir, config)
    }

    /// Load models from `model_dir`, using the file names in `config`.
    pub fn from_dir(model_dir: &Path, config: &OcrConfig) -> Result<Self> {
        let det_path = model_dir.join(&config.detection_model);
        let rec_path = model_dir.join(&config.recognition_model);
        let dict_path = model_dir.join(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self {
            engine: Mutex::new(engine),
            keep_unk: config.keep_unk,
        })
    }

    fn run(&self, image: &DynamicImage) -> Result<Vec<Fragment>> {
        let engine = self
            .engine
            .lock()
            .map_err(|_| OcrError::Recognition("engine lock poisoned".to_string()))?;

        let results = engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        Ok(results
            .iter()
            .map(|r| {
                let (top, bottom, left) = polygon_extent(&r.bounding_box);
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                Fragment {
                    text,
                    top,
                    bottom,
                    left,
                }
            })
            .collect())
    }
}

impl TextRecognizer for PureOcrRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        let fragments = self.run(image)?;
        debug!(
            "pure-onnx-ocr returned {} fragments for {}x{} in {}ms",
            fragments.len(),
            width,
            height,
            start.elapsed().as_millis()
        );

        Ok(assemble_lines(fragments))
    }
}

/// Group fragments into lines by vertical overlap, then join them in reading order.
fn assemble_lines(mut fragments: Vec<Fragment>) -> String {
    fragments.retain(|f| !f.text.trim().is_empty());
    fragments.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.left.total_cmp(&b.left)));

    let mut lines: Vec<Vec<Fragment>> = Vec::new();
    for fragment in fragments {
        let centre = (fragment.top + fragment.bottom) / 2.0;
        match lines.last_mut() {
            Some(line)
                if line
                    .last()
                    .is_some_and(|prev| centre >= prev.top && centre <= prev.bottom) =>
            {
                line.push(fragment)
            }
            _ => lines.push(vec![fragment]),
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.left.total_cmp(&b.left));
            line.iter()
                .map(|f| f.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// (top, bottom, left) of a detection polygon.
fn polygon_extent(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f64, f64, f64) {
    let mut top = f64::INFINITY;
    let mut bottom = f64::NEG_INFINITY;
    let mut left = f64::INFINITY;
    for coord in polygon.exterior().coords() {
        top = top.min(coord.y);
        bottom = bottom.max(coord.y);
        left = left.min(coord.x);
    }
    (top, bottom, left)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str, top: f64, bottom: f64, left: f64) -> Fragment {
        Fragment {
            text: text.to_string(),
            top,
            bottom,
            left,
        }
    }

    #[test]
    fn test_assemble_lines_reading_order() {
        let fragments = vec![
            fragment("25.00", 52.0, 70.0, 300.0),
            fragment("Bolt", 50.0, 68.0, 80.0),
            fragment("Invoice", 10.0, 30.0, 10.0),
            fragment("P1", 51.0, 69.0, 10.0),
        ];
        assert_eq!(assemble_lines(fragments), "Invoice\nP1 Bolt 25.00");
    }

    #[test]
    fn test_assemble_lines_drops_blank_fragments() {
        let fragments = vec![fragment(" ", 0.0, 10.0, 0.0), fragment("x", 0.0, 10.0, 5.0)];
        assert_eq!(assemble_lines(fragments), "x");
    }

    #[test]
    fn test_missing_models_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = PureOcrRecognizer::from_dir(dir.path(), &OcrConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, OcrError::ModelLoad(_)));
    }
}
