//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::InvtabError;
use crate::export::ExportFormat;

/// Main configuration for the invtab pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvtabConfig {
    /// Row clustering thresholds.
    pub clustering: ClusterConfig,

    /// Ruled-line region detection.
    pub detection: DetectionConfig,

    /// Text recognizer configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Spreadsheet export configuration.
    pub export: ExportConfig,
}

/// Row clustering configuration.
///
/// Thresholds are expressed as divisors of the image dimensions so that
/// detection scales with resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Regions with area `<= image_area / min_area_divisor` are noise.
    pub min_area_divisor: u32,

    /// Regions with width `<= image_width / min_width_divisor` are noise.
    pub min_width_divisor: u32,

    /// Regions with height `<= image_height / min_height_divisor` are noise.
    pub min_height_divisor: u32,

    /// Vertical tolerance for row grouping is `image_height / row_tolerance_divisor`.
    pub row_tolerance_divisor: u32,

    /// Pixels added on every side of a surviving region, clipped to the image.
    pub padding: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_area_divisor: 5000,
            min_width_divisor: 50,
            min_height_divisor: 140,
            row_tolerance_divisor: 250,
            padding: 2,
        }
    }
}

/// Ruled-line cell detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Block size of the adaptive mean threshold (odd).
    pub block_size: u32,

    /// Constant subtracted from the local mean.
    pub threshold_offset: i32,

    /// Line kernels are `image_dimension / line_scale` long.
    pub line_scale: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            block_size: 15,
            threshold_offset: -2,
            line_scale: 20,
        }
    }
}

/// Text recognizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens in recognized text instead of replacing them with spaces.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,

    /// Use embedded page text before falling back to page images.
    pub prefer_embedded_text: bool,

    /// Minimum page text length to treat a page as text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            prefer_embedded_text: true,
            min_text_length: 50,
        }
    }
}

/// Spreadsheet export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name prefix; a timestamp and extension are appended.
    pub export_name: String,

    /// Worksheet name.
    pub sheet_name: String,

    /// Default output format.
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_name: "Invoice_Export".to_string(),
            sheet_name: "Manufacturing Invoice".to_string(),
            format: ExportFormat::Xlsx,
        }
    }
}

impl InvtabConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<(), InvtabError> {
        let c = &self.clustering;
        let divisors = [
            ("clustering.min_area_divisor", c.min_area_divisor),
            ("clustering.min_width_divisor", c.min_width_divisor),
            ("clustering.min_height_divisor", c.min_height_divisor),
            ("clustering.row_tolerance_divisor", c.row_tolerance_divisor),
            ("detection.line_scale", self.detection.line_scale),
        ];
        for (key, value) in divisors {
            if value == 0 {
                return Err(InvtabError::Config(format!("{} must be greater than zero", key)));
            }
        }

        if self.detection.block_size % 2 == 0 {
            return Err(InvtabError::Config(
                "detection.block_size must be odd".to_string(),
            ));
        }

        if self.export.export_name.trim().is_empty() {
            return Err(InvtabError::Config("export.export_name is empty".to_string()));
        }

        Ok(())
    }

    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.ocr.model_dir.join(model_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(InvtabConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_divisor_rejected() {
        let mut config = InvtabConfig::default();
        config.clustering.row_tolerance_divisor = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("row_tolerance_divisor"));
    }

    #[test]
    fn test_even_block_size_rejected() {
        let mut config = InvtabConfig::default();
        config.detection.block_size = 14;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: InvtabConfig =
            serde_json::from_str(r#"{"clustering": {"padding": 5}}"#).unwrap();
        assert_eq!(config.clustering.padding, 5);
        assert_eq!(config.clustering.min_width_divisor, 50);
        assert_eq!(config.export.sheet_name, "Manufacturing Invoice");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = InvtabConfig::default();
        config.export.export_name = "Laser_Cutting_Invoice".to_string();
        config.save(&path).unwrap();

        let loaded = InvtabConfig::from_file(&path).unwrap();
        assert_eq!(loaded.export.export_name, "Laser_Cutting_Invoice");
    }
}
