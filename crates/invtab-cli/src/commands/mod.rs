//! Subcommands and the helpers they share.

pub mod config;
pub mod export;
pub mod process;

use std::path::{Path, PathBuf};

use console::style;
use tracing::{debug, warn};

use invtab_core::models::config::InvtabConfig;
use invtab_core::pipeline::{DocumentKind, DocumentProcessor};
use invtab_core::PureOcrRecognizer;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invtab")
        .join("config.json")
}

/// Load the configuration named on the command line, else the default file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvtabConfig> {
    let config = match config_path {
        Some(path) => {
            let path = Path::new(path);
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            InvtabConfig::from_file(path)?
        }
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Using config file {}", path.display());
                InvtabConfig::from_file(&path)?
            } else {
                InvtabConfig::default()
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Model directory: explicit argument, then the configured directory, then the user data directory.
fn resolve_model_dir(config: &InvtabConfig, model_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = model_dir {
        return dir.to_path_buf();
    }
    if config.ocr.model_dir.exists() {
        return config.ocr.model_dir.clone();
    }
    dirs::data_dir()
        .map(|d| d.join("invtab").join("models"))
        .unwrap_or_else(|| config.ocr.model_dir.clone())
}

/// Whether any input needs text recognition (images, or PDFs that may be scans).
pub fn needs_recognizer(files: &[PathBuf]) -> bool {
    files.iter().any(|f| {
        matches!(
            DocumentKind::from_path(f),
            Some(DocumentKind::Image | DocumentKind::Pdf)
        )
    })
}

/// Build a document processor, attaching the native recognizer when models load.
///
/// Without models, structured and text PDFs still work; image inputs fail individually.
pub fn build_processor(
    config: &InvtabConfig,
    model_dir: Option<&Path>,
    with_recognizer: bool,
) -> DocumentProcessor {
    let processor = DocumentProcessor::new(config.clone());
    if !with_recognizer {
        return processor;
    }

    let dir = resolve_model_dir(config, model_dir);
    match PureOcrRecognizer::from_dir(&dir, &config.ocr) {
        Ok(recognizer) => processor.with_recognizer(recognizer),
        Err(e) => {
            warn!("Text recognizer unavailable: {}", e);
            eprintln!(
                "{} OCR models not loaded from {}; images cannot be processed",
                style("!").yellow(),
                dir.display()
            );
            processor
        }
    }
}
