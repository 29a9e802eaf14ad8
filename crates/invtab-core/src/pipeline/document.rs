//! Per-document processing: images, PDFs, and structured JSON.

use std::path::Path;

use image::DynamicImage;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{DocumentError, InvtabError, OcrError, Result};
use crate::models::{Invoice, InvtabConfig, LineItem, SourceDocument};
use crate::ocr::{crop_region, normalize_cell_text, RegionDetector, RuledLineDetector, TextRecognizer};
use crate::pdf::{PdfExtractor, PdfProcessor};
use crate::table::{FieldMapper, RowClusterer};

use super::cascade::{Extraction, ExtractionCascade, PageEvidence, StageKind, StageOutcome};

/// Image file extensions handled by the image path.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "tiff", "tif", "bmp", "webp"];

/// How a source file is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
    Json,
}

impl DocumentKind {
    /// Classify a path by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "json" => Some(DocumentKind::Json),
            ext if IMAGE_EXTENSIONS.contains(&ext) => Some(DocumentKind::Image),
            _ => None,
        }
    }
}

/// Invoice number assigned to an extracted document: `INV-` plus the file name up to its first dot.
pub fn invoice_number_for(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    format!("INV-{}", stem)
}

/// Today's date as stamped on extracted documents.
pub fn extraction_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Turns one source file into a [`SourceDocument`].
///
/// Holds no mutable state, so one processor can serve many documents in parallel.
pub struct DocumentProcessor {
    config: InvtabConfig,
    clusterer: RowClusterer,
    cascade: ExtractionCascade,
    detector: Box<dyn RegionDetector>,
    recognizer: Option<Box<dyn TextRecognizer>>,
}

impl DocumentProcessor {
    /// Create a processor with the ruled-line detector and no text recognizer.
    pub fn new(config: InvtabConfig) -> Self {
        Self {
            clusterer: RowClusterer::new(config.clustering.clone()),
            cascade: ExtractionCascade::default(),
            detector: Box::new(RuledLineDetector::new(config.detection.clone())),
            recognizer: None,
            config,
        }
    }

    /// Replace the region detector.
    pub fn with_detector(mut self, detector: impl RegionDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    /// Set the text recognizer used for images and image-only PDF pages.
    pub fn with_recognizer(mut self, recognizer: impl TextRecognizer + 'static) -> Self {
        self.recognizer = Some(Box::new(recognizer));
        self
    }

    /// Replace the column table.
    pub fn with_mapper(mut self, mapper: FieldMapper) -> Self {
        self.cascade = ExtractionCascade::new(mapper);
        self
    }

    pub fn config(&self) -> &InvtabConfig {
        &self.config
    }

    /// Whether image input can be processed.
    pub fn has_recognizer(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Process one file according to its extension.
    pub fn process_path(&self, path: &Path) -> Result<SourceDocument> {
        let kind = DocumentKind::from_path(path).ok_or_else(|| {
            DocumentError::UnsupportedFileType(path.display().to_string())
        })?;
        debug!("Processing {} as {:?}", path.display(), kind);

        match kind {
            DocumentKind::Image => self.process_image_file(path),
            DocumentKind::Pdf => self.process_pdf_file(path),
            DocumentKind::Json => self.process_json_file(path),
        }
    }

    /// Decode an image file and extract its line items.
    pub fn process_image_file(&self, path: &Path) -> Result<SourceDocument> {
        let image = image::open(path).map_err(|e| DocumentError::UnreadableImage {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let extraction = self
            .extract_image(&image)?
            .ok_or_else(|| DocumentError::NoData(path.display().to_string()))?;

        Ok(self.extracted_document(path, extraction.items))
    }

    /// Extract line items from every page of a PDF file.
    ///
    /// Evidence is gathered page by page and the cascade runs once over the
    /// whole document, so all items come from the same stage.
    pub fn process_pdf_file(&self, path: &Path) -> Result<SourceDocument> {
        let data = std::fs::read(path)?;
        let mut extractor = PdfExtractor::new();
        extractor.load(&data)?;

        let pdf_config = &self.config.pdf;
        let mut pages = Vec::new();

        for page in extractor.pages(pdf_config.max_pages)? {
            let text_len = page.text.trim().chars().count();
            let use_text = pdf_config.prefer_embedded_text && text_len >= pdf_config.min_text_length;

            if use_text {
                debug!("Page {}: using {} chars of embedded text", page.number, text_len);
                pages.push(PageEvidence::text_only(page.text));
            } else {
                pages.extend(self.read_page_images(&extractor, page.number, page.text)?);
            }
        }

        let extraction = self
            .cascade
            .extract_document(&pages)
            .ok_or_else(|| DocumentError::NoData(path.display().to_string()))?;

        info!(
            "Extracted {} items from {} with the {} stage",
            extraction.items.len(),
            path.display(),
            extraction.stage
        );
        Ok(self.extracted_document(path, extraction.items))
    }

    fn read_page_images(
        &self,
        extractor: &PdfExtractor,
        page: u32,
        page_text: String,
    ) -> Result<Vec<PageEvidence>> {
        let images = extractor.extract_images(page)?;
        if images.is_empty() {
            debug!("Page {}: no images, falling back to embedded text", page);
            return Ok(vec![PageEvidence::text_only(page_text)]);
        }

        images.iter().map(|image| self.read_image(image)).collect()
    }

    /// Parse a JSON invoice document; it bypasses the extraction engine.
    pub fn process_json_file(&self, path: &Path) -> Result<SourceDocument> {
        let content = std::fs::read_to_string(path)?;
        let malformed = |reason: String| DocumentError::MalformedStructuredInput {
            path: path.display().to_string(),
            reason,
        };

        let value: Value = serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?;
        let document = SourceDocument::from_value(&value)
            .ok_or_else(|| malformed("expected a JSON object".to_string()))?;

        Ok(document)
    }

    /// Run the full cascade over a page image.
    ///
    /// Returns `Ok(None)` when every stage came back empty.
    pub fn extract_image(&self, image: &DynamicImage) -> Result<Option<Extraction>> {
        let evidence = self.read_image(image)?;
        Ok(self.cascade.extract(&evidence))
    }

    /// Cluster and recognize a page image.
    ///
    /// The full page is only recognized when the table grid maps to no items.
    fn read_image(&self, image: &DynamicImage) -> Result<PageEvidence> {
        let recognizer = self.recognizer.as_ref().ok_or(OcrError::NoRecognizer)?;

        let gray = image.to_luma8();
        let regions = self.detector.detect(&gray)?;
        let rows = self.clusterer.cluster(regions, gray.dimensions());
        debug!("Image {}x{}: {} rows", gray.width(), gray.height(), rows.len());

        let mut table = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut cells = Vec::with_capacity(row.len());
            for region in &row.regions {
                let text = if region.text.is_empty() {
                    recognizer.recognize(&crop_region(image, region))?
                } else {
                    region.text.clone()
                };
                cells.push(normalize_cell_text(&text));
            }
            table.push(cells);
        }

        let mut evidence = PageEvidence::new(table, String::new());
        if let StageOutcome::Found(_) = self.cascade.run_stage(StageKind::Geometric, &evidence) {
            debug!("Table grid holds line items; skipping full-page recognition");
            return Ok(evidence);
        }

        evidence.full_text = recognizer.recognize(image)?;
        if evidence.full_text.trim().is_empty() {
            warn!("No text recognized on page");
        }
        Ok(evidence)
    }

    fn extracted_document(&self, path: &Path, items: Vec<LineItem>) -> SourceDocument {
        SourceDocument::from_invoice(Invoice::extracted(
            invoice_number_for(path),
            extraction_date(),
            items,
        ))
    }
}

impl std::fmt::Debug for DocumentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentProcessor")
            .field("config", &self.config)
            .field("has_recognizer", &self.has_recognizer())
            .finish()
    }
}

/// Whether an error means "skip this file" rather than "this file failed".
pub fn is_skippable(error: &InvtabError) -> bool {
    matches!(error, InvtabError::Document(e) if e.is_skip())
}
