//! Core library for invoice table reconstruction.
//!
//! This crate provides:
//! - Row clustering of detected text regions and positional field mapping
//! - Text-only fallbacks (line tokens, monetary patterns) when no table is found
//! - Aggregation of heterogeneous invoice documents
//! - Fixed worksheet layout with `.xlsx` and `.csv` output
//! - Document processing for images, PDFs (text and embedded images), and JSON

pub mod aggregate;
pub mod error;
pub mod export;
pub mod fallback;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod table;

pub use aggregate::{aggregate, combine, AGGREGATED_STATE_NAME};
pub use error::{DocumentError, InvtabError, Result};
pub use export::{export_invoice, ExportFormat, WorksheetLayout};
pub use models::{sample_invoice, Invoice, InvtabConfig, LineItem, SourceDocument};
pub use ocr::{RegionDetector, RuledLineDetector, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrRecognizer;
pub use pipeline::{DocumentKind, DocumentProcessor, ExtractionCascade, PageEvidence, StageKind};
pub use table::{FieldMapper, Region, Row, RowClusterer};
