//! Extraction pipeline: the stage cascade and per-document processing.

mod cascade;
mod document;

pub use cascade::{Extraction, ExtractionCascade, PageEvidence, StageKind, StageOutcome};
pub use document::{
    extraction_date, invoice_number_for, is_skippable, DocumentKind, DocumentProcessor,
    IMAGE_EXTENSIONS,
};
