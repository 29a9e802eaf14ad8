//! Error types for the invtab-core library.

use thiserror::Error;

/// Main error type for the invtab library.
#[derive(Error, Debug)]
pub enum InvtabError {
    /// Per-document processing error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR collaborator error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Spreadsheet export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors that make one source document unusable.
///
/// These never abort a batch; the batch boundary logs them and moves on.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The source image could not be decoded.
    #[error("could not read image file {path}: {reason}")]
    UnreadableImage { path: String, reason: String },

    /// The file extension is not one the pipeline handles.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// A JSON document did not parse into an invoice shape.
    #[error("malformed structured input in {path}: {reason}")]
    MalformedStructuredInput { path: String, reason: String },

    /// Every extraction stage came back empty.
    #[error("no data extracted from {0}")]
    NoData(String),
}

impl DocumentError {
    /// Whether the document should be skipped silently rather than reported as a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, DocumentError::UnsupportedFileType(_))
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised by the region/text collaborators.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Region detection failed.
    #[error("region detection failed: {0}")]
    Detection(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// No recognizer is available for image input.
    #[error("no text recognizer configured")]
    NoRecognizer,
}

/// Errors raised while serializing a worksheet layout.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Writing the zip container failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// Writing an XML part failed.
    #[error("XML error: {0}")]
    Xml(String),

    /// Writing CSV failed.
    #[error("CSV error: {0}")]
    Csv(String),

    /// I/O error while writing the output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the invtab library.
pub type Result<T> = std::result::Result<T, InvtabError>;
