//! Data models: canonical invoices, ingestion shapes, and configuration.

pub mod config;
pub mod invoice;
pub mod sample;
pub mod source;

pub use config::InvtabConfig;
pub use invoice::{Invoice, LineItem, LineItemField, DEFAULT_UNIT};
pub use sample::sample_invoice;
pub use source::{DocumentBody, GenericItem, SourceDocument, SourceItem};
