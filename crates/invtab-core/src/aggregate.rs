//! Merging of several source documents into one invoice.

use tracing::debug;

use crate::models::{Invoice, SourceDocument};

/// State name stamped on every merged invoice.
pub const AGGREGATED_STATE_NAME: &str = "Aggregated Invoices";

/// Concatenate the line items of all documents in source order, then document order.
///
/// Generic and total-only documents are normalized on the way; canonical items
/// pass through unchanged.
pub fn aggregate<I>(documents: I) -> Invoice
where
    I: IntoIterator<Item = SourceDocument>,
{
    let mut sources = 0usize;
    let items: Vec<_> = documents
        .into_iter()
        .inspect(|_| sources += 1)
        .flat_map(SourceDocument::line_items)
        .collect();

    debug!("Aggregated {} items from {} documents", items.len(), sources);

    Invoice {
        invoice_number: String::new(),
        date: String::new(),
        state_name: AGGREGATED_STATE_NAME.to_string(),
        terms_of_delivery: String::new(),
        items,
    }
}

/// Normalize a run's documents into the invoice to lay out.
///
/// A single document keeps its own header; several are merged with [`aggregate`].
/// Returns `None` when there is nothing to export.
pub fn combine(mut documents: Vec<SourceDocument>) -> Option<Invoice> {
    match documents.len() {
        0 => None,
        1 => documents.pop().map(SourceDocument::into_invoice),
        _ => Some(aggregate(documents)),
    }
}
