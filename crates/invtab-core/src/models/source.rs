//! Source documents in their heterogeneous ingestion shapes.
//!
//! Structured JSON inputs come in three shapes: items already in the canonical
//! schema, items in a generic `{description, quantity, unitPrice, total}` shape,
//! and documents that only carry a total. The shape is resolved once, when the
//! document is ingested, and each variant has its own conversion into
//! [`LineItem`].

use serde_json::{Map, Value};
use tracing::warn;

use super::invoice::{Invoice, LineItem, LineItemField, DEFAULT_UNIT};

/// Description used for the synthetic item of a total-only document.
pub const INVOICE_TOTAL_DESCRIPTION: &str = "Invoice Total";

/// An item in the generic shape used by simple extractors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericItem {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
}

/// One item of a source document, tagged by its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    /// Already in the canonical schema (the item carried a `partNo` key).
    Canonical(LineItem),
    /// Generic shape; needs the owning invoice number to become canonical.
    Generic(GenericItem),
}

impl SourceItem {
    /// Classify a raw JSON item.
    pub fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);

        if obj.contains_key("partNo") {
            let mut item = LineItem::default();
            for field in LineItemField::ALL {
                item.set(field, string_field(obj, field.key()));
            }
            for (key, value) in obj {
                if key.starts_with("field_") {
                    item.extra.insert(key.clone(), value_to_string(value));
                }
            }
            return SourceItem::Canonical(item);
        }

        let known = ["description", "quantity", "unitPrice", "total"];
        if !known.iter().any(|k| obj.contains_key(*k)) {
            warn!("Item has neither canonical nor generic shape; mapping to empty fields");
        }

        SourceItem::Generic(GenericItem {
            description: string_field(obj, "description"),
            quantity: string_field(obj, "quantity"),
            unit_price: string_field(obj, "unitPrice"),
            total: string_field(obj, "total"),
        })
    }

    /// Convert into the canonical schema.
    pub fn into_line_item(self, invoice_number: &str) -> LineItem {
        match self {
            SourceItem::Canonical(item) => item,
            SourceItem::Generic(item) => LineItem {
                part_no: invoice_number.to_string(),
                description: item.description,
                hsn: String::new(),
                quantity: item.quantity,
                rate: item.unit_price,
                per: DEFAULT_UNIT.to_string(),
                discount_percentage: String::new(),
                amount: item.total,
                extra: Default::default(),
            },
        }
    }
}

/// Body of a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentBody {
    /// The document lists its items.
    Items(Vec<SourceItem>),
    /// The document only states a total.
    TotalOnly { total: String },
}

/// A source document as ingested, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub invoice_number: String,
    pub date: String,
    pub state_name: String,
    pub terms_of_delivery: String,
    pub body: DocumentBody,
}

impl SourceDocument {
    /// Wrap an invoice produced by the extraction engine.
    pub fn from_invoice(invoice: Invoice) -> Self {
        Self {
            invoice_number: invoice.invoice_number,
            date: invoice.date,
            state_name: invoice.state_name,
            terms_of_delivery: invoice.terms_of_delivery,
            body: DocumentBody::Items(
                invoice.items.into_iter().map(SourceItem::Canonical).collect(),
            ),
        }
    }

    /// Resolve a JSON document into its tagged shape.
    ///
    /// Returns `None` when the value is not a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let body = match obj.get("items").and_then(Value::as_array) {
            Some(items) => DocumentBody::Items(items.iter().map(SourceItem::from_value).collect()),
            None => DocumentBody::TotalOnly {
                total: string_field(obj, "total"),
            },
        };

        Some(Self {
            invoice_number: string_field(obj, "invoiceNumber"),
            date: string_field(obj, "date"),
            state_name: string_field(obj, "stateName"),
            terms_of_delivery: string_field(obj, "termsOfDelivery"),
            body,
        })
    }

    /// Canonical line items of this document, in document order.
    pub fn line_items(self) -> Vec<LineItem> {
        body_items(&self.invoice_number, self.body)
    }

    /// Normalize into a canonical invoice, keeping this document's header.
    pub fn into_invoice(self) -> Invoice {
        let items = body_items(&self.invoice_number, self.body);
        Invoice {
            invoice_number: self.invoice_number,
            date: self.date,
            state_name: self.state_name,
            terms_of_delivery: self.terms_of_delivery,
            items,
        }
    }
}

fn body_items(invoice_number: &str, body: DocumentBody) -> Vec<LineItem> {
    match body {
        DocumentBody::Items(items) => items
            .into_iter()
            .map(|item| item.into_line_item(invoice_number))
            .collect(),
        DocumentBody::TotalOnly { total } => vec![LineItem {
            part_no: invoice_number.to_string(),
            description: INVOICE_TOTAL_DESCRIPTION.to_string(),
            amount: total,
            ..Default::default()
        }],
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).map(value_to_string).unwrap_or_default()
}

/// Render a JSON scalar the way it reads in the source document.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
