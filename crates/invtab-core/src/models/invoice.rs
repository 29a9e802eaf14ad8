//! Canonical invoice and line-item models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Unit used when a source does not state one.
pub const DEFAULT_UNIT: &str = "Nos.";

/// One field of the canonical eight-field line-item schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineItemField {
    PartNo,
    Description,
    Hsn,
    Quantity,
    Rate,
    Per,
    DiscountPercentage,
    Amount,
}

impl LineItemField {
    /// All canonical fields in worksheet column order.
    pub const ALL: [LineItemField; 8] = [
        LineItemField::PartNo,
        LineItemField::Description,
        LineItemField::Hsn,
        LineItemField::Quantity,
        LineItemField::Rate,
        LineItemField::Per,
        LineItemField::DiscountPercentage,
        LineItemField::Amount,
    ];

    /// JSON key of the field.
    pub fn key(&self) -> &'static str {
        match self {
            LineItemField::PartNo => "partNo",
            LineItemField::Description => "description",
            LineItemField::Hsn => "hsn",
            LineItemField::Quantity => "quantity",
            LineItemField::Rate => "rate",
            LineItemField::Per => "per",
            LineItemField::DiscountPercentage => "discountPercentage",
            LineItemField::Amount => "amount",
        }
    }
}

/// A single invoice line in the canonical schema.
///
/// Every field is a string exactly as recognized; absent fields are empty.
/// Columns beyond the eighth are kept in `extra` under `field_<index>` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    pub part_no: String,
    pub description: String,
    pub hsn: String,
    pub quantity: String,
    pub rate: String,
    pub per: String,
    pub discount_percentage: String,
    pub amount: String,

    /// Overflow columns, keyed `field_<index>`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl LineItem {
    /// Get a canonical field value.
    pub fn get(&self, field: LineItemField) -> &str {
        match field {
            LineItemField::PartNo => &self.part_no,
            LineItemField::Description => &self.description,
            LineItemField::Hsn => &self.hsn,
            LineItemField::Quantity => &self.quantity,
            LineItemField::Rate => &self.rate,
            LineItemField::Per => &self.per,
            LineItemField::DiscountPercentage => &self.discount_percentage,
            LineItemField::Amount => &self.amount,
        }
    }

    /// Set a canonical field value.
    pub fn set(&mut self, field: LineItemField, value: impl Into<String>) {
        let value = value.into();
        match field {
            LineItemField::PartNo => self.part_no = value,
            LineItemField::Description => self.description = value,
            LineItemField::Hsn => self.hsn = value,
            LineItemField::Quantity => self.quantity = value,
            LineItemField::Rate => self.rate = value,
            LineItemField::Per => self.per = value,
            LineItemField::DiscountPercentage => self.discount_percentage = value,
            LineItemField::Amount => self.amount = value,
        }
    }

    /// True when every value, including overflow columns, is blank after trimming.
    pub fn is_blank(&self) -> bool {
        LineItemField::ALL
            .iter()
            .all(|f| self.get(*f).trim().is_empty())
            && self.extra.values().all(|v| v.trim().is_empty())
    }
}

/// One source document's header metadata plus its ordered line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Invoice {
    pub invoice_number: String,
    pub date: String,
    pub state_name: String,
    pub terms_of_delivery: String,
    pub items: Vec<LineItem>,
}

impl Invoice {
    /// Create an invoice with only a number and date, as produced by the extraction engine.
    pub fn extracted(invoice_number: impl Into<String>, date: impl Into<String>, items: Vec<LineItem>) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            date: date.into(),
            state_name: String::new(),
            terms_of_delivery: String::new(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_item_serializes_camel_case_with_extras() {
        let mut item = LineItem {
            part_no: "P1".to_string(),
            discount_percentage: "5".to_string(),
            ..Default::default()
        };
        item.extra.insert("field_8".to_string(), "x".to_string());

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["partNo"], "P1");
        assert_eq!(json["discountPercentage"], "5");
        assert_eq!(json["field_8"], "x");
    }

    #[test]
    fn test_line_item_missing_fields_default_empty() {
        let item: LineItem = serde_json::from_str(r#"{"partNo":"P1","amount":"10.00"}"#).unwrap();
        assert_eq!(item.part_no, "P1");
        assert_eq!(item.amount, "10.00");
        assert_eq!(item.hsn, "");
        assert!(item.extra.is_empty());
    }

    #[test]
    fn test_is_blank() {
        let mut item = LineItem {
            rate: "   ".to_string(),
            ..Default::default()
        };
        assert!(item.is_blank());

        item.extra.insert("field_9".to_string(), "7".to_string());
        assert!(!item.is_blank());
    }

    #[test]
    fn test_field_accessors() {
        let mut item = LineItem::default();
        for field in LineItemField::ALL {
            item.set(field, field.key());
        }
        assert_eq!(item.get(LineItemField::Hsn), "hsn");
        assert_eq!(item.per, "per");
    }
}
