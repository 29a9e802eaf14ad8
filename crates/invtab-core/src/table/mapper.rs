//! Column-position mapping of table rows onto the line-item schema.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{InvtabError, Result};
use crate::models::{LineItem, LineItemField};

/// Binds a zero-based column index to a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub index: usize,
    pub field: LineItemField,
}

impl FieldDescriptor {
    pub const fn new(index: usize, field: LineItemField) -> Self {
        Self { index, field }
    }
}

/// The invoice column layout: S.No. is not captured, so column 0 is the part number.
pub const CANONICAL_COLUMNS: [FieldDescriptor; 8] = [
    FieldDescriptor::new(0, LineItemField::PartNo),
    FieldDescriptor::new(1, LineItemField::Description),
    FieldDescriptor::new(2, LineItemField::Hsn),
    FieldDescriptor::new(3, LineItemField::Quantity),
    FieldDescriptor::new(4, LineItemField::Rate),
    FieldDescriptor::new(5, LineItemField::Per),
    FieldDescriptor::new(6, LineItemField::DiscountPercentage),
    FieldDescriptor::new(7, LineItemField::Amount),
];

/// Maps rows of cell texts to line items by column position.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    /// Descriptors sorted by index; position equals column index.
    columns: Vec<FieldDescriptor>,
}

impl FieldMapper {
    /// Build a mapper from a column table.
    ///
    /// Indices must be exactly `0..n` with no gaps, and each field may be bound once.
    pub fn new(mut columns: Vec<FieldDescriptor>) -> Result<Self> {
        columns.sort_by_key(|c| c.index);

        let mut seen = HashSet::new();
        for (position, column) in columns.iter().enumerate() {
            if column.index != position {
                return Err(InvtabError::Config(format!(
                    "column table must cover indices 0..{} without gaps, found index {} at position {}",
                    columns.len(),
                    column.index,
                    position
                )));
            }
            if !seen.insert(column.field) {
                return Err(InvtabError::Config(format!(
                    "field '{}' is bound to more than one column",
                    column.field.key()
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Mapper for the standard invoice layout.
    pub fn canonical() -> Self {
        Self {
            columns: CANONICAL_COLUMNS.to_vec(),
        }
    }

    /// Map one row. Missing columns stay empty; extra columns become `field_<index>`.
    pub fn map_row<S: AsRef<str>>(&self, cells: &[S]) -> LineItem {
        let mut item = LineItem::default();
        for (index, cell) in cells.iter().enumerate() {
            let value = cell.as_ref();
            match self.columns.get(index) {
                Some(column) => item.set(column.field, value),
                None => {
                    item.extra.insert(format!("field_{}", index), value.to_string());
                }
            }
        }
        item
    }

    /// Map a table whose first row is the header.
    ///
    /// The header row is discarded, and rows whose mapped values are all blank are dropped.
    pub fn map_table<S: AsRef<str>>(&self, rows: &[Vec<S>]) -> Vec<LineItem> {
        let Some((_, body)) = rows.split_first() else {
            return Vec::new();
        };

        let items: Vec<LineItem> = body
            .iter()
            .map(|row| self.map_row(row))
            .filter(|item| !item.is_blank())
            .collect();

        debug!("Mapped {} of {} body rows to line items", items.len(), body.len());
        items
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_header_discarded() {
        let rows = vec![
            row(&["Part No", "Description", "HSN", "Qty", "Rate", "Per", "Disc", "Amount"]),
            row(&["P1", "Bolt", "7318", "10", "2.50", "Nos.", "", "25.00"]),
        ];
        let items = FieldMapper::canonical().map_table(&rows);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].part_no, "P1");
        assert_eq!(items[0].amount, "25.00");
        assert_eq!(items[0].discount_percentage, "");
    }

    #[test]
    fn test_single_row_table_is_header_only() {
        let rows = vec![row(&["P1", "Bolt"])];
        assert!(FieldMapper::canonical().map_table(&rows).is_empty());
    }

    #[test]
    fn test_short_row_leaves_fields_empty() {
        let item = FieldMapper::canonical().map_row(&["P1", "Bolt", "7318"]);
        assert_eq!(item.hsn, "7318");
        assert_eq!(item.quantity, "");
        assert_eq!(item.amount, "");
    }

    #[test]
    fn test_overflow_columns() {
        let cells: Vec<String> = (0..10).map(|i| format!("c{}", i)).collect();
        let item = FieldMapper::canonical().map_row(&cells);

        assert_eq!(item.amount, "c7");
        assert_eq!(item.extra.get("field_8").map(String::as_str), Some("c8"));
        assert_eq!(item.extra.get("field_9").map(String::as_str), Some("c9"));
    }

    #[test]
    fn test_blank_rows_dropped() {
        let rows = vec![
            row(&["header"]),
            row(&["  ", "", "\t"]),
            row(&["", "", "", "", "", "", "", "", "note"]),
        ];
        let items = FieldMapper::canonical().map_table(&rows);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].extra["field_8"], "note");
    }

    #[test]
    fn test_rejects_gapped_table() {
        let columns = vec![
            FieldDescriptor::new(0, LineItemField::PartNo),
            FieldDescriptor::new(2, LineItemField::Amount),
        ];
        assert!(FieldMapper::new(columns).is_err());
    }

    #[test]
    fn test_rejects_duplicate_field() {
        let columns = vec![
            FieldDescriptor::new(0, LineItemField::PartNo),
            FieldDescriptor::new(1, LineItemField::PartNo),
        ];
        assert!(FieldMapper::new(columns).is_err());
    }

    #[test]
    fn test_custom_table_order() {
        let columns = vec![
            FieldDescriptor::new(1, LineItemField::Amount),
            FieldDescriptor::new(0, LineItemField::Description),
        ];
        let mapper = FieldMapper::new(columns).unwrap();
        let item = mapper.map_row(&["Bolt", "25.00", "extra"]);

        assert_eq!(item.description, "Bolt");
        assert_eq!(item.amount, "25.00");
        assert_eq!(item.extra["field_2"], "extra");
    }
}
