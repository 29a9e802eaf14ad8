//! Fixed worksheet layout for one invoice.

use serde::Serialize;

use crate::models::{Invoice, LineItem, LineItemField};

/// Number of columns in the layout (sequence number plus the eight item fields).
pub const COLUMN_COUNT: usize = 9;

/// Column widths in character units, A through I.
pub const COLUMN_WIDTHS: [f64; COLUMN_COUNT] = [5.0, 25.0, 30.0, 10.0, 10.0, 10.0, 5.0, 10.0, 15.0];

/// Item table header, A through I.
pub const HEADERS: [&str; COLUMN_COUNT] = [
    "SI No.",
    "Part No",
    "Description of Goods",
    "HSN/SAC",
    "Quantity",
    "Rate",
    "per",
    "Disc. %",
    "Amount",
];

/// Rows before the first item: state/terms, a blank separator, and the header.
pub const PREAMBLE_ROWS: usize = 3;

pub const DEFAULT_SHEET_NAME: &str = "Manufacturing Invoice";

/// Value of one worksheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(u64),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Display form, as written to text formats.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: CellValue,
    pub bold: bool,
}

impl Cell {
    pub fn empty() -> Self {
        Self {
            value: CellValue::Empty,
            bold: false,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(value.into()),
            bold: false,
        }
    }

    pub fn number(value: u64) -> Self {
        Self {
            value: CellValue::Number(value),
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// One worksheet row of exactly [`COLUMN_COUNT`] cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutRow {
    pub cells: Vec<Cell>,
}

impl LayoutRow {
    fn blank() -> Self {
        Self {
            cells: vec![Cell::empty(); COLUMN_COUNT],
        }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.value.is_empty())
    }

    /// Cell values as display strings, A through I.
    pub fn texts(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.value.as_text()).collect()
    }
}

/// A deterministic, serialization-ready projection of an invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorksheetLayout {
    pub sheet_name: String,
    pub column_widths: Vec<f64>,
    pub rows: Vec<LayoutRow>,
}

impl WorksheetLayout {
    /// Lay out an invoice on a sheet named [`DEFAULT_SHEET_NAME`].
    pub fn build(invoice: &Invoice) -> Self {
        let mut rows = Vec::with_capacity(PREAMBLE_ROWS + invoice.items.len());
        rows.push(state_row(invoice));
        rows.push(LayoutRow::blank());
        rows.push(LayoutRow {
            cells: HEADERS.iter().map(|h| Cell::text(*h).bold()).collect(),
        });
        rows.extend(
            invoice
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| item_row(i as u64 + 1, item)),
        );

        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            column_widths: COLUMN_WIDTHS.to_vec(),
            rows,
        }
    }

    /// Override the sheet name.
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// The item rows, after the preamble.
    pub fn data_rows(&self) -> &[LayoutRow] {
        self.rows.get(PREAMBLE_ROWS..).unwrap_or_default()
    }
}

fn state_row(invoice: &Invoice) -> LayoutRow {
    let mut row = LayoutRow::blank();
    row.cells[0] = Cell::text("State Name");
    row.cells[1] = Cell::text(":");
    row.cells[2] = Cell::text(invoice.state_name.as_str());
    row.cells[6] = Cell::text("Terms of Delivery");
    row.cells[7] = Cell::text(invoice.terms_of_delivery.as_str());
    row
}

fn item_row(sequence: u64, item: &LineItem) -> LayoutRow {
    let mut cells = Vec::with_capacity(COLUMN_COUNT);
    cells.push(Cell::number(sequence));
    cells.extend(LineItemField::ALL.iter().map(|f| Cell::text(item.get(*f))));
    LayoutRow { cells }
}

/// Spreadsheet column letter for a zero-based column index.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_invoice;
    use pretty_assertions::assert_eq;

    fn two_item_invoice() -> Invoice {
        let mut invoice = sample_invoice();
        invoice.items.truncate(2);
        invoice
    }

    #[test]
    fn test_preamble_and_data_rows() {
        let layout = WorksheetLayout::build(&two_item_invoice());

        assert_eq!(layout.rows.len(), 5);
        assert_eq!(layout.data_rows().len(), 2);
        assert_eq!(layout.data_rows()[0].cells[0].value, CellValue::Number(1));
        assert_eq!(layout.data_rows()[1].cells[0].value, CellValue::Number(2));
        assert!(layout.rows[1].is_blank());
    }

    #[test]
    fn test_state_row() {
        let layout = WorksheetLayout::build(&two_item_invoice());
        assert_eq!(
            layout.rows[0].texts(),
            vec![
                "State Name",
                ":",
                "Karnataka, Code : 29",
                "",
                "",
                "",
                "Terms of Delivery",
                "As per terms",
                ""
            ]
        );
    }

    #[test]
    fn test_header_row_bold() {
        let layout = WorksheetLayout::build(&Invoice::default());
        let header = &layout.rows[2];
        assert_eq!(header.texts(), HEADERS.to_vec());
        assert!(header.cells.iter().all(|c| c.bold));
        assert!(layout.data_rows().is_empty());
    }

    #[test]
    fn test_item_row_field_order() {
        let invoice = two_item_invoice();
        let layout = WorksheetLayout::build(&invoice);
        let row = layout.data_rows()[0].texts();
        let item = &invoice.items[0];

        assert_eq!(
            row,
            vec![
                "1".to_string(),
                item.part_no.clone(),
                item.description.clone(),
                item.hsn.clone(),
                item.quantity.clone(),
                item.rate.clone(),
                item.per.clone(),
                item.discount_percentage.clone(),
                item.amount.clone(),
            ]
        );
    }

    #[test]
    fn test_widths_and_sheet_name() {
        let layout = WorksheetLayout::build(&Invoice::default()).with_sheet_name("Invoices");
        assert_eq!(layout.column_widths, vec![5.0, 25.0, 30.0, 10.0, 10.0, 10.0, 5.0, 10.0, 15.0]);
        assert_eq!(layout.sheet_name, "Invoices");
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(8), "I");
        assert_eq!(column_letter(26), "AA");
    }
}
