//! WASM bindings for invoice table reconstruction.
//!
//! Region detection and text recognition happen on the JavaScript side; these
//! bindings take the recognized regions or text and run clustering, field
//! mapping, the text fallbacks, aggregation, and worksheet export.

use std::io::Cursor;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use invtab_core::export::{write_csv, write_xlsx, WorksheetLayout};
use invtab_core::models::config::ClusterConfig;
use invtab_core::models::{Invoice, LineItem, SourceDocument};
use invtab_core::ocr::normalize_cell_text;
use invtab_core::pipeline::{Extraction, ExtractionCascade, PageEvidence};
use invtab_core::table::{Region, RowClusterer};
use invtab_core::{combine, sample_invoice};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractResult {
    /// Stage that produced the items, `None` when nothing was found.
    stage: Option<String>,
    items: Vec<LineItem>,
}

impl From<Option<Extraction>> for ExtractResult {
    fn from(extraction: Option<Extraction>) -> Self {
        match extraction {
            Some(e) => Self {
                stage: Some(e.stage.to_string()),
                items: e.items,
            },
            None => Self {
                stage: None,
                items: Vec::new(),
            },
        }
    }
}

/// Extract line items from flat recognized text (line tokens, then monetary values).
#[wasm_bindgen]
pub fn extract_items_from_text(text: &str) -> Result<JsValue, JsValue> {
    let result = ExtractResult::from(ExtractionCascade::default().extract(&PageEvidence::text_only(text)));
    to_js(&result)
}

/// Merge structured invoice documents (an array of JSON objects) into one invoice.
///
/// A single document keeps its header; `null` is returned for an empty array.
#[wasm_bindgen]
pub fn aggregate_documents(documents: JsValue) -> Result<JsValue, JsValue> {
    let values: Vec<serde_json::Value> =
        serde_wasm_bindgen::from_value(documents).map_err(js_error)?;
    match combine_values(&values)? {
        Some(invoice) => to_js(&invoice),
        None => Ok(JsValue::NULL),
    }
}

fn combine_values(values: &[serde_json::Value]) -> Result<Option<Invoice>, JsValue> {
    let documents = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            SourceDocument::from_value(v)
                .ok_or_else(|| js_error(format!("document {} is not a JSON object", i)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(combine(documents))
}

/// Lay out an invoice as worksheet rows.
#[wasm_bindgen]
pub fn build_layout(invoice: JsValue) -> Result<JsValue, JsValue> {
    let invoice: Invoice = serde_wasm_bindgen::from_value(invoice).map_err(js_error)?;
    to_js(&WorksheetLayout::build(&invoice))
}

/// Render an invoice as an `.xlsx` workbook.
#[wasm_bindgen]
pub fn export_xlsx(invoice: JsValue, sheet_name: Option<String>) -> Result<Vec<u8>, JsValue> {
    let invoice: Invoice = serde_wasm_bindgen::from_value(invoice).map_err(js_error)?;
    xlsx_bytes(&invoice, sheet_name)
}

fn xlsx_bytes(invoice: &Invoice, sheet_name: Option<String>) -> Result<Vec<u8>, JsValue> {
    let mut layout = WorksheetLayout::build(invoice);
    if let Some(name) = sheet_name {
        layout = layout.with_sheet_name(name);
    }
    let cursor = write_xlsx(&layout, Cursor::new(Vec::new())).map_err(js_error)?;
    Ok(cursor.into_inner())
}

/// Render an invoice as CSV text.
#[wasm_bindgen]
pub fn export_csv(invoice: JsValue) -> Result<String, JsValue> {
    let invoice: Invoice = serde_wasm_bindgen::from_value(invoice).map_err(js_error)?;
    csv_text(&invoice)
}

fn csv_text(invoice: &Invoice) -> Result<String, JsValue> {
    let bytes = write_csv(&WorksheetLayout::build(invoice), Vec::new()).map_err(js_error)?;
    String::from_utf8(bytes).map_err(js_error)
}

/// The built-in sample invoice.
#[wasm_bindgen]
pub fn sample() -> Result<JsValue, JsValue> {
    to_js(&sample_invoice())
}

/// Table builder class for browser use.
///
/// Feed it the text regions found on a page image and it rebuilds the rows.
#[wasm_bindgen]
pub struct TableExtractor {
    clusterer: RowClusterer,
    cascade: ExtractionCascade,
}

#[wasm_bindgen]
impl TableExtractor {
    /// Create a table extractor with default clustering thresholds.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            clusterer: RowClusterer::default(),
            cascade: ExtractionCascade::default(),
        }
    }

    /// Override the clustering thresholds (a partial `ClusterConfig` object).
    #[wasm_bindgen]
    pub fn set_cluster_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: ClusterConfig = serde_wasm_bindgen::from_value(config).map_err(js_error)?;
        self.clusterer = RowClusterer::new(config);
        Ok(())
    }

    /// Group `{x, y, width, height, text}` regions into ordered rows.
    #[wasm_bindgen]
    pub fn cluster(&self, regions: JsValue, width: u32, height: u32) -> Result<JsValue, JsValue> {
        let regions: Vec<Region> = serde_wasm_bindgen::from_value(regions).map_err(js_error)?;
        to_js(&self.clusterer.cluster(regions, (width, height)))
    }

    /// Rebuild the table from regions, falling back to `full_text` when no table is found.
    #[wasm_bindgen]
    pub fn extract(
        &self,
        regions: JsValue,
        width: u32,
        height: u32,
        full_text: &str,
    ) -> Result<JsValue, JsValue> {
        let regions: Vec<Region> = serde_wasm_bindgen::from_value(regions).map_err(js_error)?;
        to_js(&self.extract_regions(regions, (width, height), full_text))
    }
}

impl TableExtractor {
    fn extract_regions(&self, regions: Vec<Region>, size: (u32, u32), full_text: &str) -> ExtractResult {
        let rows = self
            .clusterer
            .cluster(regions, size)
            .iter()
            .map(|row| {
                row.regions
                    .iter()
                    .map(|region| normalize_cell_text(&region.text))
                    .collect()
            })
            .collect();
        ExtractResult::from(self.cascade.extract(&PageEvidence::new(rows, full_text)))
    }
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn cell(x: u32, y: u32, text: &str) -> Region {
        Region::new(x, y, 120, 30).with_text(text)
    }

    #[wasm_bindgen_test]
    fn test_extract_regions_builds_table() {
        let regions = vec![
            cell(300, 407, "Bolt"),
            cell(100, 100, "Part No"),
            cell(300, 102, "Description"),
            cell(100, 405, "P1"),
        ];
        let result = TableExtractor::new().extract_regions(regions, (1000, 1000), "");

        assert_eq!(result.stage.as_deref(), Some("geometric"));
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].part_no, "P1");
        assert_eq!(result.items[0].description, "Bolt");
    }

    #[wasm_bindgen_test]
    fn test_extract_regions_normalizes_cell_text() {
        let regions = vec![
            cell(100, 100, "Part No"),
            cell(300, 100, "Description"),
            cell(100, 405, " P1 "),
            cell(300, 405, "Hex\n  bolt"),
        ];
        let result = TableExtractor::new().extract_regions(regions, (1000, 1000), "");

        assert_eq!(result.items[0].part_no, "P1");
        assert_eq!(result.items[0].description, "Hex bolt");
    }

    #[wasm_bindgen_test]
    fn test_extract_regions_falls_back_to_text() {
        let result = TableExtractor::new().extract_regions(Vec::new(), (1000, 1000), "Total 45.00");
        assert_eq!(result.stage.as_deref(), Some("numeric-pattern"));
        assert_eq!(result.items[0].amount, "45.00");
    }

    #[wasm_bindgen_test]
    fn test_combine_values() {
        let docs = vec![
            serde_json::json!({"invoiceNumber": "A", "items": [{"description": "x", "total": "1.00"}]}),
            serde_json::json!({"invoiceNumber": "B", "total": "2.00"}),
        ];
        let invoice = combine_values(&docs).unwrap().unwrap();
        assert_eq!(invoice.items.len(), 2);
        assert_eq!(invoice.state_name, "Aggregated Invoices");

        assert!(combine_values(&[]).unwrap().is_none());
    }

    #[wasm_bindgen_test]
    fn test_csv_text_has_preamble() {
        let text = csv_text(&sample_invoice()).unwrap();
        assert_eq!(text.lines().count(), 3 + 11);
    }

    #[wasm_bindgen_test]
    fn test_xlsx_bytes_is_zip() {
        let bytes = xlsx_bytes(&sample_invoice(), Some("Sheet".to_string())).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
