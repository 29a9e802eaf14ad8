//! Worksheet layout and its serialization to `.xlsx` or `.csv`.

mod delimited;
mod layout;
mod xlsx;

pub use delimited::{save_csv, write_csv};
pub use layout::{
    column_letter, Cell, CellValue, LayoutRow, WorksheetLayout, COLUMN_COUNT, COLUMN_WIDTHS,
    DEFAULT_SHEET_NAME, HEADERS, PREAMBLE_ROWS,
};
pub use xlsx::{save_xlsx, write_xlsx};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ExportError;
use crate::models::config::ExportConfig;
use crate::models::Invoice;

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Output file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

/// `<prefix>_<YYYYmmdd_HHMMSS>.<ext>`
pub fn output_file_name(prefix: &str, format: ExportFormat, timestamp: DateTime<Local>) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Lay out `invoice` and write it into `output_dir`, returning the file path.
pub fn export_invoice(
    invoice: &Invoice,
    output_dir: &Path,
    config: &ExportConfig,
    format: ExportFormat,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let layout = WorksheetLayout::build(invoice).with_sheet_name(config.sheet_name.as_str());
    let path = output_dir.join(output_file_name(&config.export_name, format, Local::now()));

    match format {
        ExportFormat::Xlsx => save_xlsx(&layout, &path)?,
        ExportFormat::Csv => save_csv(&layout, &path)?,
    }

    info!(
        "Exported {} items to {}",
        invoice.items.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_invoice;
    use chrono::TimeZone;

    #[test]
    fn test_output_file_name() {
        let ts = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(
            output_file_name("Invoice_Export", ExportFormat::Xlsx, ts),
            "Invoice_Export_20240305_140709.xlsx"
        );
        assert_eq!(
            output_file_name("batch", ExportFormat::Csv, ts),
            "batch_20240305_140709.csv"
        );
    }

    #[test]
    fn test_export_invoice_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let path = export_invoice(
            &sample_invoice(),
            &out,
            &ExportConfig::default(),
            ExportFormat::Csv,
        )
        .unwrap();

        assert!(path.starts_with(&out));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("Invoice_Export_"));
        assert!(name.ends_with(".csv"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3 + 11);
    }

    #[test]
    fn test_format_serde() {
        assert_eq!(serde_json::to_string(&ExportFormat::Csv).unwrap(), "\"csv\"");
        let format: ExportFormat = serde_json::from_str("\"xlsx\"").unwrap();
        assert_eq!(format, ExportFormat::Xlsx);
    }
}
