//! CSV rendering of a [`WorksheetLayout`].

use std::io::Write;
use std::path::Path;

use tracing::debug;

use super::layout::WorksheetLayout;
use super::Result;
use crate::error::ExportError;

fn csv_error(e: csv::Error) -> ExportError {
    ExportError::Csv(e.to_string())
}

/// Write every layout row, preamble included, as one CSV record.
pub fn write_csv<W: Write>(layout: &WorksheetLayout, writer: W) -> Result<W> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in &layout.rows {
        wtr.write_record(row.texts()).map_err(csv_error)?;
    }
    wtr.flush()?;
    wtr.into_inner()
        .map_err(|e| ExportError::Csv(e.error().to_string()))
}

/// Write `layout` as a CSV file at `path`.
pub fn save_csv(layout: &WorksheetLayout, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(layout, file)?;
    debug!("Wrote CSV {}", path.display());
    Ok(())
}
