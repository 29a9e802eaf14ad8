//! Minimal SpreadsheetML (`.xlsx`) writer for a [`WorksheetLayout`].
//!
//! The package holds one worksheet with inline strings, numeric sequence
//! cells, column widths, and a bold font style for header cells.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::layout::{column_letter, CellValue, WorksheetLayout};
use super::Result;
use crate::error::ExportError;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Style index of the bold header font in `styles.xml`.
const BOLD_STYLE: &str = "1";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font><font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// Write `layout` as an `.xlsx` file at `path`.
pub fn save_xlsx(layout: &WorksheetLayout, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_xlsx(layout, file)?;
    debug!("Wrote workbook {}", path.display());
    Ok(())
}

/// Write `layout` as an `.xlsx` package into `writer`, returning the writer.
pub fn write_xlsx<W: Write + Seek>(layout: &WorksheetLayout, writer: W) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, Vec<u8>); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec()),
        ("_rels/.rels", package_rels()?),
        ("xl/workbook.xml", workbook(&layout.sheet_name)?),
        ("xl/_rels/workbook.xml.rels", workbook_rels()?),
        ("xl/styles.xml", STYLES.as_bytes().to_vec()),
        ("xl/worksheets/sheet1.xml", worksheet(layout)?),
    ];

    for (name, content) in parts {
        zip.start_file(name, options).map_err(archive_error)?;
        zip.write_all(&content)?;
    }

    zip.finish().map_err(archive_error)
}

fn archive_error(e: zip::result::ZipError) -> ExportError {
    ExportError::Archive(e.to_string())
}

/// Thin wrapper over `quick_xml::Writer` mapping errors into [`ExportError`].
struct XmlPart {
    writer: Writer<Vec<u8>>,
}

impl XmlPart {
    fn new() -> Result<Self> {
        let mut part = Self {
            writer: Writer::new(Vec::new()),
        };
        part.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(part)
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| ExportError::Xml(e.to_string()))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut tag = BytesStart::new(name);
        for attr in attrs {
            tag.push_attribute(*attr);
        }
        self.event(Event::Start(tag))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut tag = BytesStart::new(name);
        for attr in attrs {
            tag.push_attribute(*attr);
        }
        self.event(Event::Empty(tag))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.event(Event::Text(BytesText::new(text)))
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

fn package_rels() -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start("Relationships", &[("xmlns", PKG_REL_NS)])?;
    xml.empty(
        "Relationship",
        &[
            ("Id", "rId1"),
            (
                "Type",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
            ),
            ("Target", "xl/workbook.xml"),
        ],
    )?;
    xml.end("Relationships")?;
    Ok(xml.finish())
}

fn workbook_rels() -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start("Relationships", &[("xmlns", PKG_REL_NS)])?;
    xml.empty(
        "Relationship",
        &[
            ("Id", "rId1"),
            (
                "Type",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet",
            ),
            ("Target", "worksheets/sheet1.xml"),
        ],
    )?;
    xml.empty(
        "Relationship",
        &[
            ("Id", "rId2"),
            (
                "Type",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles",
            ),
            ("Target", "styles.xml"),
        ],
    )?;
    xml.end("Relationships")?;
    Ok(xml.finish())
}

fn workbook(sheet_name: &str) -> Result<Vec<u8>> {
    let name = sanitize_sheet_name(sheet_name);
    let mut xml = XmlPart::new()?;
    xml.start("workbook", &[("xmlns", MAIN_NS), ("xmlns:r", REL_NS)])?;
    xml.start("sheets", &[])?;
    xml.empty(
        "sheet",
        &[("name", name.as_str()), ("sheetId", "1"), ("r:id", "rId1")],
    )?;
    xml.end("sheets")?;
    xml.end("workbook")?;
    Ok(xml.finish())
}

fn worksheet(layout: &WorksheetLayout) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.start("worksheet", &[("xmlns", MAIN_NS)])?;

    xml.start("cols", &[])?;
    for (i, width) in layout.column_widths.iter().enumerate() {
        let index = (i + 1).to_string();
        let width = width.to_string();
        xml.empty(
            "col",
            &[
                ("min", index.as_str()),
                ("max", index.as_str()),
                ("width", width.as_str()),
                ("customWidth", "1"),
            ],
        )?;
    }
    xml.end("cols")?;

    xml.start("sheetData", &[])?;
    for (r, row) in layout.rows.iter().enumerate() {
        if row.is_blank() {
            continue;
        }
        let row_number = (r + 1).to_string();
        xml.start("row", &[("r", row_number.as_str())])?;

        for (c, cell) in row.cells.iter().enumerate() {
            let reference = format!("{}{}", column_letter(c), row_number);
            let mut attrs = vec![("r", reference.as_str())];
            if cell.bold {
                attrs.push(("s", BOLD_STYLE));
            }

            match &cell.value {
                CellValue::Empty => {}
                CellValue::Text(text) if text.is_empty() => {}
                CellValue::Text(text) => {
                    attrs.push(("t", "inlineStr"));
                    xml.start("c", &attrs)?;
                    xml.start("is", &[])?;
                    xml.start("t", &[("xml:space", "preserve")])?;
                    xml.text(text)?;
                    xml.end("t")?;
                    xml.end("is")?;
                    xml.end("c")?;
                }
                CellValue::Number(n) => {
                    xml.start("c", &attrs)?;
                    xml.start("v", &[])?;
                    xml.text(&n.to_string())?;
                    xml.end("v")?;
                    xml.end("c")?;
                }
            }
        }

        xml.end("row")?;
    }
    xml.end("sheetData")?;

    xml.end("worksheet")?;
    Ok(xml.finish())
}

/// Sheet names are at most 31 characters and may not contain `[]:*?/\`.
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}
