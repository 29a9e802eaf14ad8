//! PDF documents built in memory with lopdf and run through the document processor.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use invtab_core::error::DocumentError;
use invtab_core::ocr::Result as OcrResult;
use invtab_core::pdf::{PdfExtractor, PdfProcessor};
use invtab_core::{
    DocumentProcessor, InvtabConfig, InvtabError, Region, RegionDetector, TextRecognizer,
};

/// One page: lines of text, and optionally a gray image XObject.
struct PageSpec<'a> {
    lines: &'a [&'a str],
    image: Option<(u32, u32)>,
}

fn text_page<'a>(lines: &'a [&'a str]) -> PageSpec<'a> {
    PageSpec { lines, image: None }
}

fn text_operations(lines: &[&str]) -> Vec<Operation> {
    let mut ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![50.into(), 750.into()]),
    ];
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            ops.push(Operation::new("Td", vec![0.into(), (-30).into()]));
        }
        ops.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids: Vec<Object> = Vec::new();
    for spec in pages {
        let mut operations = text_operations(spec.lines);
        let mut xobjects = lopdf::Dictionary::new();

        if let Some((width, height)) = spec.image {
            let pixels = vec![255u8; (width * height) as usize];
            let image_id: ObjectId = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                pixels,
            ));
            xobjects.set("Im1", image_id);
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![
                    (width as i64).into(),
                    0.into(),
                    0.into(),
                    (height as i64).into(),
                    0.into(),
                    0.into(),
                ],
            ));
            operations.push(Operation::new("Do", vec!["Im1".into()]));
            operations.push(Operation::new("Q", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => xobjects,
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn write_pdf(dir: &TempDir, name: &str, pages: &[PageSpec]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, build_pdf(pages)).unwrap();
    path
}

fn process(processor: &DocumentProcessor, path: &Path) -> Vec<invtab_core::LineItem> {
    processor.process_path(path).unwrap().line_items()
}

const ITEM_LINES: [&str; 2] = [
    "LC-01 Laser cut plate 4 118.50 474.00",
    "LC-02 Bent bracket 2 15.00 30.00",
];

#[test]
fn test_pages_reports_embedded_text() {
    let data = build_pdf(&[text_page(&ITEM_LINES), text_page(&["Thank you"])]);
    let mut extractor = PdfExtractor::new();
    extractor.load(&data).unwrap();

    assert_eq!(extractor.page_count(), 2);
    let pages = extractor.pages(0).unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].number, 1);
    assert!(pages[0].text.contains("LC-01"));
    assert!(pages[1].text.contains("Thank you"));

    assert_eq!(extractor.pages(1).unwrap().len(), 1);
}

#[test]
fn test_totals_page_does_not_add_placeholder_item() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(
        &dir,
        "order.pdf",
        &[
            text_page(&ITEM_LINES),
            text_page(&["Thank you", "Grand total 504.00"]),
        ],
    );

    let items = process(&DocumentProcessor::new(InvtabConfig::default()), &path);

    let parts: Vec<&str> = items.iter().map(|i| i.part_no.as_str()).collect();
    assert_eq!(parts, vec!["LC-01", "LC-02"]);
    assert_eq!(items[0].description, "Laser cut plate");
    assert_eq!(items[1].amount, "30.00");
}

#[test]
fn test_short_page_without_images_falls_back_to_its_text() {
    let dir = TempDir::new().unwrap();
    // Well under the default 50-character threshold, and no images to scan.
    let path = write_pdf(&dir, "total.pdf", &[text_page(&["Grand total 504.00"])]);

    let items = process(&DocumentProcessor::new(InvtabConfig::default()), &path);

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].part_no, "ITEM-1");
    assert_eq!(items[0].amount, "504.00");
}

#[test]
fn test_item_lines_split_across_text_and_short_pages() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(
        &dir,
        "split.pdf",
        &[text_page(&ITEM_LINES), text_page(&["P9 Nut 8 0.50 4.00"])],
    );

    let items = process(&DocumentProcessor::new(InvtabConfig::default()), &path);

    let parts: Vec<&str> = items.iter().map(|i| i.part_no.as_str()).collect();
    assert_eq!(parts, vec!["LC-01", "LC-02", "P9"]);
}

#[test]
fn test_max_pages_limits_processing() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(
        &dir,
        "limited.pdf",
        &[text_page(&ITEM_LINES), text_page(&["P9 Nut 8 0.50 4.00"])],
    );

    let mut config = InvtabConfig::default();
    config.pdf.max_pages = 1;
    let items = process(&DocumentProcessor::new(config), &path);

    assert_eq!(items.len(), 2);
}

#[test]
fn test_text_pdf_without_items_has_no_data() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(&dir, "letter.pdf", &[text_page(&["Thank you", "See you soon"])]);

    let err = DocumentProcessor::new(InvtabConfig::default())
        .process_path(&path)
        .unwrap_err();
    assert!(matches!(err, InvtabError::Document(DocumentError::NoData(_))));
}

/// Returns a two-row table for any page image.
struct TableRegions;

impl RegionDetector for TableRegions {
    fn detect(&self, _image: &GrayImage) -> OcrResult<Vec<Region>> {
        Ok(vec![
            Region::new(20, 20, 100, 30).with_text("Part No"),
            Region::new(140, 20, 100, 30).with_text("Description"),
            Region::new(20, 120, 100, 30).with_text("SC-7"),
            Region::new(140, 120, 100, 30).with_text("Scanned flange"),
        ])
    }
}

struct NoText;

impl TextRecognizer for NoText {
    fn recognize(&self, _image: &DynamicImage) -> OcrResult<String> {
        Ok(String::new())
    }
}

#[test]
fn test_scanned_page_goes_through_image_path() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(
        &dir,
        "scan.pdf",
        &[PageSpec {
            lines: &[],
            image: Some((400, 300)),
        }],
    );

    let processor = DocumentProcessor::new(InvtabConfig::default())
        .with_detector(TableRegions)
        .with_recognizer(NoText);
    let items = process(&processor, &path);

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].part_no, "SC-7");
    assert_eq!(items[0].description, "Scanned flange");
}

#[test]
fn test_embedded_text_ignored_when_not_preferred() {
    let dir = TempDir::new().unwrap();
    let path = write_pdf(
        &dir,
        "mixed.pdf",
        &[PageSpec {
            lines: &ITEM_LINES,
            image: Some((400, 300)),
        }],
    );

    let mut config = InvtabConfig::default();
    config.pdf.prefer_embedded_text = false;
    let processor = DocumentProcessor::new(config)
        .with_detector(TableRegions)
        .with_recognizer(NoText);
    let items = process(&processor, &path);

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].part_no, "SC-7");
}
