//! Whitespace-token parsing of flat OCR text into line items.

use tracing::{debug, trace};

use crate::models::{LineItem, DEFAULT_UNIT};

use super::patterns::HEADER_KEYWORD;

/// Lines with fewer tokens than this are not item lines.
pub const MIN_ITEM_TOKENS: usize = 5;

/// Parse item lines from a full-page text dump.
///
/// Each accepted line is read as `partNo description... quantity rate amount`.
pub fn parse_item_lines(text: &str) -> Vec<LineItem> {
    let items: Vec<LineItem> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let header = HEADER_KEYWORD.is_match(line);
            if header {
                trace!("Skipping header-like line: {}", line);
            }
            !header
        })
        .filter_map(parse_item_line)
        .collect();

    debug!("Line-token parser produced {} items", items.len());
    items
}

/// Parse one trimmed, non-header line.
pub fn parse_item_line(line: &str) -> Option<LineItem> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let n = tokens.len();
    if n < MIN_ITEM_TOKENS {
        return None;
    }

    Some(LineItem {
        part_no: tokens[0].to_string(),
        description: tokens[1..n - 3].join(" "),
        quantity: tokens[n - 3].to_string(),
        rate: tokens[n - 2].to_string(),
        per: DEFAULT_UNIT.to_string(),
        amount: tokens[n - 1].to_string(),
        ..Default::default()
    })
}
