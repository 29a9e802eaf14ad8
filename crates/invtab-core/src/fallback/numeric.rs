//! Last-resort scan for monetary values in flat text.

use tracing::debug;

use crate::models::{LineItem, DEFAULT_UNIT};

use super::patterns::MONEY_VALUE;

pub const PLACEHOLDER_PART_NO: &str = "ITEM-1";
pub const PLACEHOLDER_DESCRIPTION: &str = "Extracted Item";

/// Synthesize a single item from the first and last monetary values in `text`.
///
/// Returns `None` when the text holds no monetary value.
pub fn scan_amounts(text: &str) -> Option<LineItem> {
    let mut matches = MONEY_VALUE.find_iter(text).map(|m| m.as_str());
    let first = matches.next()?;
    let last = matches.last().unwrap_or(first);

    debug!("Numeric scan found rate {} and amount {}", first, last);

    Some(LineItem {
        part_no: PLACEHOLDER_PART_NO.to_string(),
        description: PLACEHOLDER_DESCRIPTION.to_string(),
        quantity: "1".to_string(),
        rate: first.to_string(),
        per: DEFAULT_UNIT.to_string(),
        amount: last.to_string(),
        ..Default::default()
    })
}
