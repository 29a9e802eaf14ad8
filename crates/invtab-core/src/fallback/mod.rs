//! Text-only recovery of line items when no table geometry is usable.

mod line_parser;
mod numeric;
pub mod patterns;

pub use line_parser::{parse_item_line, parse_item_lines, MIN_ITEM_TOKENS};
pub use numeric::{scan_amounts, PLACEHOLDER_DESCRIPTION, PLACEHOLDER_PART_NO};
