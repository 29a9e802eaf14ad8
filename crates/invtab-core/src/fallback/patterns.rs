//! Regex patterns for flat-text line-item recovery.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Monetary-looking values: optional dollar sign, digits, one separator, two decimals.
    pub static ref MONEY_VALUE: Regex = Regex::new(
        r"\$?\d+[.,]\d{2}\b"
    ).unwrap();

    // Table header lines carry at least one of these words.
    pub static ref HEADER_KEYWORD: Regex = Regex::new(
        r"(?i)item|description|quantity|price|amount"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_value() {
        let found: Vec<&str> = MONEY_VALUE
            .find_iter("Total due $45.00 after tax 12,50 and 3.5")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["$45.00", "12,50"]);
    }

    #[test]
    fn test_header_keyword_case_insensitive() {
        assert!(HEADER_KEYWORD.is_match("S.No  ITEM  Qty"));
        assert!(HEADER_KEYWORD.is_match("Unit Price"));
        assert!(!HEADER_KEYWORD.is_match("P1 Bolt 10 2.50 25.00"));
    }
}
