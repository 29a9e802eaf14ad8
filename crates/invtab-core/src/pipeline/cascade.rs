//! Fixed-order extraction cascade: geometric table, line tokens, numeric scan.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fallback::{parse_item_lines, scan_amounts};
use crate::models::LineItem;
use crate::table::FieldMapper;

/// Everything the cascade may draw on for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageEvidence {
    /// Cell texts of clustered rows, top to bottom; the first row is the header.
    pub rows: Vec<Vec<String>>,
    /// Full-page recognized text, lines separated by `\n`.
    pub full_text: String,
}

impl PageEvidence {
    pub fn new(rows: Vec<Vec<String>>, full_text: impl Into<String>) -> Self {
        Self {
            rows,
            full_text: full_text.into(),
        }
    }

    /// Evidence with no geometry, e.g. embedded PDF text.
    pub fn text_only(full_text: impl Into<String>) -> Self {
        Self::new(Vec::new(), full_text)
    }
}

/// One extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Positional mapping of clustered table rows.
    Geometric,
    /// Whitespace-token parsing of the flat text.
    LineTokens,
    /// Single placeholder item from monetary values in the flat text.
    NumericPattern,
}

impl StageKind {
    /// Stages in the order they are tried.
    pub const ORDER: [StageKind; 3] = [
        StageKind::Geometric,
        StageKind::LineTokens,
        StageKind::NumericPattern,
    ];
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StageKind::Geometric => "geometric",
            StageKind::LineTokens => "line-tokens",
            StageKind::NumericPattern => "numeric-pattern",
        };
        f.write_str(name)
    }
}

/// What a single stage produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Found(Vec<LineItem>),
    Empty,
}

impl StageOutcome {
    fn from_items(items: Vec<LineItem>) -> Self {
        if items.is_empty() {
            StageOutcome::Empty
        } else {
            StageOutcome::Found(items)
        }
    }
}

/// Items plus the stage that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub stage: StageKind,
    pub items: Vec<LineItem>,
}

/// Runs the stages in [`StageKind::ORDER`] and stops at the first non-empty one.
#[derive(Debug, Clone, Default)]
pub struct ExtractionCascade {
    mapper: FieldMapper,
}

impl ExtractionCascade {
    pub fn new(mapper: FieldMapper) -> Self {
        Self { mapper }
    }

    /// Run one stage in isolation.
    pub fn run_stage(&self, stage: StageKind, evidence: &PageEvidence) -> StageOutcome {
        match stage {
            StageKind::Geometric => StageOutcome::from_items(self.mapper.map_table(&evidence.rows)),
            StageKind::LineTokens => StageOutcome::from_items(parse_item_lines(&evidence.full_text)),
            StageKind::NumericPattern => match scan_amounts(&evidence.full_text) {
                Some(item) => StageOutcome::Found(vec![item]),
                None => StageOutcome::Empty,
            },
        }
    }

    /// Extract items, or `None` when every stage came back empty.
    pub fn extract(&self, evidence: &PageEvidence) -> Option<Extraction> {
        self.extract_document(std::slice::from_ref(evidence))
    }

    /// Run one stage over every page of a document.
    ///
    /// Each page's table is mapped on its own, since every page repeats the
    /// header row. The text stages see the pages' text joined with `\n`, so the
    /// numeric scan runs at most once per document.
    pub fn run_document_stage(&self, stage: StageKind, pages: &[PageEvidence]) -> StageOutcome {
        match stage {
            StageKind::Geometric => StageOutcome::from_items(
                pages
                    .iter()
                    .flat_map(|page| self.mapper.map_table(&page.rows))
                    .collect(),
            ),
            StageKind::LineTokens | StageKind::NumericPattern => {
                let joined = pages
                    .iter()
                    .map(|page| page.full_text.trim_end())
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                self.run_stage(stage, &PageEvidence::text_only(joined))
            }
        }
    }

    /// Extract items for a whole document: the first stage that finds anything
    /// on any page supplies every item.
    pub fn extract_document(&self, pages: &[PageEvidence]) -> Option<Extraction> {
        for stage in StageKind::ORDER {
            match self.run_document_stage(stage, pages) {
                StageOutcome::Found(items) => {
                    info!(
                        "Extracted {} items from {} pages with the {} stage",
                        items.len(),
                        pages.len(),
                        stage
                    );
                    return Some(Extraction { stage, items });
                }
                StageOutcome::Empty => debug!("Stage {} found nothing", stage),
            }
        }
        None
    }
}
