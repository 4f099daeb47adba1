//! Report page patching.
//!
//! Writes resolved outcomes into the report pages and fills in the
//! aggregate accuracy figure. Patching is anchored on placeholders that are
//! still present, so running it again over an already patched page changes
//! nothing.

pub mod slots;

use anyhow::{Context, Result};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::DocumentsConfig;
use crate::types::{signed_percent, Horizon, ScanRecord};
use slots::{SlotIndex, SlotLayout, SlotState};

const CORRECT_CLASS: &str = "outcome-correct";
const WRONG_CLASS: &str = "outcome-wrong";

/// What a single page patch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSummary {
    pub slots_filled: usize,
    pub accuracy_filled: bool,
}

impl PatchSummary {
    pub fn changed(&self) -> bool {
        self.slots_filled > 0 || self.accuracy_filled
    }
}

pub struct DocumentPatcher {
    paths: Vec<PathBuf>,
    layout: SlotLayout,
    accuracy_placeholder: String,
}

impl DocumentPatcher {
    pub fn new(config: &DocumentsConfig) -> Self {
        Self {
            paths: config.paths.clone(),
            layout: SlotLayout {
                row_markers: config.row_markers.clone(),
                pending_placeholder: config.pending_placeholder.clone(),
            },
            accuracy_placeholder: config.accuracy_placeholder.clone(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Patch every configured page on disk. Returns the pages that changed.
    /// A page is read once and written at most once.
    pub fn patch_all(&self, records: &[ScanRecord]) -> Result<Vec<PathBuf>> {
        let mut changed = Vec::new();
        for path in &self.paths {
            if self.patch_file(path, records)? {
                changed.push(path.clone());
            }
        }
        Ok(changed)
    }

    fn patch_file(&self, path: &Path, records: &[ScanRecord]) -> Result<bool> {
        let page = path.display().to_string();
        if !path.exists() {
            warn!(path = %page, "Report page not found, skipping");
            return Ok(false);
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report page {page}"))?;
        let (patched, summary) = self.patch_text(&text, records);

        if !summary.changed() {
            debug!(path = %page, "Report page already up to date");
            return Ok(false);
        }

        std::fs::write(path, &patched)
            .with_context(|| format!("Failed to write report page {page}"))?;
        info!(
            path = %page,
            slots = summary.slots_filled,
            accuracy = summary.accuracy_filled,
            "Report page updated"
        );
        Ok(true)
    }

    /// Apply outcomes and accuracy to one page's text.
    pub fn patch_text(&self, text: &str, records: &[ScanRecord]) -> (String, PatchSummary) {
        let index = SlotIndex::build(text, &self.layout);
        let mut edits = slot_edits(&index, records);
        let mut summary = PatchSummary {
            slots_filled: edits.len(),
            accuracy_filled: false,
        };

        if let Some(accuracy) = accuracy(records) {
            if let Some(at) = text.find(&self.accuracy_placeholder) {
                let range = at..at + self.accuracy_placeholder.len();
                // A placeholder sitting inside a slot edit is left alone.
                if !edits.iter().any(|(r, _)| overlaps(r, &range)) {
                    edits.push((range, format!("{accuracy}%")));
                    summary.accuracy_filled = true;
                }
            }
        }

        // Back to front so earlier offsets stay valid.
        edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
        let mut out = text.to_string();
        for (range, replacement) in edits {
            out.replace_range(range, &replacement);
        }

        (out, summary)
    }
}

/// Placeholder replacements for every resolved horizon whose slot is still
/// pending.
///
/// Pages list newest scans first while the store is oldest first, so when
/// several scans share a slug the oldest record takes the bottom-most slot.
fn slot_edits(index: &SlotIndex, records: &[ScanRecord]) -> Vec<(Range<usize>, String)> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut edits = Vec::new();

    for record in records {
        let slug = record.slug();
        let rank = {
            let n = seen.entry(slug.clone()).or_insert(0);
            *n += 1;
            *n - 1
        };

        for horizon in Horizon::ALL {
            let Some(change) = record.resolved_outcome(horizon) else {
                continue;
            };
            let slots = index.slots(&slug, horizon);
            let Some(slot) = slots.len().checked_sub(rank + 1).map(|i| &slots[i]) else {
                continue;
            };
            if let SlotState::Pending(range) = slot {
                debug!(token = %record.token, %horizon, "Filling slot");
                edits.push((range.clone(), outcome_markup(change)));
            }
        }
    }

    edits
}

/// `<span class="outcome-correct">+10.00%</span>`; non-positive changes get
/// the wrong styling.
pub fn outcome_markup(change: Decimal) -> String {
    let class = if change > Decimal::ZERO {
        CORRECT_CLASS
    } else {
        WRONG_CLASS
    };
    format!(r#"<span class="{class}">{}%</span>"#, signed_percent(change))
}

/// Share of scored scans judged correct, one decimal. `None` when nothing
/// has been scored yet.
pub fn accuracy(records: &[ScanRecord]) -> Option<Decimal> {
    let scored: Vec<&ScanRecord> = records.iter().filter(|r| r.is_scored()).collect();
    if scored.is_empty() {
        return None;
    }
    let correct = scored.iter().filter(|r| r.correct == Some(true)).count();

    let mut pct = (Decimal::from(correct) * dec!(100) / Decimal::from(scored.len()))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    pct.rescale(1);
    Some(pct)
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
