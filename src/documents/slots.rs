//! Slot index over a report page.
//!
//! A page is a sequence of scan rows, each opened by one of the configured
//! row markers. Inside a row the token link (`href="reads/{slug}.html"`)
//! names the scan, and each horizon cell is the element tagged
//! `data-label="24H">` / `data-label="48H">`. The index maps
//! `(slug, horizon)` to those cells in page order and records whether each
//! still holds the pending placeholder.

use std::collections::HashMap;
use std::ops::Range;

use crate::types::Horizon;

const LINK_PREFIX: &str = "href=\"reads/";
const LINK_SUFFIX: &str = ".html\"";

/// What a slot currently contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    /// Byte range of the placeholder literal.
    Pending(Range<usize>),
    Filled,
}

/// How rows and placeholders look in a page.
#[derive(Debug, Clone)]
pub struct SlotLayout {
    pub row_markers: Vec<String>,
    pub pending_placeholder: String,
}

#[derive(Debug, Default)]
pub struct SlotIndex {
    slots: HashMap<(String, Horizon), Vec<SlotState>>,
}

impl SlotIndex {
    /// Scan `text` once and index every horizon cell by slug.
    pub fn build(text: &str, layout: &SlotLayout) -> Self {
        let mut index = SlotIndex::default();
        let starts = row_starts(text, &layout.row_markers);

        for (row, &start) in starts.iter().enumerate() {
            let end = starts.get(row + 1).copied().unwrap_or(text.len());
            let body = &text[start..end];

            let Some(slug) = row_slug(body) else {
                continue;
            };

            for horizon in Horizon::ALL {
                let Some(state) = cell_state(body, start, horizon, &layout.pending_placeholder)
                else {
                    continue;
                };
                index
                    .slots
                    .entry((slug.to_string(), horizon))
                    .or_default()
                    .push(state);
            }
        }

        index
    }

    /// Cells for `(slug, horizon)`, top of the page first.
    pub fn slots(&self, slug: &str, horizon: Horizon) -> &[SlotState] {
        self.slots
            .get(&(slug.to_string(), horizon))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Sorted byte offsets of every row marker occurrence.
fn row_starts(text: &str, markers: &[String]) -> Vec<usize> {
    let mut starts: Vec<usize> = markers
        .iter()
        .filter(|m| !m.is_empty())
        .flat_map(|m| text.match_indices(m.as_str()).map(|(i, _)| i))
        .collect();
    starts.sort_unstable();
    starts.dedup();
    starts
}

/// Slug from the first `reads/{slug}.html` link in the row.
fn row_slug(row: &str) -> Option<&str> {
    let from = row.find(LINK_PREFIX)? + LINK_PREFIX.len();
    let len = row[from..].find(LINK_SUFFIX)?;
    let slug = &row[from..from + len];
    if slug.is_empty() || !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return None;
    }
    Some(slug)
}

fn cell_state(row: &str, row_offset: usize, horizon: Horizon, placeholder: &str) -> Option<SlotState> {
    let tag = format!("data-label=\"{}\">", horizon.label());
    let content = row.find(&tag)? + tag.len();
    let rest = &row[content..];
    let lead = rest.len() - rest.trim_start().len();

    if rest[lead..].starts_with(placeholder) {
        let start = row_offset + content + lead;
        Some(SlotState::Pending(start..start + placeholder.len()))
    } else {
        Some(SlotState::Filled)
    }
}
