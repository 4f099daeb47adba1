//! Persistence layer.
//!
//! Saves and loads the ordered scan collection to/from a JSON file. The file
//! is the shared track record, so record order and every field (including
//! ones this crate doesn't know about) survive a load/save round trip.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::ScanRecord;

/// JSON-file backed scan store.
#[derive(Debug, Clone)]
pub struct ScanStore {
    path: PathBuf,
}

impl ScanStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all scans. Returns an empty collection if the file doesn't exist.
    pub fn load(&self) -> Result<Vec<ScanRecord>> {
        let path = self.path.display().to_string();

        if !self.path.exists() {
            info!(path = %path, "No scan log found, starting empty");
            return Ok(Vec::new());
        }

        let json = std::fs::read_to_string(&self.path)
            .context(format!("Failed to read scans from {path}"))?;

        let records: Vec<ScanRecord> = serde_json::from_str(&json)
            .context(format!("Failed to parse scans from {path}"))?;

        let pending = records.iter().filter(|r| r.has_pending()).count();
        info!(path = %path, total = records.len(), pending, "Scan log loaded");

        Ok(records)
    }

    /// Persist the full collection, replacing whatever was there.
    pub fn save(&self, records: &[ScanRecord]) -> Result<()> {
        let path = self.path.display().to_string();
        let json = serde_json::to_string_pretty(records)
            .context("Failed to serialise scan log")?;

        std::fs::write(&self.path, &json)
            .context(format!("Failed to write scans to {path}"))?;

        debug!(path = %path, total = records.len(), "Scan log saved");
        Ok(())
    }

    /// Append one freshly logged scan.
    pub fn append(&self, record: ScanRecord) -> Result<usize> {
        let mut records = self.load()?;
        info!(token = %record.token, conviction = record.conviction_score, "Logging scan");
        records.push(record);
        self.save(&records)?;
        Ok(records.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
