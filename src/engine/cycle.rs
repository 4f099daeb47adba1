//! One outcome-update cycle.
//!
//! Loads the scan log, evaluates every scan that still has a pending
//! horizon, and only when something resolved: saves the log, patches the
//! report pages, and hands the store and pages to the publisher.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};

use crate::documents::DocumentPatcher;
use crate::engine::evaluator::OutcomeEvaluator;
use crate::pricing::PriceOracle;
use crate::publish::SyncPublisher;
use crate::storage::ScanStore;
use crate::types::Horizon;

/// How the publish step went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    /// Nothing resolved, so nothing to publish.
    Skipped,
    /// No publisher configured.
    Disabled,
    Published,
    Failed(String),
}

/// Summary of a completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub timestamp: DateTime<Utc>,
    pub scans_total: usize,
    pub scans_evaluated: usize,
    pub resolved_24h: usize,
    pub resolved_48h: usize,
    /// Due horizons that got no price this cycle.
    pub deferred: usize,
    pub pages_updated: Vec<PathBuf>,
    pub publish: PublishStatus,
}

impl CycleReport {
    fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            scans_total: 0,
            scans_evaluated: 0,
            resolved_24h: 0,
            resolved_48h: 0,
            deferred: 0,
            pages_updated: Vec::new(),
            publish: PublishStatus::Skipped,
        }
    }

    pub fn changed(&self) -> bool {
        self.resolved_24h + self.resolved_48h > 0
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cycle @ {}: scans={} evaluated={} resolved_24h={} resolved_48h={} deferred={} pages={} publish={:?}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.scans_total,
            self.scans_evaluated,
            self.resolved_24h,
            self.resolved_48h,
            self.deferred,
            self.pages_updated.len(),
            self.publish,
        )
    }
}

/// Commit message for an outcome update made at `now`.
pub fn commit_message(now: DateTime<Utc>) -> String {
    format!(
        "Outcome update: {}",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// The store plus every configured page on disk. Pages edited by an earlier
/// cycle whose publish failed are carried along until one succeeds.
fn publish_files(store: &ScanStore, patcher: &DocumentPatcher) -> Vec<PathBuf> {
    let mut files = vec![store.path().to_path_buf()];
    files.extend(patcher.paths().iter().filter(|p| p.exists()).cloned());
    files
}

/// Run a single cycle as of `now`.
pub async fn run_cycle(
    store: &ScanStore,
    oracle: &dyn PriceOracle,
    patcher: &DocumentPatcher,
    publisher: Option<&dyn SyncPublisher>,
    now: DateTime<Utc>,
) -> Result<CycleReport> {
    let mut report = CycleReport::new(now);
    let mut scans = store.load()?;
    report.scans_total = scans.len();

    let evaluator = OutcomeEvaluator::new(oracle);
    for scan in scans.iter_mut().filter(|s| s.has_pending()) {
        report.scans_evaluated += 1;
        let evaluation = evaluator.evaluate(scan, now).await;
        for horizon in &evaluation.resolved {
            match horizon {
                Horizon::H24 => report.resolved_24h += 1,
                Horizon::H48 => report.resolved_48h += 1,
            }
        }
        report.deferred += evaluation.deferred.len();
    }

    if !report.changed() {
        info!(
            evaluated = report.scans_evaluated,
            deferred = report.deferred,
            "No pending outcomes due for update"
        );
        return Ok(report);
    }

    store.save(&scans)?;
    report.pages_updated = patcher.patch_all(&scans)?;

    report.publish = match publisher {
        None => PublishStatus::Disabled,
        Some(publisher) => {
            let files = publish_files(store, patcher);
            match publisher.publish(&files, &commit_message(now)).await {
                Ok(()) => PublishStatus::Published,
                Err(e) => {
                    error!(publisher = publisher.name(), error = %e, "Publish failed, local state kept");
                    PublishStatus::Failed(e.to_string())
                }
            }
        }
    };

    Ok(report)
}
