//! Publishing changed artifacts.
//!
//! Defines the `SyncPublisher` trait and the git-backed implementation
//! that commits and pushes the scan log and report pages.

pub mod git;

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Abstraction over whatever shares the updated files.
///
/// Called only after local state has been written; a failure here never
/// rolls anything back.
#[async_trait]
pub trait SyncPublisher: Send + Sync {
    async fn publish(&self, files: &[PathBuf], message: &str) -> Result<()>;

    /// Publisher name for logging.
    fn name(&self) -> &str;
}
