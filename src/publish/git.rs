//! Git publisher: `git add`, `git commit`, `git push`.

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use super::SyncPublisher;
use crate::config::PublishConfig;
use crate::types::TrackerError;

const PUBLISHER_NAME: &str = "git";

pub struct GitPublisher {
    repo_dir: PathBuf,
    remote: String,
    branch: String,
}

impl GitPublisher {
    pub fn new(config: &PublishConfig) -> Self {
        Self {
            repo_dir: config.repo_dir.clone(),
            remote: config.remote.clone(),
            branch: config.branch.clone(),
        }
    }

    /// Argument lists for the three git steps, in order.
    fn steps(&self, files: &[PathBuf], message: &str) -> Vec<(&'static str, Vec<String>)> {
        let mut add = vec!["add".to_string(), "--".to_string()];
        add.extend(files.iter().map(|f| f.display().to_string()));

        vec![
            ("add", add),
            ("commit", vec!["commit".into(), "-m".into(), message.to_string()]),
            ("push", vec!["push".into(), self.remote.clone(), self.branch.clone()]),
        ]
    }

    /// Paths handed in are relative to the process working directory, while
    /// git runs inside `repo_dir`.
    fn resolve(files: &[PathBuf], cwd: &Path) -> Vec<PathBuf> {
        files
            .iter()
            .map(|f| if f.is_absolute() { f.clone() } else { cwd.join(f) })
            .collect()
    }

    async fn run(&self, step: &str, args: &[String]) -> Result<(), TrackerError> {
        debug!(step, ?args, "Running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .await
            .map_err(|e| TrackerError::Publish {
                step: step.to_string(),
                message: format!("failed to spawn git: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrackerError::Publish {
                step: step.to_string(),
                message: format!("{}: {}", output.status, stderr.trim()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SyncPublisher for GitPublisher {
    async fn publish(&self, files: &[PathBuf], message: &str) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        let cwd = std::env::current_dir().map_err(|e| TrackerError::Publish {
            step: "add".to_string(),
            message: format!("failed to read working directory: {e}"),
        })?;
        let files = Self::resolve(files, &cwd);

        for (step, args) in self.steps(&files, message) {
            self.run(step, &args).await?;
        }
        info!(
            files = files.len(),
            remote = %self.remote,
            branch = %self.branch,
            "Pushed outcome update"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        PUBLISHER_NAME
    }
}
