//! scan-outcomes — scanner track record updater.
//!
//! Entry point. Loads configuration, initialises structured logging, runs
//! one outcome-update cycle and exits. Meant to be invoked periodically by
//! an external scheduler (cron every 15 minutes).

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use scan_outcomes::config::AppConfig;
use scan_outcomes::documents::DocumentPatcher;
use scan_outcomes::engine::cycle::{self, CycleReport, PublishStatus};
use scan_outcomes::pricing::dexscreener::DexScreenerClient;
use scan_outcomes::publish::git::GitPublisher;
use scan_outcomes::publish::SyncPublisher;
use scan_outcomes::storage::ScanStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::from_env()?;
    init_logging();

    info!(
        store = %cfg.store.path.display(),
        pages = cfg.documents.paths.len(),
        reference_chain = %cfg.oracle.reference_chain,
        publish = cfg.publish.enabled,
        "Outcome update starting"
    );

    let store = ScanStore::new(cfg.store.path.clone());
    let oracle = DexScreenerClient::new(&cfg.oracle)?;
    let patcher = DocumentPatcher::new(&cfg.documents);
    let git = cfg.publish.enabled.then(|| GitPublisher::new(&cfg.publish));
    let publisher = git.as_ref().map(|g| g as &dyn SyncPublisher);

    let report = cycle::run_cycle(&store, &oracle, &patcher, publisher, Utc::now()).await?;
    log_cycle_report(&report);

    Ok(())
}

/// Log a human-readable cycle summary.
fn log_cycle_report(report: &CycleReport) {
    info!(
        scans = report.scans_total,
        evaluated = report.scans_evaluated,
        resolved_24h = report.resolved_24h,
        resolved_48h = report.resolved_48h,
        deferred = report.deferred,
        pages = report.pages_updated.len(),
        publish = ?report.publish,
        "Cycle complete"
    );
    if let PublishStatus::Failed(reason) = &report.publish {
        warn!(reason = %reason, "Local files are ahead of the remote until the next successful push");
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scan_outcomes=info"));

    let json_logging = std::env::var("SCAN_OUTCOMES_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
