//! record-scan — append a new pending scan to the scan log.
//!
//! Usage: record-scan <token> <ca> <conviction> <price>
//!
//! The report rows for the scan are produced by the page templating step;
//! this only makes the scan visible to the outcome updater.

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::info;

use scan_outcomes::config::AppConfig;
use scan_outcomes::storage::ScanStore;
use scan_outcomes::types::ScanRecord;

const USAGE: &str = "Usage: record-scan <token> <ca> <conviction> <price>";

fn main() -> Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scan_outcomes=info,record_scan=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [token, ca, conviction, price] = args.as_slice() else {
        anyhow::bail!("{USAGE}");
    };

    let conviction: u8 = conviction
        .parse()
        .with_context(|| format!("Conviction must be an integer 0-10, got {conviction}"))?;
    let price = Decimal::from_str(price.trim_start_matches('$'))
        .with_context(|| format!("Price must be a decimal, got {price}"))?;

    let record = ScanRecord::new(token.trim_start_matches('$'), ca, conviction, price, Utc::now())?;
    let slug = record.slug();

    let cfg = AppConfig::from_env()?;
    let total = ScanStore::new(cfg.store.path.clone()).append(record)?;

    info!(token = %token, slug = %slug, total, "Scan recorded");
    Ok(())
}
