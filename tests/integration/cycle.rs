//! End-to-end outcome cycles over a temp workspace.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::{Path, PathBuf};

use scan_outcomes::config::DocumentsConfig;
use scan_outcomes::documents::DocumentPatcher;
use scan_outcomes::engine::cycle::{run_cycle, CycleReport, PublishStatus};
use scan_outcomes::publish::SyncPublisher;
use scan_outcomes::storage::ScanStore;
use scan_outcomes::types::ScanRecord;

use crate::mocks::{MockOracle, MockPublisher};

const FOO_CA: &str = "0x1111111111111111111111111111111111111111";
const BAR_CA: &str = "0x2222222222222222222222222222222222222222";
const QUX_CA: &str = "0x3333333333333333333333333333333333333333";

const INDEX_PAGE: &str = r#"<html><body>
<div class="stats"><div class="stat-value">—%</div><div class="stat-label">Accuracy (7+)</div></div>
<div class="scan-list">
<div class="scan-item">
<div class="scan-date">2026-02-10<br>10:00 PST</div>
<div class="scan-token">
<a href="reads/bar.html">$BAR</a>
</div>
<div class="scan-conviction conviction-low">3/10</div>
<div class="outcome outcome-pending" data-label="24H">Pending</div>
<div class="outcome outcome-pending" data-label="48H">Pending</div>
</div>
<div class="scan-item">
<div class="scan-date">2026-02-09<br>08:00 PST</div>
<div class="scan-token">
<a href="reads/foo.html">$FOO</a>
</div>
<div class="scan-conviction conviction-high">8/10</div>
<div class="outcome outcome-pending" data-label="24H">Pending</div>
<div class="outcome outcome-pending" data-label="48H">Pending</div>
</div>
</div>
</body></html>
"#;

const SCANNER_PAGE: &str = r#"<html><body>
<div class="scan-header">Timestamp | Token | Conviction | 24H | 48H</div>

<!-- Scan: $BAR -->
<div class="scan-row">
<div class="timestamp" data-label="Timestamp">2026-02-10 10:00 PST</div>
<div data-label="Token">
<div class="token-name">$BAR</div>
<div class="token-ca">0x222222...2222</div>
</div>
<div data-label="Conviction">
<span class="conviction conviction-low">3/10</span>
</div>
<div class="outcome outcome-pending" data-label="24H">
Pending
</div>
<div class="outcome outcome-pending" data-label="48H">
Pending
</div>
<div data-label="Link">
<a href="reads/bar.html" target="_blank">14minds read →</a>
</div>
</div>

<!-- Scan: $FOO -->
<div class="scan-row">
<div class="timestamp" data-label="Timestamp">2026-02-09 08:00 PST</div>
<div data-label="Token">
<div class="token-name">$FOO</div>
<div class="token-ca">0x111111...1111</div>
</div>
<div data-label="Conviction">
<span class="conviction conviction-high">8/10</span>
</div>
<div class="outcome outcome-pending" data-label="24H">
Pending
</div>
<div class="outcome outcome-pending" data-label="48H">
Pending
</div>
<div data-label="Link">
<a href="reads/foo.html" target="_blank">14minds read →</a>
</div>
</div>
</body></html>
"#;

/// Temp directory holding a scan log and both report pages.
struct Workspace {
    dir: PathBuf,
    store: ScanStore,
    patcher: DocumentPatcher,
}

impl Workspace {
    fn new(records: &[ScanRecord]) -> Self {
        let dir = std::env::temp_dir().join(format!("scan_outcomes_it_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("14minds.html"), INDEX_PAGE).unwrap();
        std::fs::write(dir.join("scanner.html"), SCANNER_PAGE).unwrap();

        let store = ScanStore::new(dir.join("scans.json"));
        if !records.is_empty() {
            store.save(records).unwrap();
        }
        let patcher = DocumentPatcher::new(&DocumentsConfig {
            paths: vec![dir.join("14minds.html"), dir.join("scanner.html")],
            ..DocumentsConfig::default()
        });

        Self { dir, store, patcher }
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.join(name)).unwrap()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    async fn run(
        &self,
        oracle: &MockOracle,
        publisher: Option<&MockPublisher>,
        now: DateTime<Utc>,
    ) -> CycleReport {
        let publisher = publisher.map(|p| p as &dyn SyncPublisher);
        run_cycle(&self.store, oracle, &self.patcher, publisher, now)
            .await
            .unwrap()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 11, 14, 0, 0).unwrap()
}

fn scan(token: &str, ca: &str, conviction: u8, price: Decimal, hours_ago: i64) -> ScanRecord {
    ScanRecord::new(token, ca, conviction, price, now() - Duration::hours(hours_ago)).unwrap()
}

fn raw_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_first_horizon_resolves_end_to_end() {
    let ws = Workspace::new(&[scan("FOO", FOO_CA, 8, dec!(1.00), 30)]);
    let oracle = MockOracle::new().with_price(FOO_CA, dec!(1.10));
    let publisher = MockPublisher::new();

    let report = ws.run(&oracle, Some(&publisher), now()).await;

    assert_eq!(report.resolved_24h, 1);
    assert_eq!(report.resolved_48h, 0);
    assert_eq!(report.publish, PublishStatus::Published);
    assert_eq!(oracle.calls(), vec![FOO_CA.to_string()]);

    let saved = raw_json(ws.store.path());
    assert_eq!(saved[0]["pending24h"], false);
    assert_eq!(saved[0]["outcome24h"], "10.00");
    assert_eq!(saved[0]["pending48h"], true);
    assert!(saved[0].get("outcome48h").is_none());
    assert!(saved[0].get("correct").is_none());

    let index = ws.read("14minds.html");
    assert!(index.contains(
        r#"<div class="outcome outcome-pending" data-label="24H"><span class="outcome-correct">+10.00%</span></div>"#
    ));
    assert_eq!(index.matches(">Pending<").count(), 3);
    assert!(index.contains("—%"));

    let scanner = ws.read("scanner.html");
    assert!(scanner.contains(
        "data-label=\"24H\">\n<span class=\"outcome-correct\">+10.00%</span>\n</div>"
    ));
    assert_eq!(scanner.matches("\nPending\n").count(), 3);

    let pubs = publisher.publications();
    assert_eq!(pubs.len(), 1);
    assert_eq!(
        pubs[0].files,
        vec![ws.store.path().to_path_buf(), ws.path("14minds.html"), ws.path("scanner.html")]
    );
    assert_eq!(pubs[0].message, "Outcome update: 2026-02-11T14:00:00.000Z");
}

#[tokio::test]
async fn test_nothing_due_touches_nothing() {
    let ws = Workspace::new(&[scan("FOO", FOO_CA, 8, dec!(1.00), 5)]);
    let before = std::fs::read(ws.store.path()).unwrap();
    let oracle = MockOracle::new().with_price(FOO_CA, dec!(2));
    let publisher = MockPublisher::new();

    let report = ws.run(&oracle, Some(&publisher), now()).await;

    assert!(!report.changed());
    assert_eq!(report.scans_evaluated, 1);
    assert_eq!(report.publish, PublishStatus::Skipped);
    assert!(oracle.calls().is_empty());
    assert!(publisher.publications().is_empty());
    assert_eq!(std::fs::read(ws.store.path()).unwrap(), before);
    assert_eq!(ws.read("14minds.html"), INDEX_PAGE);
    assert_eq!(ws.read("scanner.html"), SCANNER_PAGE);
}

#[tokio::test]
async fn test_failed_fetch_retried_next_cycle() {
    let ws = Workspace::new(&[scan("FOO", FOO_CA, 8, dec!(2.00), 26)]);
    let before = std::fs::read(ws.store.path()).unwrap();
    let oracle = MockOracle::new();
    let publisher = MockPublisher::new();

    let report = ws.run(&oracle, Some(&publisher), now()).await;

    assert!(!report.changed());
    assert_eq!(report.deferred, 1);
    assert_eq!(std::fs::read(ws.store.path()).unwrap(), before);
    assert_eq!(ws.read("14minds.html"), INDEX_PAGE);
    assert!(publisher.publications().is_empty());

    oracle.set_price(FOO_CA, dec!(1.50));
    let report = ws.run(&oracle, Some(&publisher), now() + Duration::minutes(15)).await;

    assert_eq!(report.resolved_24h, 1);
    let saved = ws.store.load().unwrap();
    assert_eq!(saved[0].outcome_24h, Some(dec!(-25.00)));
    assert!(ws
        .read("14minds.html")
        .contains(r#"<span class="outcome-wrong">-25.00%</span>"#));
    assert_eq!(publisher.publications().len(), 1);
}

#[tokio::test]
async fn test_full_lifecycle_and_accuracy() {
    let ws = Workspace::new(&[
        scan("FOO", FOO_CA, 8, dec!(1.00), 30),
        scan("BAR", BAR_CA, 3, dec!(0.50), 10),
    ]);
    let oracle = MockOracle::new()
        .with_price(FOO_CA, dec!(1.10))
        .with_price(BAR_CA, dec!(0.40));
    let publisher = MockPublisher::new();

    // 30h: FOO 24h only.
    ws.run(&oracle, Some(&publisher), now()).await;

    // 50h: FOO 48h resolves at a new price; BAR (30h) resolves 24h.
    oracle.set_price(FOO_CA, dec!(1.35));
    let report = ws.run(&oracle, Some(&publisher), now() + Duration::hours(20)).await;
    assert_eq!(report.resolved_24h, 1);
    assert_eq!(report.resolved_48h, 1);

    let saved = ws.store.load().unwrap();
    assert_eq!(saved[0].token, "FOO");
    assert_eq!(saved[0].outcome_24h, Some(dec!(10.00)));
    assert_eq!(saved[0].outcome_48h, Some(dec!(35.00)));
    assert_eq!(saved[0].correct, Some(true));
    assert_eq!(saved[1].outcome_24h, Some(dec!(-20.00)));
    assert!(saved[1].pending_48h);
    assert!(saved[1].correct.is_none());

    let index = ws.read("14minds.html");
    assert!(index.contains(r#"<div class="stat-value">100.0%</div>"#));
    assert!(index.contains(r#"<span class="outcome-correct">+35.00%</span>"#));
    assert!(index.contains(r#"<span class="outcome-wrong">-20.00%</span>"#));
    assert_eq!(index.matches(">Pending<").count(), 1);

    // Nothing new due: pages stay byte-identical.
    let index_before = index;
    let scanner_before = ws.read("scanner.html");
    let report = ws.run(&oracle, Some(&publisher), now() + Duration::hours(21)).await;
    assert!(!report.changed());
    assert_eq!(ws.read("14minds.html"), index_before);
    assert_eq!(ws.read("scanner.html"), scanner_before);
    assert_eq!(publisher.publications().len(), 2);
}

#[tokio::test]
async fn test_resolved_outcome_never_rewritten() {
    let ws = Workspace::new(&[scan("FOO", FOO_CA, 8, dec!(1.00), 30)]);
    let oracle = MockOracle::new().with_price(FOO_CA, dec!(1.10));

    ws.run(&oracle, None, now()).await;
    oracle.set_price(FOO_CA, dec!(9.99));
    ws.run(&oracle, None, now() + Duration::hours(1)).await;

    let saved = ws.store.load().unwrap();
    assert_eq!(saved[0].outcome_24h, Some(dec!(10.00)));
    assert_eq!(oracle.calls().len(), 1);
}

#[tokio::test]
async fn test_publish_failure_keeps_local_state() {
    let ws = Workspace::new(&[scan("FOO", FOO_CA, 8, dec!(1.00), 30)]);
    let oracle = MockOracle::new().with_price(FOO_CA, dec!(0.90));
    let publisher = MockPublisher::new();
    publisher.set_error("remote rejected");

    let report = ws.run(&oracle, Some(&publisher), now()).await;

    assert!(matches!(report.publish, PublishStatus::Failed(ref m) if m.contains("remote rejected")));
    assert!(!ws.store.load().unwrap()[0].pending_24h);
    assert!(ws.read("scanner.html").contains("-10.00%"));
}

#[tokio::test]
async fn test_pages_from_failed_publish_go_out_with_next_one() {
    let ws = Workspace::new(&[scan("FOO", FOO_CA, 8, dec!(1.00), 30)]);
    let oracle = MockOracle::new()
        .with_price(FOO_CA, dec!(1.10))
        .with_price(QUX_CA, dec!(2.00));
    let publisher = MockPublisher::new();
    publisher.set_error("push rejected");

    let report = ws.run(&oracle, Some(&publisher), now()).await;
    assert!(matches!(report.publish, PublishStatus::Failed(_)));
    let index_after_failure = ws.read("14minds.html");
    assert!(index_after_failure.contains("+10.00%"));

    // QUX has no row on either page, so the next cycle edits no page.
    ws.store
        .append(scan("QUX", QUX_CA, 5, dec!(1.00), 24))
        .unwrap();
    publisher.clear_error();
    let report = ws.run(&oracle, Some(&publisher), now() + Duration::hours(1)).await;

    assert_eq!(report.resolved_24h, 1);
    assert!(report.pages_updated.is_empty());
    assert_eq!(report.publish, PublishStatus::Published);
    assert_eq!(ws.read("14minds.html"), index_after_failure);

    let pubs = publisher.publications();
    assert_eq!(pubs.len(), 1);
    assert_eq!(
        pubs[0].files,
        vec![ws.store.path().to_path_buf(), ws.path("14minds.html"), ws.path("scanner.html")]
    );
}

#[tokio::test]
async fn test_no_publisher_is_disabled() {
    let ws = Workspace::new(&[scan("FOO", FOO_CA, 8, dec!(1.00), 30)]);
    let oracle = MockOracle::new().with_price(FOO_CA, dec!(1.10));

    let report = ws.run(&oracle, None, now()).await;

    assert!(report.changed());
    assert_eq!(report.publish, PublishStatus::Disabled);
}

#[tokio::test]
async fn test_missing_store_is_empty() {
    let ws = Workspace::new(&[]);
    let oracle = MockOracle::new();

    let report = ws.run(&oracle, None, now()).await;

    assert_eq!(report.scans_total, 0);
    assert_eq!(report.publish, PublishStatus::Skipped);
    assert!(!ws.store.path().exists());
}

#[tokio::test]
async fn test_one_failing_token_does_not_block_others() {
    let ws = Workspace::new(&[
        scan("FOO", FOO_CA, 8, dec!(1.00), 30),
        scan("BAR", BAR_CA, 3, dec!(0.50), 30),
    ]);
    let oracle = MockOracle::new()
        .with_price(FOO_CA, dec!(1.10))
        .with_price(BAR_CA, dec!(0.60));
    oracle.clear_price(FOO_CA);

    let report = ws.run(&oracle, None, now()).await;

    assert_eq!(report.resolved_24h, 1);
    assert_eq!(report.deferred, 1);
    let saved = ws.store.load().unwrap();
    assert!(saved[0].pending_24h);
    assert_eq!(saved[1].outcome_24h, Some(dec!(20.00)));

    let index = ws.read("14minds.html");
    assert!(index.contains(r#"<span class="outcome-correct">+20.00%</span>"#));
    assert_eq!(index.matches(">Pending<").count(), 3);
}
