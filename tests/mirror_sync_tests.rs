//! Mirror sync engine tests
//!
//! Uses the in-process MemorySheet so failure and drift can be staged.

use std::sync::Arc;

use sheetlinker::errors::SheetlinkerError;
use sheetlinker::mirror::{
    DisabledSheet, HEADER, MemorySheet, MirrorSyncEngine, PushOutcome, SheetMirror, run_once,
};
use sheetlinker::storage::{MirrorRow, RetryConfig, SeaOrmStorage};
use tempfile::TempDir;

struct Fixture {
    storage: Arc<SeaOrmStorage>,
    sheet: Arc<MemorySheet>,
    engine: MirrorSyncEngine,
    _dir: TempDir,
}

async fn fixture() -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("mirror.db").display());
    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite", 5, RetryConfig::default())
            .await
            .expect("Failed to create storage"),
    );
    let sheet = Arc::new(MemorySheet::new());
    let engine = MirrorSyncEngine::new(storage.clone(), sheet.clone());
    Fixture {
        storage,
        sheet,
        engine,
        _dir: dir,
    }
}

fn header() -> Vec<String> {
    HEADER.iter().map(|h| h.to_string()).collect()
}

/// Mirror rows must equal the store listing exactly, header first.
async fn assert_mirror_matches_store(f: &Fixture) {
    let rows = f.sheet.rows();
    assert_eq!(rows.first(), Some(&header()));

    let expected: Vec<MirrorRow> = f
        .storage
        .list_all()
        .await
        .unwrap()
        .iter()
        .map(|l| l.mirror_row())
        .collect();
    assert_eq!(f.sheet.data_rows(), expected);
    assert_eq!(rows.len(), expected.len() + 1);
}

#[tokio::test]
async fn test_bootstrap_writes_header_on_empty_sheet() {
    let f = fixture().await;
    assert!(f.engine.bootstrap().await.unwrap());
    assert_eq!(f.sheet.rows(), vec![header()]);
}

#[tokio::test]
async fn test_bootstrap_keeps_valid_header() {
    let f = fixture().await;
    f.sheet.append_header().await.unwrap();
    f.sheet.push_raw(&["abc", "https://a.example", "3"]);

    assert!(!f.engine.bootstrap().await.unwrap());
    assert_eq!(f.sheet.rows().len(), 2);
}

#[tokio::test]
async fn test_bootstrap_resets_malformed_header() {
    let f = fixture().await;
    f.sheet.push_raw(&["code", "url"]);
    f.sheet.push_raw(&["abc", "https://a.example", "3"]);

    assert!(f.engine.bootstrap().await.unwrap());
    assert_eq!(f.sheet.rows(), vec![header()]);
}

#[tokio::test]
async fn test_push_one_updates_existing_row_in_place() {
    let f = fixture().await;
    f.storage.create("a", "https://a.example").await.unwrap();
    f.storage.create("b", "https://b.example").await.unwrap();
    f.engine.full_resync().await.unwrap();

    let link = f.storage.record_visit("a").await.unwrap().unwrap();
    let outcome = f.engine.push_link(&link).await.unwrap();

    // 列表顺序为 b, a，所以 a 在第 3 行
    assert_eq!(outcome, PushOutcome::Updated { row: 3 });
    assert_mirror_matches_store(&f).await;
}

#[tokio::test]
async fn test_push_one_missing_row_triggers_resync() {
    let f = fixture().await;
    f.engine.bootstrap().await.unwrap();
    let link = f.storage.create("a", "https://a.example").await.unwrap();
    f.storage.create("b", "https://b.example").await.unwrap();

    let outcome = f.engine.push_link(&link).await.unwrap();
    assert_eq!(outcome, PushOutcome::Resynced { rows: 2 });
    assert_mirror_matches_store(&f).await;
}

#[tokio::test]
async fn test_push_one_duplicate_rows_trigger_resync() {
    let f = fixture().await;
    let link = f.storage.create("a", "https://a.example").await.unwrap();
    f.sheet.append_header().await.unwrap();
    f.sheet.push_raw(&["a", "https://a.example", "0"]);
    f.sheet.push_raw(&["a", "https://stale.example", "9"]);

    let outcome = f.engine.push_link(&link).await.unwrap();
    assert_eq!(outcome, PushOutcome::Resynced { rows: 1 });
    assert_mirror_matches_store(&f).await;
}

#[tokio::test]
async fn test_push_one_lookup_failure_falls_back_to_resync() {
    let f = fixture().await;
    let link = f.storage.create("a", "https://a.example").await.unwrap();
    f.engine.full_resync().await.unwrap();
    f.sheet.push_raw(&["ghost", "https://ghost.example", "1"]);

    // 第一次查找失败，随后的整表重建成功
    f.sheet.fail_next(1);
    let outcome = f.engine.push_link(&link).await.unwrap();
    assert_eq!(outcome, PushOutcome::Resynced { rows: 1 });
    assert_mirror_matches_store(&f).await;
}

#[tokio::test]
async fn test_unreachable_mirror_reports_error_and_keeps_local_state() {
    let f = fixture().await;
    f.storage.create("a", "https://a.example").await.unwrap();
    f.engine.full_resync().await.unwrap();

    f.sheet.set_offline(true);
    let link = f.storage.record_visit("a").await.unwrap().unwrap();
    let err = f.engine.push_link(&link).await.unwrap_err();
    assert!(err.is_mirror());
    assert!(f.engine.push_best_effort(&link).await.is_none());

    // 本地计数已持久化
    assert_eq!(f.storage.get("a").await.unwrap().unwrap().clicks, 1);
    assert_eq!(f.sheet.data_rows(), vec![MirrorRow::new("a", "https://a.example", 0)]);

    // 镜像恢复后下一轮对账收敛
    f.sheet.set_offline(false);
    let report = run_once(&f.engine).await;
    assert_eq!(report.failed, 0);
    assert_mirror_matches_store(&f).await;
}

#[tokio::test]
async fn test_partial_resync_is_repaired_next_time() {
    let f = fixture().await;
    for (code, url) in [("a", "https://a.example"), ("b", "https://b.example"), ("c", "https://c.example")] {
        f.storage.create(code, url).await.unwrap();
    }
    f.engine.full_resync().await.unwrap();

    // 模拟上一次重建写到一半就断开
    let link = f.storage.record_visit("a").await.unwrap().unwrap();
    f.sheet.clear().await.unwrap();
    f.sheet.append_header().await.unwrap();
    f.sheet.push_raw(&["c", "https://c.example", "0"]);

    let outcome = f.engine.push_link(&link).await.unwrap();
    assert_eq!(outcome, PushOutcome::Resynced { rows: 3 });
    assert_mirror_matches_store(&f).await;
}

#[tokio::test]
async fn test_clear_then_resync_leaves_header_only() {
    let f = fixture().await;
    f.storage.create("a", "https://a.example").await.unwrap();
    f.storage.create("b", "https://b.example").await.unwrap();
    f.engine.full_resync().await.unwrap();

    f.storage.clear_all().await.unwrap();
    assert!(f.storage.list_all().await.unwrap().is_empty());

    assert_eq!(f.engine.full_resync().await.unwrap(), 0);
    assert_eq!(f.sheet.rows(), vec![header()]);

    // push_one 对不存在的行同样回落到重建，结果只剩表头
    let outcome = f.engine.push_one("a", "https://a.example", 0).await.unwrap();
    assert_eq!(outcome, PushOutcome::Resynced { rows: 0 });
    assert_eq!(f.sheet.rows(), vec![header()]);
}

#[tokio::test]
async fn test_full_resync_failure_is_returned_as_value() {
    let f = fixture().await;
    f.storage.create("a", "https://a.example").await.unwrap();
    f.sheet.set_offline(true);

    assert!(matches!(
        f.engine.full_resync().await,
        Err(SheetlinkerError::MirrorUnavailable(_))
    ));
}

#[tokio::test]
async fn test_disabled_mirror_is_skipped() {
    let f = fixture().await;
    let engine = MirrorSyncEngine::new(f.storage.clone(), Arc::new(DisabledSheet));
    let link = f.storage.create("a", "https://a.example").await.unwrap();

    assert!(!engine.is_configured());
    assert!(!engine.bootstrap().await.unwrap());
    assert!(engine.push_best_effort(&link).await.is_none());
    assert!(matches!(
        engine.full_resync().await,
        Err(SheetlinkerError::MirrorConfig(_))
    ));
    assert_eq!(run_once(&engine).await.links, 0);
}

#[tokio::test]
async fn test_concurrent_pushes_converge() {
    let f = fixture().await;
    let f = Arc::new(f);
    for i in 0..5 {
        f.storage
            .create(&format!("c{}", i), &format!("https://{}.example", i))
            .await
            .unwrap();
    }

    let tasks: Vec<_> = (0..5)
        .map(|i| {
            let f = f.clone();
            tokio::spawn(async move {
                let link = f.storage.record_visit(&format!("c{}", i)).await.unwrap().unwrap();
                f.engine.push_link(&link).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // 并发写之后再跑一轮对账
    run_once(&f.engine).await;
    assert_mirror_matches_store(&f).await;
}
