//! LinkService tests
//!
//! Business flows over a temporary SQLite store and an in-process sheet.

use std::sync::Arc;
use std::time::Duration;

use sheetlinker::codegen::CodeGenerator;
use sheetlinker::errors::SheetlinkerError;
use sheetlinker::mirror::{DisabledSheet, HEADER, MemorySheet, MirrorSyncEngine, SheetMirror};
use sheetlinker::services::LinkService;
use sheetlinker::storage::{MirrorRow, RetryConfig, SeaOrmStorage};
use tempfile::TempDir;

async fn create_service(mirror: Arc<dyn SheetMirror>) -> (LinkService, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("service.db").display());
    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite", 5, RetryConfig::default())
            .await
            .expect("Failed to create storage"),
    );
    let engine = Arc::new(MirrorSyncEngine::new(storage.clone(), mirror));
    (
        LinkService::new(storage, CodeGenerator::default(), engine),
        dir,
    )
}

#[tokio::test]
async fn test_shorten_creates_six_char_code() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;

    let result = service.shorten("https://example.com").await.unwrap();
    assert!(result.created);
    assert_eq!(result.link.clicks, 0);
    assert_eq!(result.link.short_code.len(), 6);
    assert!(result.link.short_code.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn test_shorten_same_url_returns_existing_link() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;

    let first = service.shorten("https://example.com").await.unwrap();
    service.visit(&first.link.short_code).await.unwrap();

    // 首尾空白被去掉后视为同一 URL
    let second = service.shorten("  https://example.com ").await.unwrap();
    assert!(!second.created);
    assert_eq!(second.link.short_code, first.link.short_code);
    assert_eq!(second.link.clicks, 1);
    assert_eq!(service.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_shorten_rejects_invalid_urls() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;

    for url in ["", "javascript:alert(1)", "ftp://example.com", "not a url"] {
        assert!(
            matches!(service.shorten(url).await, Err(SheetlinkerError::Validation(_))),
            "{:?} should be rejected",
            url
        );
    }
    assert!(service.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_visit_rename_scenario() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;

    let created = service.shorten("https://example.com").await.unwrap().link;
    let code = created.short_code.clone();

    service.visit(&code).await.unwrap();
    let visited = service.visit(&code).await.unwrap();
    assert_eq!(visited.clicks, 2);

    let renamed = service.rename(&code, "ex1", "https://example.org").await.unwrap();
    assert_eq!(renamed.clicks, 0);

    assert!(matches!(
        service.visit(&code).await,
        Err(SheetlinkerError::NotFound(_))
    ));
    assert_eq!(service.visit("ex1").await.unwrap().clicks, 1);
}

#[tokio::test]
async fn test_rename_validation_and_conflicts() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;
    let a = service.shorten("https://a.example").await.unwrap().link;
    let b = service.shorten("https://b.example").await.unwrap().link;

    assert!(matches!(
        service.rename(&a.short_code, "bad code", "https://c.example").await,
        Err(SheetlinkerError::Validation(_))
    ));
    assert!(matches!(
        service.rename(&a.short_code, "c1", "mailto:x@y.z").await,
        Err(SheetlinkerError::Validation(_))
    ));
    assert!(matches!(
        service.rename(&a.short_code, &b.short_code, "https://c.example").await,
        Err(SheetlinkerError::Conflict(_))
    ));
    assert!(matches!(
        service.rename("missing", "c1", "https://c.example").await,
        Err(SheetlinkerError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_mutations_push_to_mirror() {
    let sheet = Arc::new(MemorySheet::new());
    let (service, _dir) = create_service(sheet.clone()).await;
    service.engine().bootstrap().await.unwrap();

    let link = service.shorten("https://example.com").await.unwrap().link;
    assert_eq!(
        sheet.data_rows(),
        vec![MirrorRow::new(&link.short_code, "https://example.com", 0)]
    );

    let renamed = service.rename(&link.short_code, "ex1", "https://example.org").await.unwrap();
    assert_eq!(
        sheet.data_rows(),
        vec![MirrorRow::new("ex1", "https://example.org", 0)]
    );

    // 访问后的推送在后台进行
    service.visit(&renamed.short_code).await.unwrap();
    let expected = vec![MirrorRow::new("ex1", "https://example.org", 1)];
    let mut converged = false;
    for _ in 0..100 {
        if sheet.data_rows() == expected {
            converged = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(converged);
}

#[tokio::test]
async fn test_mirror_outage_never_fails_mutations() {
    let sheet = Arc::new(MemorySheet::new());
    let (service, _dir) = create_service(sheet.clone()).await;
    sheet.set_offline(true);

    let link = service.shorten("https://example.com").await.unwrap().link;
    assert_eq!(service.visit(&link.short_code).await.unwrap().clicks, 1);
    service.rename(&link.short_code, "ex1", "https://example.org").await.unwrap();
    assert_eq!(service.clear().await.unwrap(), 1);

    assert!(service.sync_now().await.is_err());
    sheet.set_offline(false);
    assert_eq!(service.sync_now().await.unwrap(), 0);
}

#[tokio::test]
async fn test_clear_leaves_header_only() {
    let sheet = Arc::new(MemorySheet::new());
    let (service, _dir) = create_service(sheet.clone()).await;
    service.shorten("https://a.example").await.unwrap();
    service.shorten("https://b.example").await.unwrap();

    assert_eq!(service.clear().await.unwrap(), 2);
    assert!(service.list().await.unwrap().is_empty());
    assert_eq!(sheet.rows(), vec![HEADER.map(String::from).to_vec()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_shortens_of_distinct_urls() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;
    let service = Arc::new(service);

    for round in 0..5 {
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .shorten(&format!("https://r{}-{}.example", round, i))
                        .await
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap().created);
        }
    }

    assert_eq!(service.list().await.unwrap().len(), 80);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_shortens_of_one_url_share_a_link() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;
    let service = Arc::new(service);

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.shorten("https://example.com/popular").await })
        })
        .collect();

    let mut codes = Vec::new();
    for task in tasks {
        codes.push(task.await.unwrap().unwrap().link.short_code);
    }
    codes.dedup();
    assert_eq!(codes.len(), 1);

    let links = service.list().await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].short_code, codes[0]);
}
