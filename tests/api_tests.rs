//! HTTP API integration tests

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::{Value, json};

use sheetlinker::api;
use sheetlinker::api::types::BaseUrl;
use sheetlinker::codegen::CodeGenerator;
use sheetlinker::mirror::{DisabledSheet, MemorySheet, MirrorSyncEngine, SheetMirror};
use sheetlinker::services::LinkService;
use sheetlinker::storage::{RetryConfig, SeaOrmStorage};
use tempfile::TempDir;

const BASE: &str = "http://sl.test";

async fn create_service(mirror: Arc<dyn SheetMirror>) -> (Arc<LinkService>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite", 5, RetryConfig::default())
            .await
            .expect("Failed to create storage"),
    );
    let engine = Arc::new(MirrorSyncEngine::new(storage.clone(), mirror));
    (
        Arc::new(LinkService::new(storage, CodeGenerator::default(), engine)),
        dir,
    )
}

macro_rules! init_app {
    ($service:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($service.clone()))
                .app_data(web::Data::new(BaseUrl(BASE.to_string())))
                .configure(api::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_shorten_then_redirect() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;
    let app = init_app!(service);

    let req = TestRequest::post()
        .uri("/api/links")
        .set_json(json!({ "url": "https://example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    let code = body["data"]["short_code"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["short_url"], format!("{}/{}", BASE, code));
    assert_eq!(body["data"]["clicks"], 0);

    // 同一 URL 再次提交返回 200 和相同短码
    let req = TestRequest::post()
        .uri("/api/links")
        .set_json(json!({ "url": "https://example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["short_code"], code.as_str());

    let req = TestRequest::get().uri(&format!("/{}", code)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers().get("Location").unwrap(), "https://example.com");

    let link = service.get(&code).await.unwrap().unwrap();
    assert_eq!(link.clicks, 1);
}

#[actix_web::test]
async fn test_redirect_unknown_code() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;
    let app = init_app!(service);

    let req = TestRequest::get().uri("/missing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::default()
        .method(actix_web::http::Method::HEAD)
        .uri("/missing")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_shorten_invalid_url_is_bad_request() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;
    let app = init_app!(service);

    let req = TestRequest::post()
        .uri("/api/links")
        .set_json(json!({ "url": "javascript:alert(1)" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3002);
    assert!(body.get("data").is_none());
}

#[actix_web::test]
async fn test_list_rename_and_clear() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;
    let a = service.shorten("https://a.example").await.unwrap().link;
    let b = service.shorten("https://b.example").await.unwrap().link;
    let app = init_app!(service);

    let req = TestRequest::get().uri("/api/links").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let codes: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["short_code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, [b.short_code.as_str(), a.short_code.as_str()]);

    let req = TestRequest::put()
        .uri(&format!("/api/links/{}", a.short_code))
        .set_json(json!({ "short_code": "ex1", "original_url": "https://example.org" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["short_code"], "ex1");
    assert_eq!(body["data"]["clicks"], 0);

    let req = TestRequest::put()
        .uri("/api/links/ex1")
        .set_json(json!({ "short_code": b.short_code, "original_url": "https://c.example" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = TestRequest::put()
        .uri("/api/links/nope")
        .set_json(json!({ "short_code": "x", "original_url": "https://x.example" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::delete().uri("/api/links").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["removed"], 2);
    assert!(service.list().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_manual_sync() {
    let sheet = Arc::new(MemorySheet::new());
    let (service, _dir) = create_service(sheet.clone()).await;
    service.shorten("https://a.example").await.unwrap();
    let app = init_app!(service);

    let req = TestRequest::post().uri("/api/sync").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["rows"], 1);

    sheet.set_offline(true);
    let req = TestRequest::post().uri("/api/sync").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_manual_sync_without_mirror() {
    let (service, _dir) = create_service(Arc::new(DisabledSheet)).await;
    let app = init_app!(service);

    let req = TestRequest::post().uri("/api/sync").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 6001);
}

#[actix_web::test]
async fn test_redirect_survives_mirror_outage() {
    let sheet = Arc::new(MemorySheet::new());
    let (service, _dir) = create_service(sheet.clone()).await;
    let link = service.shorten("https://example.com").await.unwrap().link;
    sheet.set_offline(true);
    let app = init_app!(service);

    let req = TestRequest::get().uri(&format!("/{}", link.short_code)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(service.get(&link.short_code).await.unwrap().unwrap().clicks, 1);
}
