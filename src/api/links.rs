//! 链接管理接口 `/api`

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use tracing::{info, trace, warn};

use crate::services::LinkService;

use super::helpers::{api_result, error_from_sheetlinker, success_response};
use super::types::{BaseUrl, ClearResponse, LinkResponse, RenameRequest, ShortenRequest, SyncResponse};

/// 获取所有链接（最新在前）
pub async fn list_links(service: web::Data<Arc<LinkService>>, base: web::Data<BaseUrl>) -> HttpResponse {
    trace!("API: list links");
    api_result(service.list().await.map(|links| {
        links
            .into_iter()
            .map(|link| LinkResponse::new(link, &base.0))
            .collect::<Vec<_>>()
    }))
}

/// 创建短链接，同一 URL 返回已有链接
pub async fn shorten(
    service: web::Data<Arc<LinkService>>,
    base: web::Data<BaseUrl>,
    body: web::Json<ShortenRequest>,
) -> HttpResponse {
    match service.shorten(&body.url).await {
        Ok(result) => {
            let status = if result.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            success_response(status, LinkResponse::new(result.link, &base.0))
        }
        Err(e) => {
            info!("API: shorten rejected: {}", e);
            error_from_sheetlinker(&e)
        }
    }
}

/// 修改短码与目标地址（点击数归零）
pub async fn rename(
    service: web::Data<Arc<LinkService>>,
    base: web::Data<BaseUrl>,
    path: web::Path<String>,
    body: web::Json<RenameRequest>,
) -> HttpResponse {
    let old_code = path.into_inner();
    let body = body.into_inner();
    api_result(
        service
            .rename(&old_code, &body.short_code, &body.original_url)
            .await
            .map(|link| LinkResponse::new(link, &base.0)),
    )
}

/// 清空所有链接
pub async fn clear_links(service: web::Data<Arc<LinkService>>) -> HttpResponse {
    warn!("API: clearing all links");
    api_result(service.clear().await.map(|removed| ClearResponse { removed }))
}

/// 手动触发整表重建
pub async fn sync_mirror(service: web::Data<Arc<LinkService>>) -> HttpResponse {
    api_result(service.sync_now().await.map(|rows| SyncResponse { rows }))
}

pub fn api_routes() -> actix_web::Scope {
    web::scope("/api")
        .route("/links", web::get().to(list_links))
        .route("/links", web::post().to(shorten))
        .route("/links", web::delete().to(clear_links))
        .route("/links/{code}", web::put().to(rename))
        .route("/sync", web::post().to(sync_mirror))
}
