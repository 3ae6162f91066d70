use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use tracing::{debug, error, trace};

use crate::errors::SheetlinkerError;
use crate::services::LinkService;
use crate::utils::is_valid_short_code;

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        path: web::Path<String>,
        service: web::Data<Arc<LinkService>>,
    ) -> HttpResponse {
        let code = path.into_inner();

        if !is_valid_short_code(&code) {
            // 非法短码直接 404，不查库
            trace!("Invalid short code rejected: {}", code);
            return Self::not_found_response();
        }

        match service.visit(&code).await {
            Ok(link) => {
                debug!("Redirect {} -> {} (clicks={})", code, link.original_url, link.clicks);
                HttpResponse::TemporaryRedirect()
                    .insert_header(("Location", link.original_url))
                    .finish()
            }
            Err(SheetlinkerError::NotFound(_)) => {
                debug!("Redirect link not found: {}", code);
                Self::not_found_response()
            }
            Err(e) => {
                error!("Redirect lookup for {} failed: {}", code, e);
                Self::error_response()
            }
        }
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body("Not Found")
    }

    #[inline]
    fn error_response() -> HttpResponse {
        HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
            .insert_header(("Content-Type", "text/html; charset=utf-8"))
            .body("Internal Server Error")
    }
}

pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{code}", web::get().to(RedirectService::handle_redirect))
        .route("/{code}", web::head().to(RedirectService::handle_redirect))
}
