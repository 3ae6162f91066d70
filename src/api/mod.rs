//! HTTP layer
//!
//! - `/api/links`: list, shorten, rename, clear
//! - `/api/sync`: operator-triggered full resync
//! - `/{code}`: visit + redirect

pub mod error_code;
pub mod helpers;
pub mod links;
pub mod redirect;
pub mod types;

use actix_web::web;

pub use error_code::ErrorCode;
pub use links::api_routes;
pub use redirect::redirect_routes;

/// Register every route. The `/api` scope must come before the catch-all
/// redirect route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_routes()).service(redirect_routes());
}
