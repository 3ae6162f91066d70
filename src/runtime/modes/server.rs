//! Server mode
//!
//! Wires the startup context into an actix-web server and tears the
//! background tasks down once the server stops.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api;
use crate::api::types::BaseUrl;
use crate::config::get_config;
use crate::runtime::lifetime;

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let config = get_config();

    let startup = lifetime::startup::prepare_server_startup(&config)
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {:#}", e))?;

    let link_service = startup.link_service.clone();
    let base_url = BaseUrl(config.server.base_url.trim_end_matches('/').to_string());
    let db_for_shutdown = startup.storage.get_db().clone();

    if !startup.engine.is_configured() {
        warn!("Running without a spreadsheet mirror");
    }

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store, must-revalidate")))
            .app_data(web::Data::new(link_service.clone()))
            .app_data(web::Data::new(base_url.clone()))
            .app_data(web::PayloadConfig::new(64 * 1024))
            .configure(api::configure)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!("Starting server at http://{}", bind_address);
    // actix 自行处理 Ctrl+C
    server.run().await.context("HTTP server error")?;

    info!("Server stopped, shutting down background tasks...");
    lifetime::shutdown::perform_shutdown(startup.reconciler, db_for_shutdown).await;
    Ok(())
}
