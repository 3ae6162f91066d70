use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::codegen::CodeGenerator;
use crate::config::StaticConfig;
use crate::mirror::{MirrorSyncEngine, ReconcileConfig, ReconcilerHandle, build_mirror, spawn_reconciler};
use crate::services::LinkService;
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub engine: Arc<MirrorSyncEngine>,
    pub link_service: Arc<LinkService>,
    pub reconciler: Option<ReconcilerHandle>,
}

/// 准备服务器启动的上下文：存储、镜像表、同步引擎和后台对账任务
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!(
        "Using storage backend: {} ({} links)",
        storage.backend_name(),
        storage.count().await.context("Failed to count links")?
    );

    let mirror = build_mirror(&config.mirror);
    let engine = Arc::new(MirrorSyncEngine::new(storage.clone(), mirror));

    // 表头检查必须先于其他镜像操作
    let reconciler = if engine.is_configured() {
        match engine.bootstrap().await {
            Ok(true) => info!("Mirror header written"),
            Ok(false) => debug!("Mirror header OK"),
            Err(e) => warn!("Mirror bootstrap failed, reconcile will retry: {}", e),
        }
        Some(spawn_reconciler(
            engine.clone(),
            ReconcileConfig::from(&config.mirror),
        ))
    } else {
        None
    };

    let link_service = Arc::new(LinkService::new(
        storage.clone(),
        CodeGenerator::from(&config.links),
        engine.clone(),
    ));

    debug!("Pre-startup finished in {:?}", start_time.elapsed());
    Ok(StartupContext {
        storage,
        engine,
        link_service,
        reconciler,
    })
}
