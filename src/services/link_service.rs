//! Link management service
//!
//! Business operations shared by the HTTP handlers. Every mutation commits to
//! the link store first; the mirror push that follows is best-effort and can
//! never fail the request.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::codegen::CodeGenerator;
use crate::errors::{Result, SheetlinkerError};
use crate::mirror::MirrorSyncEngine;
use crate::storage::{Link, SeaOrmStorage};
use crate::utils::validation::{validate_short_code, validate_url};

/// 生成的短码与并发写入撞车时的重试次数
const CREATE_RACE_RETRIES: usize = 3;

/// Result of [`LinkService::shorten`]
#[derive(Debug, Clone)]
pub struct ShortenResult {
    pub link: Link,
    /// `false` when the URL was already shortened
    pub created: bool,
}

pub struct LinkService {
    storage: Arc<SeaOrmStorage>,
    generator: CodeGenerator,
    engine: Arc<MirrorSyncEngine>,
}

impl LinkService {
    pub fn new(storage: Arc<SeaOrmStorage>, generator: CodeGenerator, engine: Arc<MirrorSyncEngine>) -> Self {
        Self {
            storage,
            generator,
            engine,
        }
    }

    pub fn engine(&self) -> &Arc<MirrorSyncEngine> {
        &self.engine
    }

    /// Find-or-create the link for `url`.
    pub async fn shorten(&self, url: &str) -> Result<ShortenResult> {
        let url = validate_url(url)?;

        if let Some(link) = self.storage.find_by_url(&url).await? {
            debug!("URL already shortened as {}", link.short_code);
            return Ok(ShortenResult { link, created: false });
        }

        let mut last_conflict = None;
        for _ in 0..CREATE_RACE_RETRIES {
            let code = self.generator.ensure_unique(&*self.storage).await?;
            match self.storage.create(&code, &url).await {
                Ok(link) => {
                    self.engine.push_best_effort(&link).await;
                    return Ok(ShortenResult { link, created: true });
                }
                Err(SheetlinkerError::Conflict(reason)) => {
                    // 并发请求抢先写入了同一个 URL
                    if let Some(link) = self.storage.find_by_url(&url).await? {
                        return Ok(ShortenResult { link, created: false });
                    }
                    debug!("Create lost a race on code {}: {}", code, reason);
                    last_conflict = Some(reason);
                }
                Err(e) => return Err(e),
            }
        }

        Err(SheetlinkerError::conflict(
            last_conflict.unwrap_or_else(|| "could not allocate a short code".to_string()),
        ))
    }

    /// Count a visit and return the link to redirect to.
    ///
    /// The mirror push runs detached so the redirect is never held up by it.
    pub async fn visit(&self, code: &str) -> Result<Link> {
        let link = self
            .storage
            .record_visit(code)
            .await?
            .ok_or_else(|| SheetlinkerError::not_found(format!("Link '{}' not found", code)))?;

        if self.engine.is_configured() {
            let engine = self.engine.clone();
            let pushed = link.clone();
            tokio::spawn(async move {
                engine.push_best_effort(&pushed).await;
            });
        }

        Ok(link)
    }

    /// Replace the code and URL of `old_code`. Clicks start over at zero.
    pub async fn rename(&self, old_code: &str, new_code: &str, new_url: &str) -> Result<Link> {
        let new_code = validate_short_code(new_code)?;
        let new_url = validate_url(new_url)?;

        let link = self.storage.rename(old_code, &new_code, &new_url).await?;
        // 旧短码的行找不到，会触发整表重建
        self.engine.push_best_effort(&link).await;
        Ok(link)
    }

    pub async fn get(&self, code: &str) -> Result<Option<Link>> {
        self.storage.get(code).await
    }

    pub async fn list(&self) -> Result<Vec<Link>> {
        self.storage.list_all().await
    }

    /// Remove every link, then rebuild the mirror down to its header.
    pub async fn clear(&self) -> Result<u64> {
        let removed = self.storage.clear_all().await?;
        info!("Removed {} links", removed);

        if self.engine.is_configured()
            && let Err(e) = self.engine.full_resync().await
        {
            warn!("Mirror resync after clear failed, deferring to reconcile: {}", e);
        }
        Ok(removed)
    }

    /// Operator-triggered full resync.
    pub async fn sync_now(&self) -> Result<usize> {
        self.engine.full_resync().await
    }
}
