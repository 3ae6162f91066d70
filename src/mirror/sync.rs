//! Mirror sync engine
//!
//! Pushes link store state into the sheet. A push first tries to update the
//! single row holding the code; any other situation (no row, duplicate rows,
//! lookup or write failure) falls back to rebuilding the whole sheet from the
//! store, which is always the source of truth.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{SheetMirror, is_header};
use crate::errors::{Result, SheetlinkerError};
use crate::storage::{Link, MirrorRow, SeaOrmStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The existing row was overwritten in place.
    Updated { row: usize },
    /// The sheet was rebuilt with `rows` data rows.
    Resynced { rows: usize },
}

pub struct MirrorSyncEngine {
    storage: Arc<SeaOrmStorage>,
    mirror: Arc<dyn SheetMirror>,
    // 同进程内的写操作串行化，避免 resync 的 clear/append 被穿插
    write_lock: Mutex<()>,
    // 表头确认之前，推送会先补做 bootstrap
    header_ok: AtomicBool,
}

impl MirrorSyncEngine {
    pub fn new(storage: Arc<SeaOrmStorage>, mirror: Arc<dyn SheetMirror>) -> Self {
        Self {
            storage,
            mirror,
            write_lock: Mutex::new(()),
            header_ok: AtomicBool::new(false),
        }
    }

    pub fn storage(&self) -> &Arc<SeaOrmStorage> {
        &self.storage
    }

    pub fn mirror(&self) -> &Arc<dyn SheetMirror> {
        &self.mirror
    }

    pub fn is_configured(&self) -> bool {
        self.mirror.is_configured()
    }

    /// Whether row 1 has been confirmed as the header since startup.
    pub fn header_verified(&self) -> bool {
        self.header_ok.load(Ordering::Acquire)
    }

    /// Make sure row 1 is the header. Returns `true` when the sheet had to be
    /// reset.
    ///
    /// Until one bootstrap succeeds, every push repeats it before touching
    /// any data row.
    pub async fn bootstrap(&self) -> Result<bool> {
        if !self.is_configured() {
            return Ok(false);
        }

        let _guard = self.write_lock.lock().await;
        self.bootstrap_locked().await
    }

    async fn bootstrap_locked(&self) -> Result<bool> {
        let first = self.mirror.row_values(1).await?;
        if is_header(&first) {
            debug!("Mirror header present on {}", self.mirror.name());
            self.header_ok.store(true, Ordering::Release);
            return Ok(false);
        }

        info!("Mirror header missing or malformed, resetting {}", self.mirror.name());
        self.mirror.clear().await?;
        self.mirror.append_header().await?;
        self.header_ok.store(true, Ordering::Release);
        Ok(true)
    }

    /// Propagate one link's current values.
    pub async fn push_one(&self, code: &str, url: &str, clicks: u64) -> Result<PushOutcome> {
        if !self.is_configured() {
            return Err(SheetlinkerError::mirror_config("spreadsheet mirror is not configured"));
        }

        let values = MirrorRow::new(code, url, clicks);
        let _guard = self.write_lock.lock().await;

        if !self.header_verified() {
            self.bootstrap_locked().await?;
        }

        match self.try_update(&values).await {
            Ok(Some(row)) => {
                debug!("Mirror row {} updated for {}", row, code);
                return Ok(PushOutcome::Updated { row });
            }
            Ok(None) => {}
            Err(e) => warn!("Mirror update for '{}' failed: {}", code, e),
        }

        let rows = self.resync_locked().await?;
        Ok(PushOutcome::Resynced { rows })
    }

    pub async fn push_link(&self, link: &Link) -> Result<PushOutcome> {
        self.push_one(&link.short_code, &link.original_url, link.clicks).await
    }

    /// Push `link`, logging instead of returning any failure. The next
    /// reconcile tick picks up whatever this misses.
    pub async fn push_best_effort(&self, link: &Link) -> Option<PushOutcome> {
        if !self.is_configured() {
            return None;
        }
        match self.push_link(link).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(
                    "Best-effort mirror push for '{}' failed, deferring to reconcile: {}",
                    link.short_code, e
                );
                None
            }
        }
    }

    /// Rebuild the sheet from the store. Returns the number of data rows.
    pub async fn full_resync(&self) -> Result<usize> {
        if !self.is_configured() {
            return Err(SheetlinkerError::mirror_config("spreadsheet mirror is not configured"));
        }
        let _guard = self.write_lock.lock().await;
        self.resync_locked().await
    }

    /// `Ok(None)` means "no single row to update", which calls for a resync.
    async fn try_update(&self, values: &MirrorRow) -> Result<Option<usize>> {
        let rows = self.mirror.find_rows(&values.short_code).await?;
        match rows.as_slice() {
            [row] => {
                self.mirror.update_row(*row, values).await?;
                Ok(Some(*row))
            }
            [] => Ok(None),
            many => {
                warn!(
                    "Short code '{}' appears in {} mirror rows",
                    values.short_code,
                    many.len()
                );
                Ok(None)
            }
        }
    }

    async fn resync_locked(&self) -> Result<usize> {
        let links = self.storage.list_all().await?;

        self.mirror.clear().await?;
        self.mirror.append_header().await?;
        self.header_ok.store(true, Ordering::Release);
        for link in &links {
            self.mirror.append_row(&link.mirror_row()).await?;
        }

        info!(
            "Mirror {} resynced with {} rows",
            self.mirror.name(),
            links.len()
        );
        Ok(links.len())
    }
}
