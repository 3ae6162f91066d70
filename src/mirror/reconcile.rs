//! Periodic reconciliation
//!
//! A background task that re-pushes every link on a fixed interval, so any
//! push missed on the foreground path converges within one period.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{MirrorSyncEngine, PushOutcome, is_header};
use crate::config::MirrorConfig;

#[derive(Debug, Clone, Copy)]
pub struct ReconcileConfig {
    pub interval: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

impl From<&MirrorConfig> for ReconcileConfig {
    fn from(config: &MirrorConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.sync_interval_secs.max(1)),
        }
    }
}

/// Counters for one reconcile pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub links: usize,
    pub updated: usize,
    pub resynced: usize,
    pub failed: usize,
}

/// Owner-side handle of the reconcile task.
pub struct ReconcilerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ReconcilerHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel the task and wait for it to stop.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!("Reconcile task ended abnormally: {}", e);
        }
    }
}

pub fn spawn_reconciler(engine: Arc<MirrorSyncEngine>, config: ReconcileConfig) -> ReconcilerHandle {
    let cancel = CancellationToken::new();
    let task = tokio::spawn(reconcile_loop(engine, config, cancel.clone()));
    ReconcilerHandle { cancel, task }
}

async fn reconcile_loop(engine: Arc<MirrorSyncEngine>, config: ReconcileConfig, cancel: CancellationToken) {
    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        interval_secs = config.interval.as_secs(),
        mirror = engine.mirror().name(),
        "Mirror reconcile task started"
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Mirror reconcile task shutting down");
                break;
            }
            _ = ticker.tick() => {
                // 单次迭代放进独立任务，panic 不会终止循环
                let engine = engine.clone();
                let mut pass = tokio::spawn(async move { run_once(&engine).await });
                tokio::select! {
                    _ = cancel.cancelled() => {
                        // 慢速镜像不能拖住关闭流程
                        pass.abort();
                        info!("Mirror reconcile task shutting down, current pass aborted");
                        break;
                    }
                    joined = &mut pass => match joined {
                        Ok(report) => debug!(?report, "Reconcile tick finished"),
                        Err(e) => error!("Reconcile tick panicked: {}", e),
                    },
                }
            }
        }
    }
}

/// One reconcile pass over every link.
///
/// A resync rewrites the whole sheet from a fresh listing, so the rest of the
/// pass is skipped once one succeeds. A failed push ends the pass too: the
/// push already attempted a resync and the next tick will try again.
pub async fn run_once(engine: &MirrorSyncEngine) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    if !engine.is_configured() {
        return report;
    }

    let links = match engine.storage().list_all().await {
        Ok(links) => links,
        Err(e) => {
            warn!("Reconcile could not list links: {}", e);
            report.failed += 1;
            return report;
        }
    };
    report.links = links.len();

    if links.is_empty() {
        // 空库时表里应只剩表头
        let stale = match sheet_has_stale_rows(engine).await {
            Ok(stale) => stale,
            Err(e) => {
                warn!("Reconcile could not read mirror: {}", e);
                report.failed += 1;
                return report;
            }
        };
        if stale {
            match engine.full_resync().await {
                Ok(_) => report.resynced += 1,
                Err(e) => {
                    warn!("Reconcile resync of empty store failed: {}", e);
                    report.failed += 1;
                }
            }
        }
        return report;
    }

    for link in &links {
        match engine.push_link(link).await {
            Ok(PushOutcome::Updated { .. }) => report.updated += 1,
            Ok(PushOutcome::Resynced { .. }) => {
                report.resynced += 1;
                break;
            }
            Err(e) => {
                warn!("Reconcile push for '{}' failed: {}", link.short_code, e);
                report.failed += 1;
                break;
            }
        }
    }

    report
}

/// Anything other than a lone header row.
async fn sheet_has_stale_rows(engine: &MirrorSyncEngine) -> crate::errors::Result<bool> {
    let mirror = engine.mirror();
    if !is_header(&mirror.row_values(1).await?) {
        return Ok(true);
    }
    Ok(!mirror.row_values(2).await?.is_empty())
}
