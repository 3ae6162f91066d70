use std::time::Duration;

use sea_orm::DatabaseConnection;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::mirror::ReconcilerHandle;

/// 单个任务超时时间（秒）
const TASK_TIMEOUT_SECS: u64 = 10;

/// 停止后台任务并关闭数据库连接
pub async fn perform_shutdown(reconciler: Option<ReconcilerHandle>, db: DatabaseConnection) {
    if let Some(handle) = reconciler {
        match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), handle.shutdown()).await {
            Ok(()) => info!("Mirror reconcile task stopped"),
            Err(_) => error!(
                "Mirror reconcile task did not stop within {} seconds",
                TASK_TIMEOUT_SECS
            ),
        }
    }

    match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), db.close()).await {
        Ok(Ok(())) => info!("Database connection closed"),
        Ok(Err(e)) => warn!("Failed to close database connection: {}", e),
        Err(_) => error!("Database close timed out after {} seconds", TASK_TIMEOUT_SECS),
    }
}
