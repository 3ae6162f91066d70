//! SeaORM storage backend
//!
//! The authoritative record of short-code → URL mappings and click counts,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::codegen::CodeIndex;
use crate::errors::{Result, SheetlinkerError};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::model_to_link;

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(SheetlinkerError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based link store
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(
        database_url: &str,
        backend_name: &str,
        pool_size: u32,
        retry_config: retry::RetryConfig,
    ) -> Result<Self> {
        if database_url.is_empty() {
            return Err(SheetlinkerError::database_config("database_url is empty"));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name, pool_size).await?
        };

        run_migrations(&db).await?;

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            retry_config,
        };

        info!("{} link store initialized", storage.backend_name.to_uppercase());
        Ok(storage)
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl CodeIndex for SeaOrmStorage {
    async fn code_exists(&self, code: &str) -> Result<bool> {
        self.exists(code).await
    }
}
