//! Mutation operations for SeaOrmStorage
//!
//! Every mutation opens with its write, so a SQLite writer takes the lock
//! up front and waits on `busy_timeout` instead of failing a lock upgrade.
//! The unique indexes on `short_code` and `original_url` are the final
//! arbiter: a violation is reported as `Conflict`, and nothing is written.
//! Transient lock errors are retried, conflicts never are.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ExprTrait, QueryFilter,
    TransactionTrait,
};
use tracing::info;

use super::converters::model_to_link;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, SheetlinkerError};
use crate::storage::Link;

use migration::entities::link;

impl SeaOrmStorage {
    /// Insert a new link with zero clicks.
    ///
    /// Fails with `Conflict` if either the code or the URL is already taken.
    pub async fn create(&self, code: &str, url: &str) -> Result<Link> {
        let db = &self.db;

        let inserted = retry::with_retry(&format!("create({})", code), self.retry_config, || async {
            link::ActiveModel {
                short_code: Set(code.to_string()),
                original_url: Set(url.to_string()),
                clicks: Set(0),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await
        })
        .await;

        let model = match inserted {
            Ok(model) => model,
            Err(e) => return Err(self.write_error(e, code, url, None).await),
        };

        info!("Link created: {} -> {}", model.short_code, model.original_url);
        Ok(model_to_link(model))
    }

    /// Increment the click counter of `code` by exactly one.
    ///
    /// Returns `None` (and writes nothing) when the code does not exist.
    pub async fn record_visit(&self, code: &str) -> Result<Option<Link>> {
        let db = &self.db;

        let model = retry::with_retry(&format!("record_visit({})", code), self.retry_config, || async {
            let txn = db.begin().await?;

            // clicks = clicks + 1 在数据库侧完成，并发访问不会丢计数
            let result = link::Entity::update_many()
                .col_expr(link::Column::Clicks, Expr::col(link::Column::Clicks).add(1))
                .filter(link::Column::ShortCode.eq(code))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                txn.rollback().await?;
                return Ok(None);
            }

            let model = link::Entity::find()
                .filter(link::Column::ShortCode.eq(code))
                .one(&txn)
                .await?;
            txn.commit().await?;
            Ok(model)
        })
        .await?;

        Ok(model.map(model_to_link))
    }

    /// Replace the code and URL of the link currently known as `old_code`.
    ///
    /// The click counter is reset to zero. Fails with `NotFound` if
    /// `old_code` does not exist and with `Conflict` if `new_code` or
    /// `new_url` belongs to a different link.
    pub async fn rename(&self, old_code: &str, new_code: &str, new_url: &str) -> Result<Link> {
        let db = &self.db;

        let renamed = retry::with_retry(&format!("rename({})", old_code), self.retry_config, || async {
            let txn = db.begin().await?;

            let result = link::Entity::update_many()
                .col_expr(link::Column::ShortCode, Expr::value(new_code))
                .col_expr(link::Column::OriginalUrl, Expr::value(new_url))
                .col_expr(link::Column::Clicks, Expr::value(0i64))
                .filter(link::Column::ShortCode.eq(old_code))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                txn.rollback().await?;
                return Ok(None);
            }

            let model = link::Entity::find()
                .filter(link::Column::ShortCode.eq(new_code))
                .one(&txn)
                .await?;
            txn.commit().await?;
            Ok(model)
        })
        .await;

        let model = match renamed {
            Ok(Some(model)) => model,
            Ok(None) => {
                return Err(SheetlinkerError::not_found(format!("Link '{}' not found", old_code)));
            }
            Err(e) => return Err(self.write_error(e, new_code, new_url, Some(old_code)).await),
        };

        info!("Link renamed: {} -> {} ({})", old_code, new_code, new_url);
        Ok(model_to_link(model))
    }

    /// Remove every link in one statement. Returns the number of rows removed.
    pub async fn clear_all(&self) -> Result<u64> {
        let db = &self.db;

        let result = retry::with_retry("clear_all", self.retry_config, || async {
            link::Entity::delete_many().exec(db).await
        })
        .await?;

        info!("Cleared {} links", result.rows_affected);
        Ok(result.rows_affected)
    }

    /// Translate a failed write into a domain error.
    ///
    /// A unique violation names the link that owns the contested code or URL.
    /// `except` is the link being renamed, which may keep its own values.
    async fn write_error(
        &self,
        err: sea_orm::DbErr,
        code: &str,
        url: &str,
        except: Option<&str>,
    ) -> SheetlinkerError {
        let err = SheetlinkerError::from(err);
        if !matches!(err, SheetlinkerError::Conflict(_) | SheetlinkerError::DatabaseOperation(_)) {
            return err;
        }

        let mut query = link::Entity::find().filter(
            link::Column::ShortCode
                .eq(code)
                .or(link::Column::OriginalUrl.eq(url)),
        );
        if let Some(except) = except {
            query = query.filter(link::Column::ShortCode.ne(except));
        }

        match query.one(&self.db).await {
            Ok(Some(other)) if other.short_code == code => {
                SheetlinkerError::conflict(format!("short code '{}' is used by another link", code))
            }
            Ok(Some(other)) => SheetlinkerError::conflict(format!(
                "URL is already shortened as '{}'",
                other.short_code
            )),
            _ => err,
        }
    }
}
