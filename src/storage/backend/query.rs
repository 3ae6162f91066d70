//! Query operations for SeaOrmStorage
//!
//! Read-only database operations. All of them retry transient errors.

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::trace;

use super::converters::model_to_link;
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::Link;

use migration::entities::link;

impl SeaOrmStorage {
    /// Look up a link by its short code.
    pub async fn get(&self, code: &str) -> Result<Option<Link>> {
        let db = &self.db;

        let model = retry::with_retry(&format!("get({})", code), self.retry_config, || async {
            link::Entity::find()
                .filter(link::Column::ShortCode.eq(code))
                .one(db)
                .await
        })
        .await?;

        Ok(model.map(model_to_link))
    }

    /// Look up the link that already points at `url`, if any.
    pub async fn find_by_url(&self, url: &str) -> Result<Option<Link>> {
        let db = &self.db;

        let model = retry::with_retry("find_by_url", self.retry_config, || async {
            link::Entity::find()
                .filter(link::Column::OriginalUrl.eq(url))
                .one(db)
                .await
        })
        .await?;

        Ok(model.map(model_to_link))
    }

    pub async fn exists(&self, code: &str) -> Result<bool> {
        let db = &self.db;

        let count = retry::with_retry(&format!("exists({})", code), self.retry_config, || async {
            link::Entity::find()
                .filter(link::Column::ShortCode.eq(code))
                .count(db)
                .await
        })
        .await?;

        Ok(count > 0)
    }

    /// All links, most recently created first.
    pub async fn list_all(&self) -> Result<Vec<Link>> {
        let db = &self.db;

        let models = retry::with_retry("list_all", self.retry_config, || async {
            link::Entity::find()
                .order_by_desc(link::Column::Id)
                .all(db)
                .await
        })
        .await?;

        trace!("Loaded {} links", models.len());
        Ok(models.into_iter().map(model_to_link).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        let db = &self.db;

        let count = retry::with_retry("count", self.retry_config, || async {
            link::Entity::find().count(db).await
        })
        .await?;

        Ok(count)
    }
}
