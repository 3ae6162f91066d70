use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // links 表：short_code 与 original_url 均唯一
        manager
            .create_table(
                Table::create()
                    .table(Link::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Link::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Link::ShortCode)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Link::OriginalUrl)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Link::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Link::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // original_url 是去重键
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_links_original_url")
                    .table(Link::Table)
                    .col(Link::OriginalUrl)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uq_links_original_url").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Link::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Link {
    #[sea_orm(iden = "links")]
    Table,
    Id,
    ShortCode,
    OriginalUrl,
    Clicks,
    CreatedAt,
}
