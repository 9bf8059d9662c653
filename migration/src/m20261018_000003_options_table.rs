//! 引擎状态表迁移
//!
//! `external_links_options` 以键值形式保存持久化的引擎状态，
//! 例如 `encryption_key` 与 `last_cleared_logs`。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_options_table(manager).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Options::Table).to_owned())
            .await
    }
}

/// 创建 options 表（幂等）
pub async fn create_options_table(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Options::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Options::Name)
                        .string_len(191)
                        .not_null()
                        .primary_key(),
                )
                .col(ColumnDef::new(Options::Value).text().not_null())
                .to_owned(),
        )
        .await
}

#[derive(DeriveIden)]
enum Options {
    #[sea_orm(iden = "external_links_options")]
    Table,
    Name,
    Value,
}
