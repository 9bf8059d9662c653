//! 链接掩码表迁移
//!
//! `external_links_masks` 保存原始 URL 与掩码（数字编码的 id 或第三方短链接）的映射。
//! `short_url` 列沿用旧表结构，实际存放的是短链接服务商标签。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_masks_table(manager).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Masks::Table).to_owned())
            .await
    }
}

/// 创建 masks 表（幂等，运行时自愈也会调用）
pub async fn create_masks_table(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Masks::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Masks::Id)
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Masks::Url).text().not_null())
                .col(ColumnDef::new(Masks::Mask).text().not_null())
                .col(ColumnDef::new(Masks::ShortUrl).text().not_null())
                .to_owned(),
        )
        .await
}

#[derive(DeriveIden)]
enum Masks {
    #[sea_orm(iden = "external_links_masks")]
    Table,
    Id,
    Url,
    Mask,
    ShortUrl,
}
