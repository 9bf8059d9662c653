//! 跳转日志表迁移
//!
//! 创建 `external_links_logs` 表，每次成功跳转写入一条记录：
//! - 目标 URL
//! - 来源 (referring_url)
//! - 用户代理、IP 地址
//! - 跳转时间

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_logs_table(manager).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_external_links_logs_date").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Logs::Table).to_owned())
            .await
    }
}

/// 创建 logs 表及 date 索引（幂等，运行时自愈也会调用）
pub async fn create_logs_table(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Logs::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Logs::Id)
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Logs::Url).text().not_null())
                .col(ColumnDef::new(Logs::ReferringUrl).text().null())
                .col(ColumnDef::new(Logs::UserAgent).text().null())
                .col(ColumnDef::new(Logs::IpAddress).string_len(255).null())
                .col(ColumnDef::new(Logs::Restricted).string_len(255).null())
                .col(
                    ColumnDef::new(Logs::Date)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .to_owned(),
        )
        .await?;

    // 清理任务按 date 范围删除
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name("idx_external_links_logs_date")
                .table(Logs::Table)
                .col(Logs::Date)
                .to_owned(),
        )
        .await
}

#[derive(DeriveIden)]
enum Logs {
    #[sea_orm(iden = "external_links_logs")]
    Table,
    Id,
    Url,
    ReferringUrl,
    UserAgent,
    IpAddress,
    Restricted,
    Date,
}
