//! 引擎状态键值表（external_links_options）

use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, EntityTrait};
use tracing::debug;

use super::schema::ManagedTable;
use super::{SeaOrmStorage, retry};
use crate::errors::Result;

use migration::entities::plugin_option;

/// 持久化的 AES 密钥
pub const OPTION_ENCRYPTION_KEY: &str = "encryption_key";
/// 上次清理日志的 unix 时间戳
pub const OPTION_LAST_CLEARED_LOGS: &str = "last_cleared_logs";

impl SeaOrmStorage {
    pub async fn get_option(&self, name: &str) -> Result<Option<String>> {
        self.heal_once(ManagedTable::Options, move || async move {
            let db = &self.db;
            let found = retry::with_retry("get_option", self.retry_config, || async {
                plugin_option::Entity::find_by_id(name.to_string())
                    .one(db)
                    .await
            })
            .await?;
            Ok(found.map(|m| m.value))
        })
        .await
    }

    /// 写入或覆盖选项
    pub async fn set_option(&self, name: &str, value: &str) -> Result<()> {
        self.heal_once(ManagedTable::Options, move || async move {
            let db = &self.db;
            retry::with_retry("set_option", self.retry_config, || async {
                let model = plugin_option::ActiveModel {
                    name: Set(name.to_string()),
                    value: Set(value.to_string()),
                };
                plugin_option::Entity::insert(model)
                    .on_conflict(
                        OnConflict::column(plugin_option::Column::Name)
                            .update_column(plugin_option::Column::Value)
                            .to_owned(),
                    )
                    .exec(db)
                    .await
            })
            .await?;
            Ok(())
        })
        .await?;

        debug!("Option '{}' updated", name);
        Ok(())
    }
}
