//! Admin API 类型定义

use serde::{Deserialize, Serialize};

use crate::storage::{ListQuery, SortOrder};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub data: T,
}

/// 列表查询参数 `?page=&page_size=&order_by=&order=`
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ListParams<O> {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub order_by: Option<O>,
    pub order: Option<SortOrder>,
}

impl<O: Default + Copy> ListParams<O> {
    pub fn into_query(self) -> ListQuery<O> {
        let defaults = ListQuery::<O>::default();
        ListQuery {
            page: self.page.unwrap_or(defaults.page).max(1),
            page_size: self.page_size.unwrap_or(defaults.page_size).clamp(1, 100),
            order_by: self.order_by.unwrap_or_default(),
            order: self.order.unwrap_or(defaults.order),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeletedResponse {
    pub id: i64,
    pub deleted: bool,
}

/// `POST /admin/logs/purge`，缺省使用配置中的保留天数
#[derive(Deserialize, Clone, Debug, Default)]
pub struct PurgeRequest {
    pub days: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PurgeResponse {
    pub days: u32,
    pub removed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LogOrderBy;

    #[test]
    fn test_list_params_clamp() {
        let params = ListParams::<LogOrderBy> {
            page: Some(0),
            page_size: Some(1000),
            order_by: None,
            order: Some(SortOrder::Asc),
        };
        let query = params.into_query();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 100);
        assert_eq!(query.order_by, LogOrderBy::Date);
        assert_eq!(query.order, SortOrder::Asc);
    }
}
