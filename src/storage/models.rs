use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// 遮罩映射记录
///
/// `mask` 为短链地址（数字编码时为空），`shortener` 为短链服务标签（持久化列名 `short_url`）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskRecord {
    pub id: i64,
    pub url: String,
    pub mask: String,
    pub shortener: String,
}

/// 跳转日志记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: i64,
    pub url: String,
    pub referring_url: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub restricted: Option<String>,
    pub date: DateTime<Utc>,
}

/// 待写入的跳转日志
#[derive(Debug, Clone, Default)]
pub struct NewLogEntry {
    pub url: String,
    pub referring_url: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// 遮罩列表排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MaskOrderBy {
    #[default]
    Id,
    Url,
    Mask,
    ShortUrl,
}

/// 日志列表排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogOrderBy {
    Id,
    Url,
    UserAgent,
    IpAddress,
    #[default]
    Date,
}

/// 分页查询参数（page 从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery<O> {
    pub page: u64,
    pub page_size: u64,
    pub order_by: O,
    pub order: SortOrder,
}

impl<O: Default> Default for ListQuery<O> {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            order_by: O::default(),
            order: SortOrder::Desc,
        }
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}
