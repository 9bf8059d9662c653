//! Admin API 服务模块
//!
//! 遮罩记录与跳转日志的查询、删除和清理。

mod helpers;
mod logs;
mod masks;
pub mod routes;
mod types;

pub use types::*;

pub use helpers::{api_result, error_from_linkmasker, error_response, success_response};

pub use logs::{count_logs, delete_log, get_log, list_logs, purge_logs};
pub use masks::{count_masks, delete_mask, get_mask, list_masks};
