//! Service layer
//!
//! 遮罩映射、跳转日志、短链服务与出站 HTTP。

pub mod click_log;
pub mod http;
pub mod mask_store;
pub mod shortener;

pub use click_log::ClickLog;
pub use mask_store::MaskStore;
pub use shortener::{ShortenerProvider, build_provider};
