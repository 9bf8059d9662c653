//! 外链遮罩引擎
//!
//! 渲染阶段把站外 `<a>` 重写为站内跳转地址（或短链、span 等），
//! 跳转阶段解码令牌并把访客送往原始地址。

pub mod bots;
pub mod cipher;
pub mod content;
pub mod context;
pub mod debug;
pub mod encoder;
pub mod html;
pub mod pages;
pub mod policy;
pub mod redirect;
pub mod scanner;

pub use bots::Bot;
pub use content::ContentFilter;
pub use context::{ContentKind, RenderContext, RequestContext};
pub use encoder::LinkEncoder;
pub use redirect::{DispatchResponse, RedirectDispatcher, extract_token};
