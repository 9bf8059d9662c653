//! 系统级模块

pub mod logging;

pub use logging::init_logging;
