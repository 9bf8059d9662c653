//! 运行时：启动准备、HTTP 服务与关闭

pub mod lifetime;
pub mod modes;
