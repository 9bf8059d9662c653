//! 运行模式

pub mod server;

pub use server::run_server;
