//! 应用层 - 命令
//!
//! 批处理、分段预览与设置相关的用例

mod batch_commands;

pub mod handlers;

pub use batch_commands::*;
