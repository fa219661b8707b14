//! Memory Layer - In-Memory State Management
//!
//! 实现 RunManager，管理批处理运行的内存状态

mod run_manager;

pub use run_manager::InMemoryRunManager;
