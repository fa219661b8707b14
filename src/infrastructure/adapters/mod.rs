//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod llm;
pub mod token_counter;

pub use llm::*;
pub use token_counter::*;
