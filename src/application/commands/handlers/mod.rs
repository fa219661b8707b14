//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod batch_handlers;
mod segment_handlers;
mod settings_handlers;

pub use batch_handlers::*;
pub use segment_handlers::*;
pub use settings_handlers::*;
