//! HTTP Handlers

mod batch;
mod cache;
mod ping;
mod segments;
mod settings;

pub use batch::*;
pub use cache::*;
pub use ping::*;
pub use segments::*;
pub use settings::*;
