// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod render;
pub mod storage;
pub mod types;
pub mod view;

// Re-exports
pub use client::{CompletionBackend, CompletionClient};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use types::*;
