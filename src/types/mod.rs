// Public modules
pub mod completion;
pub mod layout;
pub mod message;
pub mod message_param;
pub mod model;

// Re-exports
pub use completion::{CompletionRequest, CompletionResponse};
pub use layout::Layout;
pub use message::{Message, approximate_tokens};
pub use message_param::{MessageParam, MessageRole};
pub use model::Model;
