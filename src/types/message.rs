use serde::{Deserialize, Serialize};

use crate::types::MessageRole;

/// A stored conversation message.
///
/// Messages are immutable once created. The `id` is a millisecond
/// timestamp, strictly increasing within a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Monotonic timestamp identifier.
    pub id: u64,

    /// Who produced the message.
    pub role: MessageRole,

    /// Message text (markdown).
    pub content: String,
}

impl Message {
    /// Create a new message.
    pub fn new(id: u64, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
        }
    }

    /// Approximate token cost of this message's content.
    pub fn approximate_tokens(&self) -> u64 {
        approximate_tokens(&self.content)
    }
}

/// A cheap length-based proxy for language-model token usage.
///
/// Length is measured in UTF-16 code units and divided by four, rounding up.
pub fn approximate_tokens(text: &str) -> u64 {
    let units = text.encode_utf16().count() as u64;
    units.div_ceil(4)
}
