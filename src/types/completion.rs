use serde::{Deserialize, Serialize};

use crate::types::{MessageParam, Model};

/// Body of a request to the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionRequest {
    /// The selected model identifier.
    pub model: Model,

    /// System instruction, prior context, then the new user turn.
    pub conversation: Vec<MessageParam>,
}

impl CompletionRequest {
    /// Create a new request.
    pub fn new(model: Model, conversation: Vec<MessageParam>) -> Self {
        Self {
            model,
            conversation,
        }
    }
}

/// Body of a response from the completion endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionResponse {
    /// The full answer text; absent when the endpoint had nothing to say.
    #[serde(default)]
    pub answer: Option<String>,
}

impl CompletionResponse {
    /// The answer, if present and non-empty.
    pub fn into_answer(self) -> Option<String> {
        self.answer.filter(|answer| !answer.is_empty())
    }
}
