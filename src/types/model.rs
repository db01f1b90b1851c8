use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A selectable model identifier.
///
/// The endpoint routes on this identifier; it is passed through unchanged.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    /// whisper-1
    #[serde(rename = "whisper-1")]
    Whisper1,

    /// gpt-4o-mini
    #[default]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,

    /// gpt-4o
    #[serde(rename = "gpt-4o")]
    Gpt4o,

    /// gpt-4.1-nano
    #[serde(rename = "gpt-4.1-nano")]
    Gpt41Nano,

    /// gpt-4.1-mini
    #[serde(rename = "gpt-4.1-mini")]
    Gpt41Mini,

    /// gpt-4.1
    #[serde(rename = "gpt-4.1")]
    Gpt41,

    /// o3-mini-high
    #[serde(rename = "o3-mini-high")]
    O3MiniHigh,

    /// gpt-4o-audio-preview
    #[serde(rename = "gpt-4o-audio-preview")]
    Gpt4oAudioPreview,

    /// o3-mini
    #[serde(rename = "o3-mini")]
    O3Mini,

    /// o3
    #[serde(rename = "o3")]
    O3,

    /// o3-mini-low
    #[serde(rename = "o3-mini-low")]
    O3MiniLow,

    /// o1
    #[serde(rename = "o1")]
    O1,

    /// o1-mini
    #[serde(rename = "o1-mini")]
    O1Mini,

    /// o4-mini
    #[serde(rename = "o4-mini")]
    O4Mini,

    /// gpt-4.5-preview
    #[serde(rename = "gpt-4.5-preview")]
    Gpt45Preview,

    /// chatgpt-4o-latest
    #[serde(rename = "chatgpt-4o-latest")]
    ChatGpt4oLatest,

    /// gemini-2.5-flash-preview-04-17
    #[serde(rename = "gemini-2.5-flash-preview-04-17")]
    Gemini25FlashPreview0417,

    /// gemini-2.5-pro-exp-03-25
    #[serde(rename = "gemini-2.5-pro-exp-03-25")]
    Gemini25ProExp0325,

    /// gemini-2.0-flash-lite-preview
    #[serde(rename = "gemini-2.0-flash-lite-preview")]
    Gemini20FlashLitePreview,

    /// gemini-2.0-flash
    #[serde(rename = "gemini-2.0-flash")]
    Gemini20Flash,

    /// deepseek-reasoner
    #[serde(rename = "deepseek-reasoner")]
    DeepseekReasoner,

    /// deepseek-chat
    #[serde(rename = "deepseek-chat")]
    DeepseekChat,

    /// claude-3-7-sonnet-20250219-thinking
    #[serde(rename = "claude-3-7-sonnet-20250219-thinking")]
    Claude37Sonnet20250219Thinking,

    /// claude-3-5-sonnet-20241022
    #[serde(rename = "claude-3-5-sonnet-20241022")]
    Claude35Sonnet20241022,

    /// claude-3-7-sonnet-20250219
    #[serde(rename = "claude-3-7-sonnet-20250219")]
    Claude37Sonnet20250219,
}

impl Model {
    /// Every selectable model, in presentation order.
    pub const ALL: [Model; 25] = [
        Model::Whisper1,
        Model::Gpt4oMini,
        Model::Gpt4o,
        Model::Gpt41Nano,
        Model::Gpt41Mini,
        Model::Gpt41,
        Model::O3MiniHigh,
        Model::Gpt4oAudioPreview,
        Model::O3Mini,
        Model::O3,
        Model::O3MiniLow,
        Model::O1,
        Model::O1Mini,
        Model::O4Mini,
        Model::Gpt45Preview,
        Model::ChatGpt4oLatest,
        Model::Gemini25FlashPreview0417,
        Model::Gemini25ProExp0325,
        Model::Gemini20FlashLitePreview,
        Model::Gemini20Flash,
        Model::DeepseekReasoner,
        Model::DeepseekChat,
        Model::Claude37Sonnet20250219Thinking,
        Model::Claude35Sonnet20241022,
        Model::Claude37Sonnet20250219,
    ];

    /// The wire identifier for this model.
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Whisper1 => "whisper-1",
            Model::Gpt4oMini => "gpt-4o-mini",
            Model::Gpt4o => "gpt-4o",
            Model::Gpt41Nano => "gpt-4.1-nano",
            Model::Gpt41Mini => "gpt-4.1-mini",
            Model::Gpt41 => "gpt-4.1",
            Model::O3MiniHigh => "o3-mini-high",
            Model::Gpt4oAudioPreview => "gpt-4o-audio-preview",
            Model::O3Mini => "o3-mini",
            Model::O3 => "o3",
            Model::O3MiniLow => "o3-mini-low",
            Model::O1 => "o1",
            Model::O1Mini => "o1-mini",
            Model::O4Mini => "o4-mini",
            Model::Gpt45Preview => "gpt-4.5-preview",
            Model::ChatGpt4oLatest => "chatgpt-4o-latest",
            Model::Gemini25FlashPreview0417 => "gemini-2.5-flash-preview-04-17",
            Model::Gemini25ProExp0325 => "gemini-2.5-pro-exp-03-25",
            Model::Gemini20FlashLitePreview => "gemini-2.0-flash-lite-preview",
            Model::Gemini20Flash => "gemini-2.0-flash",
            Model::DeepseekReasoner => "deepseek-reasoner",
            Model::DeepseekChat => "deepseek-chat",
            Model::Claude37Sonnet20250219Thinking => "claude-3-7-sonnet-20250219-thinking",
            Model::Claude35Sonnet20241022 => "claude-3-5-sonnet-20241022",
            Model::Claude37Sonnet20250219 => "claude-3-7-sonnet-20250219",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Model::ALL
            .iter()
            .find(|model| model.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown model: {s} (use /models to list choices)"))
    }
}
