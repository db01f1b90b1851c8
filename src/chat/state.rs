//! The session state store.
//!
//! [`SessionState`] owns everything the conversation view draws: the
//! message history, the selected model, theme and layout, the approximate
//! token counters, the last error, and the live typing buffer. All
//! mutation goes through its methods.
//!
//! Persistence is explicit. Mutators only mark keys dirty; [`SessionState::save`]
//! writes the dirty keys in one batch. The typing buffer and the flags
//! around a request are never persisted.

use std::time::{Duration, Instant};

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::Result;
use crate::observability::{SESSION_EVICTIONS, STORAGE_CORRUPT_LOADS};
use crate::storage::{DARK_MODE_KEY, LAYOUT_KEY, MESSAGES_KEY, Storage};
use crate::types::{Layout, Message, MessageParam, MessageRole, Model};

/// Maximum number of messages retained; older ones are evicted first.
pub const MAX_MESSAGES: usize = 50;

/// Default time an error stays visible before it is dismissed.
pub const DEFAULT_ERROR_DISMISS: Duration = Duration::from_secs(5);

/// An error surfaced to the user, with the instant it was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    /// The text to show.
    pub message: String,
    /// When the error was raised.
    pub raised_at: Instant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Dirty {
    messages: bool,
    dark_mode: bool,
    layout: bool,
}

impl Dirty {
    fn any(&self) -> bool {
        self.messages || self.dark_mode || self.layout
    }
}

/// Snapshot of session counters and settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The selected model.
    pub model: Model,
    /// Number of retained messages.
    pub message_count: usize,
    /// Approximate tokens sent by the user.
    pub total_input_tokens: u64,
    /// Approximate tokens received from the assistant.
    pub total_output_tokens: u64,
    /// Whether the dark theme is active.
    pub dark_mode: bool,
    /// The active layout mode.
    pub layout: Layout,
    /// The last error, if any.
    pub last_error: Option<String>,
}

impl SessionStats {
    /// Input and output tokens combined.
    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }
}

/// Owned application state for one chat session.
#[derive(Debug, Clone)]
pub struct SessionState {
    messages: Vec<Message>,
    model: Model,
    dark_mode: bool,
    layout: Layout,
    total_input_tokens: u64,
    total_output_tokens: u64,
    error: Option<ErrorNotice>,
    in_flight: bool,
    typing: bool,
    displayed_answer: String,
    last_id: u64,
    dirty: Dirty,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Creates an empty session with default settings.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            model: Model::default(),
            dark_mode: false,
            layout: Layout::default(),
            total_input_tokens: 0,
            total_output_tokens: 0,
            error: None,
            in_flight: false,
            typing: false,
            displayed_answer: String::new(),
            last_id: 0,
            dirty: Dirty::default(),
        }
    }

    /// Rehydrates messages, theme and layout from `storage`.
    ///
    /// A stored message list that does not parse is discarded with a
    /// warning; the session starts with an empty history and the corrupt
    /// value is overwritten by the next save. Counters always start at zero.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        let mut state = Self::new();

        if let Some(raw) = storage.get(MESSAGES_KEY)? {
            match serde_json::from_str::<Vec<Message>>(&raw) {
                Ok(messages) if messages.iter().any(|m| m.id == u64::MAX) => {
                    STORAGE_CORRUPT_LOADS.click();
                    warn!("stored messages carry an exhausted id; starting empty");
                    state.dirty.messages = true;
                }
                Ok(mut messages) => {
                    if messages.len() > MAX_MESSAGES {
                        messages.drain(..messages.len() - MAX_MESSAGES);
                        state.dirty.messages = true;
                    }
                    state.last_id = messages.iter().map(|m| m.id).max().unwrap_or(0);
                    state.messages = messages;
                }
                Err(err) => {
                    STORAGE_CORRUPT_LOADS.click();
                    warn!(error = %err, "stored messages are malformed; starting empty");
                    state.dirty.messages = true;
                }
            }
        }

        state.dark_mode = storage.get(DARK_MODE_KEY)?.as_deref() == Some("true");
        state.layout = Layout::from_stored(storage.get(LAYOUT_KEY)?.as_deref());
        debug!(
            messages = state.messages.len(),
            dark_mode = state.dark_mode,
            layout = %state.layout,
            "session state loaded"
        );
        Ok(state)
    }

    /// Writes every key changed since the last save.
    ///
    /// Returns the number of keys written.
    pub fn save(&mut self, storage: &mut dyn Storage) -> Result<usize> {
        if !self.dirty.any() {
            return Ok(0);
        }
        let mut written = 0;
        if self.dirty.messages {
            let json = serde_json::to_string(&self.messages)?;
            storage.set(MESSAGES_KEY, &json)?;
            self.dirty.messages = false;
            written += 1;
        }
        if self.dirty.dark_mode {
            storage.set(DARK_MODE_KEY, if self.dark_mode { "true" } else { "false" })?;
            self.dirty.dark_mode = false;
            written += 1;
        }
        if self.dirty.layout {
            storage.set(LAYOUT_KEY, self.layout.as_str())?;
            self.dirty.layout = false;
            written += 1;
        }
        debug!(written, "session state saved");
        Ok(written)
    }

    /// True if there are changes not yet saved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty.any()
    }

    /// Appends a message, evicting the oldest beyond [`MAX_MESSAGES`].
    ///
    /// User messages add to the input counter and assistant messages to the
    /// output counter. Evicted messages are not subtracted.
    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) -> &Message {
        let id = self.next_id();
        let message = Message::new(id, role, content);
        match role {
            MessageRole::User => self.total_input_tokens += message.approximate_tokens(),
            MessageRole::Assistant => self.total_output_tokens += message.approximate_tokens(),
            MessageRole::System => {}
        }
        self.messages.push(message);
        if self.messages.len() > MAX_MESSAGES {
            let excess = self.messages.len() - MAX_MESSAGES;
            self.messages.drain(..excess);
            SESSION_EVICTIONS.click();
        }
        self.dirty.messages = true;
        &self.messages[self.messages.len() - 1]
    }

    /// Empties the history and zeroes both counters.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.total_input_tokens = 0;
        self.total_output_tokens = 0;
        self.dirty.messages = true;
    }

    fn next_id(&mut self) -> u64 {
        let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).max(0) as u64;
        self.last_id = now.max(self.last_id.saturating_add(1));
        self.last_id
    }

    /// The retained messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last `n` retained messages as role/content turns.
    pub fn context(&self, n: usize) -> Vec<MessageParam> {
        let start = self.messages.len().saturating_sub(n);
        self.messages[start..].iter().map(MessageParam::from).collect()
    }

    /// The selected model.
    pub fn model(&self) -> Model {
        self.model
    }

    /// Selects a model.
    pub fn set_model(&mut self, model: Model) {
        self.model = model;
    }

    /// Whether the dark theme is active.
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// Sets the theme.
    pub fn set_dark_mode(&mut self, dark_mode: bool) {
        if self.dark_mode != dark_mode {
            self.dark_mode = dark_mode;
            self.dirty.dark_mode = true;
        }
    }

    /// Flips the theme and returns the new value.
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.set_dark_mode(!self.dark_mode);
        self.dark_mode
    }

    /// The active layout mode.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Sets the layout mode.
    pub fn set_layout(&mut self, layout: Layout) {
        if self.layout != layout {
            self.layout = layout;
            self.dirty.layout = true;
        }
    }

    /// Approximate tokens sent by the user since the last clear.
    pub fn total_input_tokens(&self) -> u64 {
        self.total_input_tokens
    }

    /// Approximate tokens received since the last clear.
    pub fn total_output_tokens(&self) -> u64 {
        self.total_output_tokens
    }

    /// The last recorded error, however old.
    pub fn error(&self) -> Option<&ErrorNotice> {
        self.error.as_ref()
    }

    /// The error to display at `now`, if it is younger than `dismiss_after`.
    pub fn visible_error(&self, now: Instant, dismiss_after: Duration) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|notice| now.saturating_duration_since(notice.raised_at) < dismiss_after)
            .map(|notice| notice.message.as_str())
    }

    /// Records an error for display.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(ErrorNotice {
            message: message.into(),
            raised_at: Instant::now(),
        });
    }

    /// Clears the recorded error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// True while a request (and its typing run) is outstanding.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub(crate) fn set_in_flight(&mut self, in_flight: bool) {
        self.in_flight = in_flight;
    }

    /// True while the typing block is shown.
    pub fn typing(&self) -> bool {
        self.typing
    }

    pub(crate) fn set_typing(&mut self, typing: bool) {
        self.typing = typing;
    }

    /// The partial answer revealed so far.
    pub fn displayed_answer(&self) -> &str {
        &self.displayed_answer
    }

    pub(crate) fn reset_displayed_answer(&mut self) {
        self.displayed_answer.clear();
    }

    pub(crate) fn push_displayed(&mut self, piece: &str) {
        self.displayed_answer.push_str(piece);
    }

    /// Returns a snapshot of counters and settings.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.model,
            message_count: self.messages.len(),
            total_input_tokens: self.total_input_tokens,
            total_output_tokens: self.total_output_tokens,
            dark_mode: self.dark_mode,
            layout: self.layout,
            last_error: self.error.as_ref().map(|notice| notice.message.clone()),
        }
    }
}
