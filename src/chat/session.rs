//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the session
//! state, sends each user turn to the completion endpoint, and types the
//! answer out through a [`Renderer`].

use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::chat::config::ChatConfig;
use crate::chat::state::{SessionState, SessionStats};
use crate::chat::typing::TypingSimulation;
use crate::client::CompletionBackend;
use crate::error::Result;
use crate::observability::{
    SESSION_SENDS, SESSION_SKIPPED_SENDS, TYPING_FAST_FORWARDS, TYPING_PIECES,
};
use crate::render::Renderer;
use crate::storage::{MemoryStorage, Storage};
use crate::types::{CompletionRequest, Layout, MessageParam, MessageRole, Model};

/// What happened to an input handed to [`ChatSession::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing was sent: the input was blank or a request was in flight.
    Skipped,
    /// The answer was typed out and committed.
    Replied,
}

/// A chat session that manages conversation state and endpoint interactions.
///
/// The session borrows `&mut self` for a whole send, typing included, so
/// one request and one typing run exist at a time.
///
/// # Example
///
/// ```
/// # use std::time::Duration;
/// # use chatline::chat::{ChatConfig, ChatSession, PlainTextRenderer, SendOutcome};
/// # use chatline::{CompletionBackend, CompletionRequest, Result};
/// struct Echo;
///
/// #[async_trait::async_trait]
/// impl CompletionBackend for Echo {
///     async fn complete(&self, request: &CompletionRequest) -> Result<String> {
///         Ok(request.conversation.last().map(|t| t.content.clone()).unwrap_or_default())
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let config = ChatConfig::new().with_typing_interval(Duration::from_millis(1));
/// let mut session = ChatSession::new(Echo, config);
/// let mut renderer = PlainTextRenderer::with_color(false);
/// let outcome = session.send("ping", &mut renderer).await.unwrap();
/// assert_eq!(outcome, SendOutcome::Replied);
/// assert_eq!(session.state().messages()[1].content, "ping");
/// # });
/// ```
pub struct ChatSession<B: CompletionBackend> {
    backend: B,
    state: SessionState,
    storage: Box<dyn Storage>,
    config: ChatConfig,
}

impl<B: CompletionBackend> ChatSession<B> {
    /// Creates a session with empty in-memory state.
    pub fn new(backend: B, config: ChatConfig) -> Self {
        let mut state = SessionState::new();
        state.set_model(config.model);
        Self {
            backend,
            state,
            storage: Box::new(MemoryStorage::new()),
            config,
        }
    }

    /// Creates a session whose state is rehydrated from `storage`.
    ///
    /// The model always comes from `config`; it is not persisted.
    pub fn with_storage(
        backend: B,
        config: ChatConfig,
        storage: Box<dyn Storage>,
    ) -> Result<Self> {
        let mut state = SessionState::load(storage.as_ref())?;
        state.set_model(config.model);
        Ok(Self {
            backend,
            state,
            storage,
            config,
        })
    }

    /// Sends `input` as a user turn and types the answer through `renderer`.
    ///
    /// The user message is kept even when the request fails. On failure the
    /// error text is recorded in the state and returned; no assistant
    /// message is added.
    pub async fn send(&mut self, input: &str, renderer: &mut dyn Renderer) -> Result<SendOutcome> {
        if input.trim().is_empty() || self.state.in_flight() {
            SESSION_SKIPPED_SENDS.click();
            debug!(in_flight = self.state.in_flight(), "send skipped");
            return Ok(SendOutcome::Skipped);
        }
        SESSION_SENDS.click();

        let context = self.state.context(self.config.context_messages);
        self.state.append(MessageRole::User, input);
        self.persist();
        self.announce_last(renderer);

        self.state.clear_error();
        self.state.set_in_flight(true);
        self.state.reset_displayed_answer();
        self.state.set_typing(true);
        renderer.start_typing(&self.state);

        let request = self.build_request(context, input);
        info!(
            model = %request.model,
            turns = request.conversation.len(),
            "sending message"
        );
        let result = match self.backend.complete(&request).await {
            Ok(answer) => {
                self.type_answer(answer, renderer).await;
                Ok(SendOutcome::Replied)
            }
            Err(err) => {
                warn!(error = %err, "send failed");
                self.state.set_error(err.to_string());
                self.state.set_typing(false);
                renderer.finish_typing(&self.state);
                Err(err)
            }
        };
        self.state.set_in_flight(false);
        result
    }

    fn build_request(&self, context: Vec<MessageParam>, input: &str) -> CompletionRequest {
        let mut conversation = Vec::with_capacity(context.len() + 2);
        conversation.push(MessageParam::system(self.config.system_instruction.clone()));
        conversation.extend(context);
        conversation.push(MessageParam::user(input));
        CompletionRequest::new(self.state.model(), conversation)
    }

    async fn type_answer(&mut self, answer: String, renderer: &mut dyn Renderer) {
        let mut simulation = TypingSimulation::new(answer);
        {
            let mut ticker = time::interval(self.config.typing_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            while !simulation.is_finished() {
                ticker.tick().await;
                if renderer.should_interrupt() {
                    TYPING_FAST_FORWARDS.click();
                    let rest = simulation.finish();
                    self.state.push_displayed(&rest);
                    renderer.print_piece(&self.state, &rest);
                    break;
                }
                if let Some(piece) = simulation.tick() {
                    TYPING_PIECES.click();
                    self.state.push_displayed(&piece);
                    renderer.print_piece(&self.state, &piece);
                }
            }
        }

        debug!(revealed = simulation.displayed().len(), "typing finished");
        self.state.set_typing(false);
        renderer.finish_typing(&self.state);
        let message = self
            .state
            .append(MessageRole::Assistant, simulation.into_answer());
        debug!(id = message.id, "assistant reply committed");
        self.persist();
        self.announce_last(renderer);
    }

    fn announce_last(&self, renderer: &mut dyn Renderer) {
        if let Some(message) = self.state.messages().last() {
            renderer.message_committed(&self.state, message);
        }
    }

    fn persist(&mut self) {
        if let Err(err) = self.state.save(self.storage.as_mut()) {
            warn!(error = %err, "failed to save session state");
        }
    }

    /// Saves every unsaved change.
    pub fn save(&mut self) -> Result<usize> {
        self.state.save(self.storage.as_mut())
    }

    /// Clears the conversation history and counters.
    pub fn clear(&mut self) {
        self.state.clear();
        self.persist();
    }

    /// Changes the model used for the following requests.
    pub fn set_model(&mut self, model: Model) {
        self.state.set_model(model);
        self.config.model = model;
    }

    /// Sets the theme, or toggles it when `dark_mode` is `None`.
    ///
    /// Returns the theme now in effect.
    pub fn set_dark_mode(&mut self, dark_mode: Option<bool>) -> bool {
        let dark_mode = match dark_mode {
            Some(value) => {
                self.state.set_dark_mode(value);
                value
            }
            None => self.state.toggle_dark_mode(),
        };
        self.persist();
        dark_mode
    }

    /// Sets the layout mode.
    pub fn set_layout(&mut self, layout: Layout) {
        self.state.set_layout(layout);
        self.persist();
    }

    /// The session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The configuration the session was built with.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns current session statistics.
    pub fn stats(&self) -> SessionStats {
        self.state.stats()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::Error;
    use crate::storage::{DARK_MODE_KEY, LAYOUT_KEY, MESSAGES_KEY};
    use crate::types::Message;

    /// Backend that replays canned results and records every request.
    struct ScriptedBackend {
        replies: Mutex<Vec<Result<String>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn answering(answer: &str) -> Self {
            Self::new(vec![Ok(answer.to_string())])
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(Error::invalid_response());
            }
            replies.remove(0)
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        started: usize,
        finished: usize,
        pieces: Vec<String>,
        typing_seen: Vec<bool>,
        committed: Vec<(MessageRole, String, usize, bool)>,
        interrupt: bool,
    }

    impl Renderer for RecordingRenderer {
        fn start_typing(&mut self, state: &SessionState) {
            self.started += 1;
            self.typing_seen.push(state.typing());
        }

        fn print_piece(&mut self, state: &SessionState, piece: &str) {
            self.pieces.push(piece.to_string());
            self.typing_seen.push(state.typing());
        }

        fn finish_typing(&mut self, state: &SessionState) {
            self.finished += 1;
            self.typing_seen.push(state.typing());
        }

        fn message_committed(&mut self, state: &SessionState, message: &Message) {
            self.committed.push((
                message.role,
                message.content.clone(),
                state.messages().len(),
                state.typing(),
            ));
        }

        fn print_error(&mut self, _error: &str) {}

        fn print_info(&mut self, _info: &str) {}

        fn should_interrupt(&self) -> bool {
            self.interrupt
        }
    }

    fn config() -> ChatConfig {
        ChatConfig::new().with_typing_interval(Duration::from_millis(1))
    }

    fn roles(state: &SessionState) -> Vec<MessageRole> {
        state.messages().iter().map(|m| m.role).collect()
    }

    #[test]
    fn new_session_empty() {
        let session = ChatSession::new(ScriptedBackend::new(vec![]), config());
        assert!(session.state().messages().is_empty());
        assert_eq!(session.state().model(), Model::Gpt4oMini);
        assert!(!session.state().in_flight());
        assert!(!session.state().typing());
    }

    #[tokio::test]
    async fn greeting_is_answered_and_committed() {
        let mut session = ChatSession::new(
            ScriptedBackend::answering("سلام! چطور می‌توانم کمک کنم؟"),
            config(),
        );
        let mut renderer = RecordingRenderer::default();

        let outcome = session.send("سلام", &mut renderer).await.unwrap();
        assert_eq!(outcome, SendOutcome::Replied);

        let state = session.state();
        assert_eq!(roles(state), vec![MessageRole::User, MessageRole::Assistant]);
        assert_eq!(state.messages()[0].content, "سلام");
        assert_eq!(state.messages()[1].content, "سلام! چطور می‌توانم کمک کنم؟");
        assert!(state.messages()[0].id < state.messages()[1].id);
        assert!(!state.typing());
        assert!(!state.in_flight());
        assert!(state.error().is_none());
        assert_eq!(state.displayed_answer(), "سلام! چطور می‌توانم کمک کنم؟");

        assert_eq!(renderer.started, 1);
        assert_eq!(renderer.finished, 1);
        assert_eq!(renderer.pieces.concat(), "سلام! چطور می‌توانم کمک کنم؟");
        assert_eq!(renderer.pieces.len(), 9);
        assert_eq!(renderer.typing_seen.first(), Some(&true));
        assert_eq!(renderer.typing_seen.last(), Some(&false));
        assert_eq!(
            renderer.committed,
            vec![
                (MessageRole::User, "سلام".to_string(), 1, false),
                (
                    MessageRole::Assistant,
                    "سلام! چطور می‌توانم کمک کنم؟".to_string(),
                    2,
                    false
                ),
            ]
        );

        assert_eq!(state.total_input_tokens(), 1);
        assert_eq!(state.total_output_tokens(), 7);
    }

    #[tokio::test]
    async fn blank_input_is_skipped() {
        let backend = ScriptedBackend::answering("unused");
        let mut session = ChatSession::new(backend, config());
        let mut renderer = RecordingRenderer::default();

        for input in ["", "   ", "\n\t "] {
            let outcome = session.send(input, &mut renderer).await.unwrap();
            assert_eq!(outcome, SendOutcome::Skipped);
        }
        assert!(session.state().messages().is_empty());
        assert!(session.backend.requests().is_empty());
        assert_eq!(renderer.started, 0);
    }

    #[tokio::test]
    async fn surrounding_whitespace_is_kept() {
        let mut session = ChatSession::new(ScriptedBackend::answering("ok"), config());
        let mut renderer = RecordingRenderer::default();
        let input = "    indented code\n";

        let outcome = session.send(input, &mut renderer).await.unwrap();
        assert_eq!(outcome, SendOutcome::Replied);
        assert_eq!(session.state().messages()[0].content, input);
        let requests = session.backend.requests();
        let last = requests[0].conversation.last().unwrap();
        assert_eq!(last.content, input);
    }

    #[tokio::test]
    async fn send_while_in_flight_is_skipped() {
        let mut session = ChatSession::new(ScriptedBackend::answering("unused"), config());
        session.state.set_in_flight(true);
        let mut renderer = RecordingRenderer::default();

        let outcome = session.send("hello", &mut renderer).await.unwrap();
        assert_eq!(outcome, SendOutcome::Skipped);
        assert!(session.state().messages().is_empty());
        assert!(session.backend.requests().is_empty());
    }

    #[tokio::test]
    async fn server_error_keeps_user_message() {
        let mut session = ChatSession::new(
            ScriptedBackend::new(vec![Err(Error::server(500))]),
            config(),
        );
        let mut renderer = RecordingRenderer::default();

        let err = session.send("hello", &mut renderer).await.unwrap_err();
        assert!(err.is_server_error());

        let state = session.state();
        assert_eq!(roles(state), vec![MessageRole::User]);
        assert_eq!(renderer.committed.len(), 1);
        assert!(!state.in_flight());
        assert!(!state.typing());
        let notice = state.error().unwrap();
        assert!(notice.message.contains("server returned an error response"));
        assert_eq!(renderer.started, 1);
        assert_eq!(renderer.finished, 1);
        assert!(renderer.pieces.is_empty());
    }

    #[tokio::test]
    async fn missing_answer_reports_invalid_response() {
        let mut session = ChatSession::new(
            ScriptedBackend::new(vec![Err(Error::invalid_response())]),
            config(),
        );
        let mut renderer = RecordingRenderer::default();

        let err = session.send("hello", &mut renderer).await.unwrap_err();
        assert!(err.is_invalid_response());

        let state = session.state();
        assert_eq!(roles(state), vec![MessageRole::User]);
        assert_eq!(
            state.error().unwrap().message,
            "invalid response received from server"
        );
        assert!(!state.in_flight());
        assert!(!state.typing());
    }

    #[tokio::test]
    async fn next_send_clears_previous_error() {
        let mut session = ChatSession::new(
            ScriptedBackend::new(vec![Err(Error::server(502)), Ok("ok".to_string())]),
            config(),
        );
        let mut renderer = RecordingRenderer::default();

        assert!(session.send("first", &mut renderer).await.is_err());
        assert!(session.state().error().is_some());
        session.send("second", &mut renderer).await.unwrap();
        assert!(session.state().error().is_none());
        assert_eq!(
            roles(session.state()),
            vec![MessageRole::User, MessageRole::User, MessageRole::Assistant]
        );
    }

    #[tokio::test]
    async fn payload_carries_instruction_context_and_model() {
        let replies = (0..4).map(|i| Ok(format!("answer {i}"))).collect();
        let mut session = ChatSession::new(
            ScriptedBackend::new(replies),
            config()
                .with_system_instruction("be brief")
                .with_model(Model::Gpt4o),
        );
        let mut renderer = RecordingRenderer::default();

        for i in 0..4 {
            session
                .send(&format!("question {i}"), &mut renderer)
                .await
                .unwrap();
        }

        let requests = session.backend.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].conversation.len(), 2);

        let last = &requests[3];
        assert_eq!(last.model, Model::Gpt4o);
        // system + five prior messages + the new user turn
        assert_eq!(last.conversation.len(), 7);
        assert_eq!(last.conversation[0], MessageParam::system("be brief"));
        assert_eq!(last.conversation[1], MessageParam::assistant("answer 0"));
        assert_eq!(last.conversation[2], MessageParam::user("question 1"));
        assert_eq!(last.conversation[5], MessageParam::assistant("answer 2"));
        assert_eq!(last.conversation[6], MessageParam::user("question 3"));
    }

    #[tokio::test]
    async fn model_change_applies_to_next_request() {
        let mut session = ChatSession::new(ScriptedBackend::answering("ok"), config());
        session.set_model(Model::DeepseekChat);
        let mut renderer = RecordingRenderer::default();
        session.send("hi", &mut renderer).await.unwrap();
        assert_eq!(session.backend.requests()[0].model, Model::DeepseekChat);
        assert_eq!(session.config().model, Model::DeepseekChat);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_fast_forwards_typing() {
        let mut session = ChatSession::new(
            ScriptedBackend::answering("one two three four"),
            config().with_typing_interval(Duration::from_secs(60)),
        );
        let mut renderer = RecordingRenderer {
            interrupt: true,
            ..RecordingRenderer::default()
        };

        session.send("count", &mut renderer).await.unwrap();

        assert_eq!(renderer.pieces, vec!["one two three four".to_string()]);
        let state = session.state();
        assert_eq!(state.messages()[1].content, "one two three four");
        assert!(!state.typing());
    }

    #[tokio::test]
    async fn replies_are_persisted() {
        let storage = MemoryStorage::with_entries([(LAYOUT_KEY, "center")]);
        let mut session = ChatSession::with_storage(
            ScriptedBackend::answering("hello back"),
            config(),
            Box::new(storage),
        )
        .unwrap();
        assert_eq!(session.state().layout(), Layout::Centered);

        let mut renderer = RecordingRenderer::default();
        session.send("hello", &mut renderer).await.unwrap();
        assert!(!session.state().has_unsaved_changes());

        let raw = session.storage.get(MESSAGES_KEY).unwrap().unwrap();
        let stored: Vec<Message> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].content, "hello back");
    }

    #[test]
    fn settings_are_persisted() {
        let mut session = ChatSession::new(ScriptedBackend::new(vec![]), config());
        assert!(session.set_dark_mode(None));
        assert!(!session.set_dark_mode(Some(false)));
        assert!(session.set_dark_mode(Some(true)));
        session.set_layout(Layout::Centered);

        assert_eq!(
            session.storage.get(DARK_MODE_KEY).unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(
            session.storage.get(LAYOUT_KEY).unwrap().as_deref(),
            Some("center")
        );
    }

    #[tokio::test]
    async fn clear_session() {
        let mut session = ChatSession::new(ScriptedBackend::answering("reply"), config());
        let mut renderer = RecordingRenderer::default();
        session.send("hello", &mut renderer).await.unwrap();
        assert_eq!(session.stats().message_count, 2);

        session.clear();
        let stats = session.stats();
        assert_eq!(stats.message_count, 0);
        assert_eq!(stats.total_tokens(), 0);
        assert_eq!(
            session.storage.get(MESSAGES_KEY).unwrap().as_deref(),
            Some("[]")
        );
    }
}
