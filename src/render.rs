//! Output rendering for the chat session.
//!
//! This module provides the renderer trait the session drives while a
//! reply is being typed, and a plain-text implementation that writes to
//! stdout with optional ANSI styling.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::chat::SessionState;
use crate::types::Message;
use crate::view::{
    self, DEFAULT_WIDTH, ViewOptions, render_error_banner, render_message, render_transcript,
    render_typing,
};

/// Clears from the cursor to the end of the screen.
const ERASE_BELOW: &str = "\x1b[J";

/// Trait for rendering chat output.
///
/// The session calls `start_typing` once the request is sent, `print_piece`
/// for every revealed piece of the answer, and `finish_typing` when typing
/// stops, whether the answer arrived or the request failed. Every message
/// appended to the conversation is handed to `message_committed` after it
/// has been stored.
pub trait Renderer: Send {
    /// Called when a request goes out; the typing block appears empty.
    fn start_typing(&mut self, state: &SessionState);

    /// Print the next revealed piece of the answer.
    fn print_piece(&mut self, state: &SessionState, piece: &str);

    /// Called when the typing block goes away.
    fn finish_typing(&mut self, state: &SessionState);

    /// Called with each message once it is part of the conversation.
    fn message_committed(&mut self, state: &SessionState, message: &Message);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Returns true if typing should skip to the end.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// On a terminal the typing block is redrawn in place after every piece.
/// When output is redirected only committed messages are written.
pub struct PlainTextRenderer {
    out: Box<dyn Write + Send>,
    use_color: bool,
    width: usize,
    live: bool,
    drawn_rows: usize,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            out: Box::new(io::stdout()),
            use_color,
            width: DEFAULT_WIDTH,
            live: io::stdout().is_terminal(),
            drawn_rows: 0,
            interrupted: None,
        }
    }

    /// Sets the width of the conversation column.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(20);
        self
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    /// Sends output somewhere other than stdout.
    pub fn with_writer(mut self, out: impl Write + Send + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    /// Turns the in-place typing animation on or off.
    pub fn with_live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    /// The view options for the current state.
    pub fn view_options(&self, state: &SessionState) -> ViewOptions {
        ViewOptions {
            use_color: self.use_color,
            dark_mode: state.dark_mode(),
            layout: state.layout(),
            width: self.width,
        }
    }

    /// Prints the conversation starting at the latest assistant reply.
    pub fn print_transcript(&mut self, state: &SessionState) {
        let from = view::scroll_anchor(state.messages()).unwrap_or(0);
        self.print_transcript_from(state, from);
    }

    /// Prints the whole conversation.
    pub fn print_history(&mut self, state: &SessionState) {
        self.print_transcript_from(state, 0);
    }

    fn print_transcript_from(&mut self, state: &SessionState, from: usize) {
        if state.messages().is_empty() {
            return;
        }
        let text = render_transcript(state.messages(), from, &self.view_options(state));
        let _ = writeln!(self.out, "{text}\n");
        self.flush();
    }

    /// Prints the error banner if the current error is still visible.
    pub fn print_banner(&mut self, error: &str, state: &SessionState) {
        let banner = render_error_banner(error, &self.view_options(state));
        eprintln!("{banner}");
    }

    /// Flushes the output to ensure immediate display of typed content.
    fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn draw_typing(&mut self, state: &SessionState) {
        if !self.live {
            return;
        }
        self.erase_typing();
        let block = render_typing(state.displayed_answer(), &self.view_options(state));
        self.drawn_rows = block.split('\n').count();
        let _ = write!(self.out, "{block}");
        self.flush();
    }

    /// Moves back to the first row of the typing block and clears it.
    fn erase_typing(&mut self) {
        if self.drawn_rows == 0 {
            return;
        }
        let _ = write!(self.out, "\r");
        if self.drawn_rows > 1 {
            let _ = write!(self.out, "\x1b[{}A", self.drawn_rows - 1);
        }
        let _ = write!(self.out, "{ERASE_BELOW}");
        self.drawn_rows = 0;
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_typing(&mut self, state: &SessionState) {
        self.draw_typing(state);
    }

    fn print_piece(&mut self, state: &SessionState, _piece: &str) {
        self.draw_typing(state);
    }

    fn finish_typing(&mut self, _state: &SessionState) {
        self.erase_typing();
        self.flush();
    }

    fn message_committed(&mut self, state: &SessionState, message: &Message) {
        let block = render_message(message, &self.view_options(state));
        let _ = writeln!(self.out, "{block}\n");
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        eprintln!("\nError: {error}");
    }

    fn print_info(&mut self, info: &str) {
        let _ = writeln!(self.out, "{info}");
        self.flush();
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
