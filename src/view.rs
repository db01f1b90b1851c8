//! Pure rendering of the conversation to terminal text.
//!
//! Nothing in this module writes to the terminal. Every function takes the
//! state it needs by reference and returns a `String`, which keeps layout
//! decisions testable. [`crate::render`] does the actual printing.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::chat::SessionStats;
use crate::types::{Layout, Message, MessageRole};

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text.
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text.
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code for underlined text.
const ANSI_UNDERLINE: &str = "\x1b[4m";

/// ANSI escape code for slow blink (typing cursor).
const ANSI_BLINK: &str = "\x1b[5m";

/// ANSI escape code for struck-through text.
const ANSI_STRIKE: &str = "\x1b[9m";

/// The glyph drawn after the partial answer while typing.
pub const TYPING_CURSOR: &str = "|";

/// Default width of the conversation column.
pub const DEFAULT_WIDTH: usize = 80;

/// Colors used for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Message body text.
    pub text: &'static str,
    /// Headings.
    pub heading: &'static str,
    /// Inline code and code blocks.
    pub code: &'static str,
    /// Role labels and chrome.
    pub muted: &'static str,
    /// User message border.
    pub border: &'static str,
    /// Typing block text.
    pub typing: &'static str,
    /// Error banner.
    pub error: &'static str,
}

impl Palette {
    /// Light-on-dark colors.
    pub const DARK: Palette = Palette {
        text: "\x1b[97m",
        heading: "\x1b[94m",
        code: "\x1b[93m",
        muted: "\x1b[90m",
        border: "\x1b[90m",
        typing: "\x1b[37m",
        error: "\x1b[91m",
    };

    /// Dark-on-light colors.
    pub const LIGHT: Palette = Palette {
        text: "\x1b[30m",
        heading: "\x1b[34m",
        code: "\x1b[35m",
        muted: "\x1b[90m",
        border: "\x1b[37m",
        typing: "\x1b[90m",
        error: "\x1b[31m",
    };
}

/// Everything that affects how a message looks besides the message itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Emit ANSI styling.
    pub use_color: bool,
    /// Dark or light palette.
    pub dark_mode: bool,
    /// Centered or side-aligned blocks.
    pub layout: Layout,
    /// Width of the conversation column.
    pub width: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            use_color: true,
            dark_mode: false,
            layout: Layout::default(),
            width: DEFAULT_WIDTH,
        }
    }
}

impl ViewOptions {
    /// The palette for the current theme.
    pub fn palette(&self) -> Palette {
        if self.dark_mode {
            Palette::DARK
        } else {
            Palette::LIGHT
        }
    }
}

/// Number of visible characters in `s`, ignoring ANSI escape sequences.
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

/// Index of the message the view scrolls to: the latest assistant reply.
pub fn scroll_anchor(messages: &[Message]) -> Option<usize> {
    messages
        .iter()
        .rposition(|message| message.role == MessageRole::Assistant)
}

/// Renders markdown `content` to terminal text.
///
/// Headings, code blocks, inline code, emphasis, strong text, lists,
/// quotes and rules are styled with ANSI codes when `use_color` is set and
/// reduced to plain-text conventions otherwise.
pub fn render_markdown(content: &str, options: &ViewOptions) -> String {
    let mut writer = MarkdownWriter::new(options);
    let parser = Parser::new_ext(content, Options::ENABLE_STRIKETHROUGH);
    for event in parser {
        writer.event(event);
    }
    writer.finish()
}

struct MarkdownWriter {
    use_color: bool,
    palette: Palette,
    out: String,
    styles: Vec<&'static str>,
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    in_code_block: bool,
    at_line_start: bool,
    after_marker: bool,
    block_gap: bool,
}

impl MarkdownWriter {
    fn new(options: &ViewOptions) -> Self {
        Self {
            use_color: options.use_color,
            palette: options.palette(),
            out: String::new(),
            styles: Vec::new(),
            lists: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
            at_line_start: true,
            after_marker: false,
            block_gap: false,
        }
    }

    fn push_style(&mut self, code: &'static str) {
        self.styles.push(code);
        if self.use_color {
            self.out.push_str(code);
        }
    }

    fn pop_style(&mut self) {
        self.styles.pop();
        if self.use_color {
            self.out.push_str(ANSI_RESET);
            for code in &self.styles {
                self.out.push_str(code);
            }
        }
    }

    fn newline(&mut self) {
        if self.use_color && !self.styles.is_empty() {
            self.out.push_str(ANSI_RESET);
        }
        self.out.push('\n');
        self.at_line_start = true;
    }

    fn start_block(&mut self) {
        if self.after_marker {
            self.after_marker = false;
            return;
        }
        if !self.at_line_start {
            self.newline();
        }
        if self.block_gap && self.lists.is_empty() {
            self.newline();
        }
        self.block_gap = false;
    }

    fn line_prefix(&mut self) {
        if !self.at_line_start {
            return;
        }
        self.at_line_start = false;
        if self.use_color && !self.styles.is_empty() {
            self.out.push_str(ANSI_RESET);
        }
        for _ in 0..self.quote_depth {
            self.out.push_str("> ");
        }
        if self.in_code_block {
            self.out.push_str("    ");
        }
        if self.use_color {
            for code in &self.styles {
                self.out.push_str(code);
            }
        }
    }

    fn text(&mut self, text: &str) {
        for (idx, line) in text.split('\n').enumerate() {
            if idx > 0 {
                self.newline();
            }
            if !line.is_empty() {
                self.line_prefix();
                self.out.push_str(line);
                self.after_marker = false;
            }
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.start_block();
                self.push_style(self.palette.heading);
                self.push_style(ANSI_BOLD);
                if level == HeadingLevel::H1 {
                    self.push_style(ANSI_UNDERLINE);
                }
                if !self.use_color {
                    let hashes = "#".repeat(heading_depth(level));
                    self.text(&format!("{hashes} "));
                }
            }
            Event::End(TagEnd::Heading(level)) => {
                if level == HeadingLevel::H1 {
                    self.pop_style();
                }
                self.pop_style();
                self.pop_style();
                self.block_gap = true;
            }
            Event::Start(Tag::Paragraph) => {
                self.start_block();
            }
            Event::End(TagEnd::Paragraph) => {
                self.block_gap = true;
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.start_block();
                if let CodeBlockKind::Fenced(lang) = &kind
                    && !lang.is_empty()
                {
                    self.line_prefix();
                    if self.use_color {
                        self.out.push_str(self.palette.muted);
                        self.out.push_str(lang);
                        self.out.push_str(ANSI_RESET);
                    } else {
                        self.out.push_str(&format!("[{lang}]"));
                    }
                    self.newline();
                }
                self.in_code_block = true;
                self.push_style(self.palette.code);
            }
            Event::End(TagEnd::CodeBlock) => {
                self.pop_style();
                self.in_code_block = false;
                if self.out.ends_with('\n') {
                    self.at_line_start = true;
                }
                self.block_gap = true;
            }
            Event::Start(Tag::List(start)) => {
                self.start_block();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.block_gap = true;
                }
            }
            Event::Start(Tag::Item) => {
                if !self.at_line_start {
                    self.newline();
                }
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.line_prefix();
                self.out.push_str(&"  ".repeat(depth));
                self.out.push_str(&marker);
                self.after_marker = true;
            }
            Event::End(TagEnd::Item) => {
                if !self.at_line_start {
                    self.newline();
                }
            }
            Event::Start(Tag::BlockQuote(..)) => {
                self.start_block();
                self.quote_depth += 1;
                self.push_style(ANSI_DIM);
            }
            Event::End(TagEnd::BlockQuote(..)) => {
                self.pop_style();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.block_gap = true;
            }
            Event::Start(Tag::Emphasis) => self.push_style(ANSI_ITALIC),
            Event::End(TagEnd::Emphasis) => self.pop_style(),
            Event::Start(Tag::Strong) => self.push_style(ANSI_BOLD),
            Event::End(TagEnd::Strong) => self.pop_style(),
            Event::Start(Tag::Strikethrough) => self.push_style(ANSI_STRIKE),
            Event::End(TagEnd::Strikethrough) => self.pop_style(),
            Event::Start(Tag::Link { .. }) => self.push_style(ANSI_UNDERLINE),
            Event::End(TagEnd::Link) => self.pop_style(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                if self.use_color {
                    self.line_prefix();
                    self.push_style(self.palette.code);
                    self.out.push_str(&code);
                    self.pop_style();
                } else {
                    self.text(&format!("`{code}`"));
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.newline(),
            Event::Rule => {
                self.start_block();
                self.line_prefix();
                self.out.push_str(&"─".repeat(24));
                self.newline();
                self.block_gap = true;
            }
            _ => {}
        }
    }

    fn finish(mut self) -> String {
        if self.use_color && !self.styles.is_empty() {
            self.out.push_str(ANSI_RESET);
        }
        while self.out.ends_with('\n') {
            self.out.pop();
        }
        self.out
    }
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn role_label(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "you",
        MessageRole::Assistant => "assistant",
        MessageRole::System => "system",
    }
}

/// Left padding for a block of `block_width` visible columns.
fn indent_for(role: MessageRole, block_width: usize, options: &ViewOptions) -> usize {
    let room = options.width.saturating_sub(block_width);
    match (options.layout, role) {
        (Layout::Centered, _) => room / 2,
        (Layout::Side, MessageRole::User) => room,
        (Layout::Side, _) => 0,
    }
}

fn label_line(role: MessageRole, options: &ViewOptions) -> String {
    let label = role_label(role);
    if options.use_color {
        format!("{}{label}{ANSI_RESET}", options.palette().muted)
    } else {
        format!("[{label}]")
    }
}

/// Hard-wraps `text` into lines of at most `width` characters.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let chars: Vec<char> = raw.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(width) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}

fn place_block(lines: &[String], role: MessageRole, options: &ViewOptions) -> String {
    let block_width = lines.iter().map(|l| visible_width(l)).max().unwrap_or(0);
    let indent = " ".repeat(indent_for(role, block_width, options));
    lines
        .iter()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders one stored message as a labelled, aligned block.
pub fn render_message(message: &Message, options: &ViewOptions) -> String {
    let palette = options.palette();
    let body = render_markdown(&message.content, options);
    let mut lines = vec![label_line(message.role, options)];
    for line in body.split('\n') {
        let line = if message.role == MessageRole::User {
            if options.use_color {
                format!("{}│{ANSI_RESET} {line}", palette.border)
            } else {
                format!("| {line}")
            }
        } else if options.use_color && !line.is_empty() {
            format!("{}{line}{ANSI_RESET}", palette.text)
        } else {
            line.to_string()
        };
        lines.push(line);
    }
    place_block(&lines, message.role, options)
}

/// Renders `messages[from..]`, preceded by a note when earlier ones are hidden.
pub fn render_transcript(messages: &[Message], from: usize, options: &ViewOptions) -> String {
    let from = from.min(messages.len());
    let mut blocks = Vec::new();
    if from > 0 {
        let note = format!("({from} earlier messages hidden; /history shows all)");
        if options.use_color {
            blocks.push(format!("{}{note}{ANSI_RESET}", options.palette().muted));
        } else {
            blocks.push(note);
        }
    }
    for message in &messages[from..] {
        blocks.push(render_message(message, options));
    }
    blocks.join("\n\n")
}

/// Renders the typing block: an assistant label, the partial answer
/// wrapped to the column, and the cursor after the last character.
///
/// The text is raw, not markdown. Every line of the result occupies one
/// terminal row, so the block can be erased by moving up its line count.
pub fn render_typing(displayed: &str, options: &ViewOptions) -> String {
    let palette = options.palette();
    let body = wrap_text(displayed, options.width.saturating_sub(1));
    let last = body.len() - 1;
    let mut lines = vec![label_line(MessageRole::Assistant, options)];
    for (idx, line) in body.into_iter().enumerate() {
        let mut line = if options.use_color && !line.is_empty() {
            format!("{}{ANSI_ITALIC}{line}{ANSI_RESET}", palette.typing)
        } else {
            line
        };
        if idx == last {
            if options.use_color {
                line.push_str(&format!("{ANSI_BLINK}{TYPING_CURSOR}{ANSI_RESET}"));
            } else {
                line.push_str(TYPING_CURSOR);
            }
        }
        lines.push(line);
    }
    place_block(&lines, MessageRole::Assistant, options)
}

/// Renders the token summary line.
pub fn render_info_bar(stats: &SessionStats) -> String {
    format!(
        "input tokens: {} | output tokens: {} | total: {}",
        stats.total_input_tokens,
        stats.total_output_tokens,
        stats.total_tokens()
    )
}

/// Renders an error banner.
pub fn render_error_banner(error: &str, options: &ViewOptions) -> String {
    if options.use_color {
        format!("{}{ANSI_BOLD}! {error}{ANSI_RESET}", options.palette().error)
    } else {
        format!("! {error}")
    }
}
