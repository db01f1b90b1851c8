//! Simulated typing of a completed answer.
//!
//! The endpoint returns the whole answer at once. To make it read as if it
//! were being typed, the answer is cut into alternating runs of
//! non-whitespace and whitespace and revealed one piece per timer tick.

use std::collections::VecDeque;
use std::time::Duration;

/// Default period between revealed pieces.
pub const DEFAULT_TYPING_INTERVAL: Duration = Duration::from_millis(30);

/// Splits `text` into alternating runs of whitespace and non-whitespace.
///
/// No piece is empty and concatenating the pieces in order yields `text`
/// exactly, including every run of inter-word spacing.
pub fn split_pieces(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (idx, c) in text.char_indices() {
        let space = c.is_whitespace();
        match in_space {
            Some(prev) if prev != space => {
                pieces.push(&text[start..idx]);
                start = idx;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// The state of one typing run.
///
/// `tick` moves the next piece into the displayed buffer. The original
/// answer is kept separately so the committed message never depends on
/// what was accumulated.
#[derive(Debug, Clone)]
pub struct TypingSimulation {
    answer: String,
    pending: VecDeque<String>,
    displayed: String,
}

impl TypingSimulation {
    /// Prepares a run for `answer` with an empty displayed buffer.
    pub fn new(answer: impl Into<String>) -> Self {
        let answer = answer.into();
        let pending = split_pieces(&answer)
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            answer,
            pending,
            displayed: String::new(),
        }
    }

    /// Reveals the next piece and returns it, or `None` once finished.
    pub fn tick(&mut self) -> Option<String> {
        let piece = self.pending.pop_front()?;
        self.displayed.push_str(&piece);
        Some(piece)
    }

    /// Reveals every remaining piece at once and returns them joined.
    pub fn finish(&mut self) -> String {
        let rest: String = self.pending.drain(..).collect();
        self.displayed.push_str(&rest);
        rest
    }

    /// True once every piece has been revealed.
    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// The text revealed so far.
    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    /// Consumes the run, yielding the original answer.
    pub fn into_answer(self) -> String {
        self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_alternates_words_and_spacing() {
        assert_eq!(
            split_pieces("hello  big\tworld\n"),
            vec!["hello", "  ", "big", "\t", "world", "\n"]
        );
        assert_eq!(split_pieces("  lead"), vec!["  ", "lead"]);
        assert_eq!(split_pieces("one"), vec!["one"]);
        assert!(split_pieces("").is_empty());
        assert_eq!(split_pieces("   "), vec!["   "]);
    }

    #[test]
    fn split_is_lossless() {
        let samples = [
            "سلام! چطور می‌توانم کمک کنم؟",
            "# Title\n\n```rust\nfn main() {}\n```\n",
            " \u{00a0}mixed\u{3000}unicode  spacing ",
            "trailing   ",
            "a",
        ];
        for sample in samples {
            assert_eq!(split_pieces(sample).concat(), sample);
        }
    }

    #[test]
    fn zero_width_non_joiner_stays_inside_word() {
        let pieces = split_pieces("می‌توانم کمک");
        assert_eq!(pieces, vec!["می‌توانم", " ", "کمک"]);
    }

    #[test]
    fn ticks_reveal_one_piece_at_a_time() {
        let mut typing = TypingSimulation::new("a b");
        assert!(!typing.is_finished());
        assert_eq!(typing.tick().as_deref(), Some("a"));
        assert_eq!(typing.displayed(), "a");
        assert_eq!(typing.tick().as_deref(), Some(" "));
        assert_eq!(typing.tick().as_deref(), Some("b"));
        assert!(typing.is_finished());
        assert_eq!(typing.tick(), None);
        assert_eq!(typing.displayed(), "a b");
    }

    #[test]
    fn finish_flushes_the_rest() {
        let mut typing = TypingSimulation::new("one two three");
        typing.tick();
        assert_eq!(typing.finish(), " two three");
        assert!(typing.is_finished());
        assert_eq!(typing.displayed(), "one two three");
        assert_eq!(typing.into_answer(), "one two three");
    }
}
