//! Question/answer extraction from line-oriented text.
//!
//! Lines whose trimmed form starts with `Q:` open a question, lines starting
//! with `A:` add to the answer, and any other non-empty line continues an
//! answer that is already in progress. A bare `A:` starts an answer too, so
//! its text may follow on the next lines. A pair is only emitted once the
//! next question starts (or the input ends), and only when both halves have
//! text. Unanswered questions and continuation lines that precede any answer
//! are dropped.

use crate::defaults::{ANSWER_MARKER, QUESTION_MARKER};
use serde::{Deserialize, Serialize};

/// One question with its answer, both trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    question: String,
    answer: String,
}

impl QaPair {
    /// Build a pair, trimming both halves. Returns `None` if either is blank.
    pub fn new(question: &str, answer: &str) -> Option<Self> {
        let question = question.trim();
        let answer = answer.trim();
        if question.is_empty() || answer.is_empty() {
            return None;
        }
        Some(Self {
            question: question.to_string(),
            answer: answer.to_string(),
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }
}

/// Split raw document text into lines. No other normalization is applied.
pub fn normalize_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
}

/// Single forward pass extractor state.
#[derive(Debug, Default)]
pub struct QaExtractor {
    question: String,
    answer: String,
    /// Set by any `A:` marker, even one with nothing after it.
    answer_started: bool,
    pairs: Vec<QaPair>,
}

impl QaExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_answer_piece(&mut self, piece: &str) {
        self.answer_started = true;
        if piece.is_empty() {
            return;
        }
        self.answer.push_str(piece);
        self.answer.push(' ');
    }

    /// Close the current question/answer once an answer has started.
    ///
    /// Returns true when state was reset. A pair whose answer is still blank
    /// is dropped.
    fn finalize(&mut self) -> bool {
        if self.question.trim().is_empty() || !self.answer_started {
            return false;
        }
        if let Some(pair) = QaPair::new(&self.question, &self.answer) {
            self.pairs.push(pair);
        }
        self.question.clear();
        self.answer.clear();
        self.answer_started = false;
        true
    }

    /// Feed one line of input.
    pub fn feed_line(&mut self, line: &str) {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix(QUESTION_MARKER) {
            self.finalize();
            self.question = rest.trim().to_string();
        } else if let Some(rest) = trimmed.strip_prefix(ANSWER_MARKER) {
            self.push_answer_piece(rest.trim());
        } else if !trimmed.is_empty() && self.answer_started {
            self.push_answer_piece(trimmed);
        }
    }

    /// End the pass and return the pairs in document order.
    pub fn finish(mut self) -> Vec<QaPair> {
        self.finalize();
        self.pairs
    }
}

/// Extract question/answer pairs from raw text.
///
/// An empty result is a normal outcome; callers decide how to report it.
pub fn extract_pairs(text: &str) -> Vec<QaPair> {
    let mut extractor = QaExtractor::new();
    for line in normalize_lines(text) {
        extractor.feed_line(line);
    }
    extractor.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(q: &str, a: &str) -> QaPair {
        QaPair::new(q, a).unwrap()
    }

    #[test]
    fn single_pair() {
        let pairs = extract_pairs("Q: What is X?\nA: X is Y.\n");
        assert_eq!(pairs, vec![pair("What is X?", "X is Y.")]);
    }

    #[test]
    fn unanswered_question_is_dropped() {
        let pairs = extract_pairs("Q: First?\nQ: Second?\nA: Only second answered.\n");
        assert_eq!(pairs, vec![pair("Second?", "Only second answered.")]);
    }

    #[test]
    fn trailing_unanswered_question_is_dropped() {
        let pairs = extract_pairs("Q: One?\nA: Yes.\nQ: Two?\n");
        assert_eq!(pairs, vec![pair("One?", "Yes.")]);
    }

    #[test]
    fn multi_line_answer_is_joined_with_spaces() {
        let pairs = extract_pairs("Q: Q1?\nA: Part one.\nPart two.\n");
        assert_eq!(pairs, vec![pair("Q1?", "Part one. Part two.")]);
    }

    #[test]
    fn repeated_answer_markers_accumulate() {
        let pairs = extract_pairs("Q: Q1?\nA: One.\nA: Two.\n");
        assert_eq!(pairs, vec![pair("Q1?", "One. Two.")]);
    }

    #[test]
    fn continuation_before_answer_is_dropped() {
        let pairs = extract_pairs("Q: Start of question\nrest of question\nA: Answer.\n");
        assert_eq!(pairs, vec![pair("Start of question", "Answer.")]);
    }

    #[test]
    fn blank_lines_inside_answer_are_skipped() {
        let pairs = extract_pairs("Q: Q1?\nA: Part one.\n\n   \nPart two.\n");
        assert_eq!(pairs, vec![pair("Q1?", "Part one. Part two.")]);
    }

    #[test]
    fn markers_are_matched_after_trim() {
        let pairs = extract_pairs("   Q:  Indented?  \n\tA:   Yes.  \n");
        assert_eq!(pairs, vec![pair("Indented?", "Yes.")]);
    }

    #[test]
    fn markers_are_case_sensitive() {
        let pairs = extract_pairs("q: lower?\na: lower.\n");
        assert!(pairs.is_empty());
    }

    #[test]
    fn marker_must_be_at_line_start() {
        let pairs = extract_pairs("Note Q: not a question\nQ: Real?\nA: Real answer. A: inline\n");
        assert_eq!(pairs, vec![pair("Real?", "Real answer. A: inline")]);
    }

    #[test]
    fn crlf_line_endings() {
        let pairs = extract_pairs("Q: One?\r\nA: Yes.\r\nQ: Two?\r\nA: No.\r\n");
        assert_eq!(pairs, vec![pair("One?", "Yes."), pair("Two?", "No.")]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(extract_pairs("").is_empty());
        assert!(extract_pairs("\n\n  \n").is_empty());
    }

    #[test]
    fn text_without_markers_yields_nothing() {
        assert!(extract_pairs("Just some notes.\nNothing labelled here.\n").is_empty());
    }

    #[test]
    fn bare_answer_marker_takes_text_from_following_lines() {
        let pairs = extract_pairs(
            "Q: Explain ownership?\nA:\nEach value has one owner.\nQ: Next?\nA: Yes.\n",
        );
        assert_eq!(
            pairs,
            vec![
                pair("Explain ownership?", "Each value has one owner."),
                pair("Next?", "Yes.")
            ]
        );
    }

    #[test]
    fn bare_answer_marker_without_text_drops_the_pair() {
        let pairs = extract_pairs("Q: One?\nA:\nQ: Two?\nA: Yes.\n");
        assert_eq!(pairs, vec![pair("Two?", "Yes.")]);
    }

    #[test]
    fn answer_before_any_question_carries_into_next_pair() {
        let pairs = extract_pairs("A: stray\nQ: One?\nA: proper\n");
        assert_eq!(pairs, vec![pair("One?", "stray proper")]);
    }

    #[test]
    fn pairs_keep_document_order_and_duplicates() {
        let text = "Q: B?\nA: b\nQ: A?\nA: a\nQ: B?\nA: b\n";
        let pairs = extract_pairs(text);
        let questions: Vec<&str> = pairs.iter().map(|p| p.question()).collect();
        assert_eq!(questions, vec!["B?", "A?", "B?"]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "Q: One?\nA: Yes.\nmore\nQ: Two?\nQ: Three?\nA: No.\n";
        assert_eq!(extract_pairs(text), extract_pairs(text));
    }

    #[test]
    fn qa_pair_rejects_blank_halves() {
        assert!(QaPair::new("  ", "answer").is_none());
        assert!(QaPair::new("question", "").is_none());
        assert_eq!(pair(" q ", " a ").question(), "q");
    }

    #[test]
    fn qa_pair_serializes_to_json() {
        let json = serde_json::to_string(&pair("Why?", "Because.")).unwrap();
        assert_eq!(json, r#"{"question":"Why?","answer":"Because."}"#);
    }
}
