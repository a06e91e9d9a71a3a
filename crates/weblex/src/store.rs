//! Per-line state store.
//!
//! A flat arena indexed by line number. `None` marks a line that has never
//! been lexed (or whose record was dropped by an edit); it is distinct from
//! every real [`LexState`]. Insertions and deletions splice the arena, so
//! the records of untouched lines move with their text.

use crate::line::LineData;
use crate::state::LexState;

#[derive(Debug, Clone, Default)]
pub struct LineStore {
    lines: Vec<Option<LineData>>,
    /// Lines at or after this index wait for the visible window to reach
    /// them.
    deferred_from: Option<usize>,
}

impl LineStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn get(&self, line: usize) -> Option<&LineData> {
        self.lines.get(line)?.as_ref()
    }

    /// Whether `line` has a record.
    #[must_use]
    pub fn is_lexed(&self, line: usize) -> bool {
        self.get(line).is_some()
    }

    /// Start state for lexing `line`: the end state of the line before it.
    /// `None` for the first line or when that line was never lexed.
    #[must_use]
    pub fn load(&self, line: usize) -> Option<&LexState> {
        let prev = line.checked_sub(1)?;
        self.get(prev).map(|data| &data.end_state)
    }

    /// Replace the record of `line`. Out-of-range lines are ignored.
    pub fn save(&mut self, line: usize, data: LineData) {
        if let Some(slot) = self.lines.get_mut(line) {
            *slot = Some(data);
        }
    }

    /// Drop the record of `line`.
    pub fn invalidate(&mut self, line: usize) {
        if let Some(slot) = self.lines.get_mut(line) {
            *slot = None;
        }
    }

    /// Grow with unlexed slots or truncate to `len` lines.
    pub fn resize(&mut self, len: usize) {
        self.lines.resize(len, None);
        if self.deferred_from.is_some_and(|d| d >= len) {
            self.deferred_from = None;
        }
    }

    /// `count` unlexed lines now start at `at`.
    pub fn insert_lines(&mut self, at: usize, count: usize) {
        let at = at.min(self.lines.len());
        self.lines
            .splice(at..at, std::iter::repeat_n(None, count));
        if let Some(d) = self.deferred_from.as_mut()
            && *d > at
        {
            *d += count;
        }
    }

    /// Lines `[at, at + count)` were removed.
    pub fn remove_lines(&mut self, at: usize, count: usize) {
        let at = at.min(self.lines.len());
        let end = at.saturating_add(count).min(self.lines.len());
        self.lines.drain(at..end);
        let removed = end - at;
        if let Some(d) = self.deferred_from {
            let shifted = if d >= end {
                d - removed
            } else {
                d.min(at)
            };
            self.deferred_from = (shifted < self.lines.len()).then_some(shifted);
        }
    }

    #[must_use]
    pub fn deferred_from(&self) -> Option<usize> {
        self.deferred_from
    }

    /// Mark lines from `line` on as waiting for the visible window.
    pub fn defer_from(&mut self, line: Option<usize>) {
        self.deferred_from = line.filter(|&l| l < self.lines.len());
    }

    /// Forget every record, keeping the line count.
    pub fn clear(&mut self) {
        let len = self.lines.len();
        self.lines.clear();
        self.lines.resize(len, None);
        self.deferred_from = None;
    }

    /// Records in document order, with their line numbers.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &LineData)> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(n, data)| data.as_ref().map(|d| (n, d)))
    }
}

#[cfg(test)]
mod tests {
    use weblex_core::{DocumentKind, LanguageTables, Mode};

    use super::*;
    use crate::line::LineLexer;

    fn record(text: &str) -> LineData {
        let tables = LanguageTables::builtin();
        let lexer = LineLexer::new(&tables, DocumentKind::Js);
        lexer.lex_line(text, &lexer.initial_state())
    }

    fn store_of(len: usize) -> LineStore {
        let mut store = LineStore::new();
        store.resize(len);
        store
    }

    #[test]
    fn load_reads_previous_line() {
        let mut store = store_of(3);
        assert!(store.load(0).is_none());
        assert!(store.load(1).is_none());
        store.save(0, record("/* open"));
        let state = store.load(1).map(|s| s.state_tag());
        assert_eq!(state, Some(crate::state::StateTag::CommentMlJs));
        assert_eq!(store.load(1).map(|s| s.mode), Some(Mode::Js));
    }

    #[test]
    fn save_out_of_range_is_ignored() {
        let mut store = store_of(1);
        store.save(5, record("x"));
        assert_eq!(store.len(), 1);
        assert!(!store.is_lexed(0));
    }

    #[test]
    fn insert_and_remove_splice_records() {
        let mut store = store_of(3);
        store.save(0, record("a"));
        store.save(2, record("c"));
        store.insert_lines(1, 2);
        assert_eq!(store.len(), 5);
        assert!(store.is_lexed(0));
        assert!(!store.is_lexed(1));
        assert!(store.is_lexed(4));

        store.remove_lines(1, 3);
        assert_eq!(store.len(), 2);
        assert!(store.is_lexed(0));
        assert!(store.is_lexed(1));
        assert_eq!(store.iter().count(), 2);
    }

    #[test]
    fn deferred_marker_follows_edits() {
        let mut store = store_of(10);
        store.defer_from(Some(6));
        store.insert_lines(2, 3);
        assert_eq!(store.deferred_from(), Some(9));
        store.insert_lines(9, 1);
        assert_eq!(store.deferred_from(), Some(9));
        store.remove_lines(0, 2);
        assert_eq!(store.deferred_from(), Some(7));
        store.remove_lines(5, 4);
        assert_eq!(store.deferred_from(), Some(5));
        store.resize(5);
        assert_eq!(store.deferred_from(), None);
    }

    #[test]
    fn clear_keeps_length() {
        let mut store = store_of(2);
        store.save(1, record("b"));
        store.defer_from(Some(1));
        store.clear();
        assert_eq!(store.len(), 2);
        assert!(!store.is_lexed(1));
        assert_eq!(store.deferred_from(), None);
    }
}
