//! Host boundary: the text being highlighted and pass callbacks.

use std::borrow::Cow;

/// Read access to the host's lines. Line terminators are not part of the
/// line text.
pub trait Document {
    fn line_count(&self) -> usize;

    /// Text of `line`; empty past the end.
    fn line_text(&self, line: usize) -> Cow<'_, str>;

    /// Total chars, used for the big-file threshold.
    fn char_count(&self) -> usize {
        (0..self.line_count())
            .map(|line| self.line_text(line).chars().count())
            .sum()
    }
}

/// Callbacks during a full-document pass.
pub trait HighlightObserver {
    /// Coarse progress, 0 to 100.
    fn on_progress(&mut self, _percent: u8) {}

    /// Checked at every yield point; `false` cancels the pass.
    fn is_alive(&self) -> bool {
        true
    }
}

impl HighlightObserver for () {}

/// In-memory document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextDocument {
    lines: Vec<String>,
}

impl TextDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Split on `\n`, dropping a trailing `\r`. An empty text has one empty
    /// line.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
        Self { lines }
    }

    #[must_use]
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Replace the text of `line`; returns whether it existed.
    pub fn set_line(&mut self, line: usize, text: impl Into<String>) -> bool {
        match self.lines.get_mut(line) {
            Some(slot) => {
                *slot = text.into();
                true
            }
            None => false,
        }
    }

    /// Insert before `at` (append when `at` is past the end).
    pub fn insert_line(&mut self, at: usize, text: impl Into<String>) {
        let at = at.min(self.lines.len());
        self.lines.insert(at, text.into());
    }

    pub fn remove_line(&mut self, line: usize) -> Option<String> {
        (line < self.lines.len()).then(|| self.lines.remove(line))
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

impl Document for TextDocument {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_text(&self, line: usize) -> Cow<'_, str> {
        self.lines
            .get(line)
            .map_or(Cow::Borrowed(""), |l| Cow::Borrowed(l.as_str()))
    }
}

impl Document for [String] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line_text(&self, line: usize) -> Cow<'_, str> {
        self.get(line)
            .map_or(Cow::Borrowed(""), |l| Cow::Borrowed(l.as_str()))
    }
}

impl Document for [&str] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line_text(&self, line: usize) -> Cow<'_, str> {
        Cow::Borrowed(self.get(line).copied().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_splits_lines() {
        let doc = TextDocument::from_text("a\r\nb\n");
        assert_eq!(doc.lines(), ["a", "b", ""]);
        assert_eq!(doc.to_text(), "a\nb\n");
        assert_eq!(TextDocument::from_text("").line_count(), 1);
    }

    #[test]
    fn editing() {
        let mut doc = TextDocument::from_lines(["one", "two"]);
        assert!(doc.set_line(1, "2"));
        assert!(!doc.set_line(9, "x"));
        doc.insert_line(0, "zero");
        doc.insert_line(99, "end");
        assert_eq!(doc.remove_line(1).as_deref(), Some("one"));
        assert_eq!(doc.remove_line(9), None);
        assert_eq!(doc.lines(), ["zero", "2", "end"]);
    }

    #[test]
    fn char_count_counts_chars() {
        let lines = ["héllo", "", "ab"];
        assert_eq!(lines[..].char_count(), 7);
        assert_eq!(lines[..].line_text(5), "");
    }

    #[test]
    fn unit_observer_is_alive() {
        let mut obs = ();
        obs.on_progress(50);
        assert!(obs.is_alive());
    }
}
