//! Lexer configuration.

/// Tuning knobs for the lexer and the incremental scheduler.
///
/// Construct with [`LexerConfig::default`] and adjust with the `with_*`
/// builders.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LexerConfig {
    /// Documents with more chars than this are lexed in big-file mode.
    pub big_file_threshold: usize,
    /// Lines beyond the last visible line that full passes lex eagerly.
    pub visible_margin: usize,
    /// Lines lexed per full-pass slice before yielding to the host.
    pub yield_interval: usize,
    /// Maximum steps any matching search may take.
    pub search_cap: usize,
    /// Chars examined when recognizing a mode-switch tag.
    pub tag_lookahead: usize,
    /// Master switch for scope and symbol tracking.
    pub track_symbols: bool,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            big_file_threshold: 1_000_000,
            visible_margin: 100,
            yield_interval: 500,
            search_cap: 10_000,
            tag_lookahead: 9,
            track_symbols: true,
        }
    }
}

impl LexerConfig {
    #[must_use]
    pub fn with_big_file_threshold(mut self, chars: usize) -> Self {
        self.big_file_threshold = chars;
        self
    }

    #[must_use]
    pub fn with_visible_margin(mut self, lines: usize) -> Self {
        self.visible_margin = lines;
        self
    }

    /// Set the full-pass slice size. Zero is clamped to one.
    #[must_use]
    pub fn with_yield_interval(mut self, lines: usize) -> Self {
        self.yield_interval = lines.max(1);
        self
    }

    #[must_use]
    pub fn with_search_cap(mut self, steps: usize) -> Self {
        self.search_cap = steps;
        self
    }

    #[must_use]
    pub fn with_tag_lookahead(mut self, chars: usize) -> Self {
        self.tag_lookahead = chars;
        self
    }

    #[must_use]
    pub fn with_symbols(mut self, enabled: bool) -> Self {
        self.track_symbols = enabled;
        self
    }

    /// Whether a document of `char_count` chars counts as big.
    #[must_use]
    pub fn is_big(&self, char_count: usize) -> bool {
        char_count > self.big_file_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = LexerConfig::default();
        assert_eq!(c.visible_margin, 100);
        assert_eq!(c.tag_lookahead, 9);
        assert!(c.track_symbols);
    }

    #[test]
    fn builders_chain() {
        let c = LexerConfig::default()
            .with_big_file_threshold(10)
            .with_yield_interval(0)
            .with_search_cap(5)
            .with_symbols(false);
        assert!(c.is_big(11));
        assert!(!c.is_big(10));
        assert_eq!(c.yield_interval, 1);
        assert_eq!(c.search_cap, 5);
        assert!(!c.track_symbols);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_uses_defaults() {
        let c: LexerConfig = serde_json::from_str(r#"{"visible_margin": 7}"#).unwrap();
        assert_eq!(c.visible_margin, 7);
        assert_eq!(c.yield_interval, 500);
    }
}
