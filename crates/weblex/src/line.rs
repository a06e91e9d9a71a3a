//! Single-line driver.
//!
//! [`LineLexer::lex_line`] runs the mode switcher and the per-language
//! tokenizers over one line of text, starting from the previous line's end
//! state, and returns everything the store keeps for that line.

use weblex_core::{DocumentKind, FormatRange, LanguageTables, Mode, StyleClass, chars};

use crate::html::TagMark;
use crate::scope::{LineSymbols, ScopeLang, ScopeMark, ScopeTracker};
use crate::state::{LexState, StateTag};
use crate::{css, html, js, php, switcher};

/// Optional work toggled off in big-file mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexFlags {
    /// Scope stacks and symbol records.
    pub track_scopes: bool,
    /// Colors, selectors and constant-name styling.
    pub cosmetic: bool,
}

impl LexFlags {
    pub const FULL: Self = Self {
        track_scopes: true,
        cosmetic: true,
    };

    /// Only mode, string and comment boundaries.
    pub const MINIMAL: Self = Self {
        track_scopes: false,
        cosmetic: false,
    };
}

impl Default for LexFlags {
    fn default() -> Self {
        Self::FULL
    }
}

/// `[start, end)` of a line governed by `mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSpan {
    pub start: usize,
    pub end: usize,
    pub mode: Mode,
}

impl ModeSpan {
    #[must_use]
    pub const fn contains(&self, col: usize) -> bool {
        col >= self.start && col < self.end
    }
}

/// From `col` onward the active mode and its open construct are these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMark {
    pub col: usize,
    pub mode: Mode,
    pub tag: StateTag,
}

/// Everything kept for one lexed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineData {
    pub end_state: LexState,
    pub ranges: Vec<FormatRange>,
    pub mode_spans: Vec<ModeSpan>,
    /// First mark is always at column 0.
    pub state_marks: Vec<StateMark>,
    pub scope_marks: Vec<ScopeMark>,
    pub tag_marks: Vec<TagMark>,
    pub symbols: LineSymbols,
    /// Line length in chars.
    pub len: usize,
}

impl LineData {
    /// Mode governing `col`. Past the end of the line this is the mode the
    /// line ends in.
    #[must_use]
    pub fn mode_at(&self, col: usize) -> Mode {
        self.mode_spans
            .iter()
            .find(|span| span.contains(col))
            .map_or(self.end_state.mode, |span| span.mode)
    }

    /// Active mode and open construct at `col`.
    #[must_use]
    pub fn state_mark_at(&self, col: usize) -> Option<&StateMark> {
        self.state_marks.iter().rev().find(|m| m.col <= col)
    }
}

// ---------------------------------------------------------------------------
// Tokenizer seam
// ---------------------------------------------------------------------------

/// One embedded language's state machine.
pub(crate) trait Tokenizer {
    /// Consume the construct at `i` (at most one state transition) and return
    /// the position after it.
    fn step(cx: &mut LineCx<'_>, i: usize) -> usize;

    /// Close constructs that cannot continue past the end of `chars`.
    fn end_line(state: &mut LexState, chars: &[char]);
}

/// Fallback for unknown file types: punctuation only.
struct Plain;

impl Tokenizer for Plain {
    fn step(cx: &mut LineCx<'_>, i: usize) -> usize {
        let c = cx.chars[i];
        if c.is_ascii_punctuation() {
            cx.push_range(i, i + 1, StyleClass::Punctuation);
            return i + 1;
        }
        cx.scan_while(i, |c| !c.is_ascii_punctuation())
    }

    fn end_line(_: &mut LexState, _: &[char]) {}
}

// ---------------------------------------------------------------------------
// LineCx
// ---------------------------------------------------------------------------

/// Working context for one line.
pub(crate) struct LineCx<'a> {
    pub chars: &'a [char],
    pub tables: &'a LanguageTables,
    pub flags: LexFlags,
    pub kind: DocumentKind,
    pub lookahead: usize,
    pub state: LexState,
    pub ranges: Vec<FormatRange>,
    pub mode_spans: Vec<ModeSpan>,
    pub state_marks: Vec<StateMark>,
    pub scope_marks: Vec<ScopeMark>,
    pub tag_marks: Vec<TagMark>,
    pub symbols: LineSymbols,
    /// Column where the current HTML tag opened, if on this line.
    pub tag_start: Option<usize>,
    span_start: usize,
}

impl<'a> LineCx<'a> {
    fn new(chars: &'a [char], lexer: &LineLexer<'a>, state: LexState) -> Self {
        Self {
            chars,
            tables: lexer.tables,
            flags: lexer.flags,
            kind: lexer.kind,
            lookahead: lexer.lookahead,
            state,
            ranges: Vec::new(),
            mode_spans: Vec::new(),
            state_marks: Vec::new(),
            scope_marks: Vec::new(),
            tag_marks: Vec::new(),
            symbols: LineSymbols::default(),
            tag_start: None,
            span_start: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    pub fn at(&self, i: usize) -> Option<char> {
        self.chars.get(i).copied()
    }

    #[inline]
    pub fn starts_with(&self, i: usize, pat: &str) -> bool {
        chars::starts_with_at(self.chars, i, pat, false)
    }

    /// Add a style range, merging with the previous one when adjacent and
    /// of the same style. Text ranges are implicit.
    pub fn push_range(&mut self, start: usize, end: usize, style: StyleClass) {
        let end = end.min(self.chars.len());
        if end <= start || style == StyleClass::Text {
            return;
        }
        if let Some(last) = self.ranges.last_mut()
            && last.style == style
            && last.end() == start
        {
            last.length += end - start;
            return;
        }
        self.ranges.push(FormatRange::new(start, end - start, style));
    }

    /// First index at or after `i` where `pred` fails.
    pub fn scan_while(&self, mut i: usize, pred: impl Fn(char) -> bool) -> usize {
        while i < self.chars.len() && pred(self.chars[i]) {
            i += 1;
        }
        i
    }

    /// Next non-whitespace char at or after `i`.
    pub fn next_significant(&self, i: usize) -> Option<(usize, char)> {
        let j = chars::skip_whitespace(self.chars, i);
        self.at(j).map(|c| (j, c))
    }

    /// End of a literal or comment body scanned from `from` up to `end`.
    ///
    /// In mixed documents the body stops before a `<` so the switcher can
    /// see embedded tags.
    pub fn body_end(&self, from: usize, end: usize) -> usize {
        if !self.kind.is_mixed() {
            return end;
        }
        (from + 1..end)
            .find(|&k| self.chars[k] == '<')
            .unwrap_or(end)
    }

    /// Scope sink for `lang`.
    pub fn tracker(&mut self, lang: ScopeLang) -> ScopeTracker<'_> {
        let stack = match lang {
            ScopeLang::Php => &mut self.state.php.scopes,
            ScopeLang::Js => &mut self.state.js.scopes,
            ScopeLang::Css => &mut self.state.css.scopes,
        };
        ScopeTracker::new(
            stack,
            &mut self.scope_marks,
            &mut self.symbols,
            lang,
            self.flags.track_scopes,
        )
    }

    /// Switch to `mode` with the boundary at `at`.
    pub fn switch_mode(&mut self, mode: Mode, at: usize) {
        if at > self.span_start {
            self.mode_spans.push(ModeSpan {
                start: self.span_start,
                end: at,
                mode: self.state.mode,
            });
            self.span_start = at;
        }
        self.state.mode = mode;
        self.mark_state(at);
    }

    /// Record the current mode and construct from `col` on, if changed.
    pub fn mark_state(&mut self, col: usize) {
        let mode = self.state.mode;
        let tag = self.state.state_tag();
        if let Some(last) = self.state_marks.last_mut() {
            if last.mode == mode && last.tag == tag {
                return;
            }
            if col <= last.col {
                last.mode = mode;
                last.tag = tag;
                return;
            }
        }
        self.state_marks.push(StateMark { col, mode, tag });
    }

    fn finish(mut self, len: usize) -> LineData {
        if len > self.span_start {
            self.mode_spans.push(ModeSpan {
                start: self.span_start,
                end: len,
                mode: self.state.mode,
            });
        }
        html::Html::end_line(&mut self.state, self.chars);
        css::Css::end_line(&mut self.state, self.chars);
        js::Js::end_line(&mut self.state, self.chars);
        php::Php::end_line(&mut self.state, self.chars);
        LineData {
            end_state: self.state,
            ranges: self.ranges,
            mode_spans: self.mode_spans,
            state_marks: self.state_marks,
            scope_marks: self.scope_marks,
            tag_marks: self.tag_marks,
            symbols: self.symbols,
            len,
        }
    }
}

// ---------------------------------------------------------------------------
// LineLexer
// ---------------------------------------------------------------------------

/// Lexes single lines of one document kind.
#[derive(Debug, Clone, Copy)]
pub struct LineLexer<'t> {
    tables: &'t LanguageTables,
    kind: DocumentKind,
    flags: LexFlags,
    lookahead: usize,
}

impl<'t> LineLexer<'t> {
    #[must_use]
    pub fn new(tables: &'t LanguageTables, kind: DocumentKind) -> Self {
        Self {
            tables,
            kind,
            flags: LexFlags::FULL,
            lookahead: 9,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: LexFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Bound on chars examined when recognizing a mode-switch tag.
    #[must_use]
    pub fn with_lookahead(mut self, chars: usize) -> Self {
        self.lookahead = chars;
        self
    }

    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Start state of the first line.
    #[must_use]
    pub fn initial_state(&self) -> LexState {
        LexState::new(self.kind.initial_mode())
    }

    /// Lex `text` starting from `incoming`.
    #[must_use]
    pub fn lex_line(&self, text: &str, incoming: &LexState) -> LineData {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut cx = LineCx::new(&chars, self, incoming.clone());
        cx.mark_state(0);

        let mixed = self.kind.is_mixed();
        let mut last_switch = None;
        let mut i = 0;
        while i < len {
            if mixed
                && last_switch != Some(i)
                && let Some(switch) = switcher::try_switch(&mut cx, i)
            {
                last_switch = Some(switch.next);
                i = switch.next;
                continue;
            }
            let in_body = cx.state.state_tag().is_body();
            let next = match cx.state.mode {
                Mode::Html => html::Html::step(&mut cx, i),
                Mode::Css => css::Css::step(&mut cx, i),
                Mode::Js => js::Js::step(&mut cx, i),
                Mode::Php => php::Php::step(&mut cx, i),
                Mode::Unknown => Plain::step(&mut cx, i),
            };
            let next = next.max(i + 1);
            cx.mark_state(if in_body { next } else { i });
            i = next;
        }
        cx.finish(len)
    }
}
