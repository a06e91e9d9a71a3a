//! The host-facing facade.
//!
//! A [`Highlighter`] owns the line store and the scheduler of one document.
//! The host keeps the text (any [`Document`]) and passes it to every call
//! that lexes or reads characters; point queries only read stored records.
//!
//! Keyword tables are shared (`Arc`) and never mutated, so any number of
//! highlighters can use one set of tables.

use std::sync::Arc;

use tracing::debug;
use weblex_core::{DocumentKind, FormatRange, LanguageTables, LexerConfig, Mode};

use crate::document::{Document, HighlightObserver};
use crate::html::TagMark;
use crate::line::{LexFlags, LineData, LineLexer, ModeSpan};
use crate::matching;
use crate::scheduler::{PassStatus, Relex, Scheduler};
use crate::scope::{self, Declaration, ScopeEntry, ScopeLang, SymbolTable};
use crate::state::StateTag;
use crate::store::LineStore;

fn lang_of(mode: Mode) -> ScopeLang {
    match mode {
        Mode::Js => ScopeLang::Js,
        Mode::Css => ScopeLang::Css,
        Mode::Html | Mode::Php | Mode::Unknown => ScopeLang::Php,
    }
}

fn lexer_for<'t>(
    tables: &'t LanguageTables,
    kind: DocumentKind,
    flags: LexFlags,
    config: &LexerConfig,
) -> LineLexer<'t> {
    LineLexer::new(tables, kind)
        .with_flags(flags)
        .with_lookahead(config.tag_lookahead)
}

#[derive(Debug, Clone)]
pub struct Highlighter {
    tables: Arc<LanguageTables>,
    config: LexerConfig,
    kind: DocumentKind,
    /// Host override of the big-file decision.
    big_override: Option<bool>,
    /// Threshold decision from the last full pass.
    big_auto: bool,
    store: LineStore,
    scheduler: Scheduler,
    /// Rebuilt from the store on demand.
    symbols: Option<SymbolTable>,
}

impl Highlighter {
    #[must_use]
    pub fn new(tables: Arc<LanguageTables>, config: LexerConfig) -> Self {
        let scheduler = Scheduler::new(&config);
        Self {
            tables,
            config,
            kind: DocumentKind::default(),
            big_override: None,
            big_auto: false,
            store: LineStore::new(),
            scheduler,
            symbols: None,
        }
    }

    /// A highlighter with the built-in tables and default configuration.
    #[must_use]
    pub fn with_builtin_tables() -> Self {
        Self::new(Arc::new(LanguageTables::builtin()), LexerConfig::default())
    }

    #[must_use]
    pub fn with_kind(mut self, kind: DocumentKind) -> Self {
        self.kind = kind;
        self
    }

    // -- lifecycle -----------------------------------------------------------

    /// Pick the document kind from a file extension and forget all records.
    pub fn init_mode(&mut self, extension: &str) -> DocumentKind {
        self.kind = DocumentKind::from_extension(extension);
        self.reset();
        self.kind
    }

    pub fn set_document_kind(&mut self, kind: DocumentKind) {
        if kind != self.kind {
            self.kind = kind;
            self.reset();
        }
    }

    /// Forget every record and stop any running pass.
    pub fn reset(&mut self) {
        self.store = LineStore::new();
        self.scheduler.reset();
        self.symbols = None;
    }

    pub fn set_config(&mut self, config: LexerConfig) {
        let was_big = self.is_big_file();
        self.scheduler.set_config(&config);
        self.config = config;
        self.store.clear();
        self.symbols = None;
        if was_big != self.is_big_file() {
            debug!(big = self.is_big_file(), "weblex big-file mode toggled");
        }
    }

    /// Force big-file mode on or off, or `None` to use the size threshold.
    /// Records lexed under the other mode are dropped.
    pub fn set_big_file(&mut self, big: Option<bool>) {
        let was_big = self.is_big_file();
        self.big_override = big;
        if was_big != self.is_big_file() {
            debug!(big = self.is_big_file(), "weblex big-file mode toggled");
            self.store.clear();
            self.symbols = None;
        }
    }

    #[must_use]
    pub fn is_big_file(&self) -> bool {
        self.big_override.unwrap_or(self.big_auto)
    }

    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    #[must_use]
    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    #[must_use]
    pub fn tables(&self) -> &Arc<LanguageTables> {
        &self.tables
    }

    #[must_use]
    pub fn store(&self) -> &LineStore {
        &self.store
    }

    fn flags(&self) -> LexFlags {
        if self.is_big_file() {
            LexFlags::MINIMAL
        } else {
            LexFlags {
                track_scopes: self.config.track_symbols,
                cosmetic: true,
            }
        }
    }

    // -- lexing --------------------------------------------------------------

    /// Start a full-document pass. Drive it with [`Highlighter::run_pass`].
    pub fn rehighlight_all<D: Document + ?Sized>(&mut self, doc: &D) {
        let was_big = self.is_big_file();
        self.big_auto = self.config.is_big(doc.char_count());
        if was_big != self.is_big_file() {
            debug!(big = self.is_big_file(), "weblex big-file mode toggled");
        }
        self.scheduler.start_full_pass(&mut self.store, doc.line_count());
        self.symbols = None;
    }

    /// Lex the next slice of a running full pass.
    pub fn run_pass<D, O>(&mut self, doc: &D, observer: &mut O) -> PassStatus
    where
        D: Document + ?Sized,
        O: HighlightObserver + ?Sized,
    {
        let lexer = lexer_for(&self.tables, self.kind, self.flags(), &self.config);
        let status = self
            .scheduler
            .resume(&lexer, &mut self.store, doc, observer);
        if status != PassStatus::Idle {
            self.symbols = None;
        }
        status
    }

    /// Full pass without returning to the caller between slices.
    pub fn rehighlight_all_blocking<D, O>(&mut self, doc: &D, observer: &mut O) -> PassStatus
    where
        D: Document + ?Sized,
        O: HighlightObserver + ?Sized,
    {
        self.rehighlight_all(doc);
        loop {
            match self.run_pass(doc, observer) {
                PassStatus::Yielded { .. } => {}
                done => return done,
            }
        }
    }

    /// Re-lex lines `[first, last]` and whatever their new end states affect.
    pub fn rehighlight_range<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        first: usize,
        last: usize,
    ) -> Relex {
        let lexer = lexer_for(&self.tables, self.kind, self.flags(), &self.config);
        let run = self
            .scheduler
            .relex(&lexer, &mut self.store, doc, first, last.max(first));
        if run.lexed > 0 {
            self.symbols = None;
        }
        run
    }

    pub fn rehighlight_line<D: Document + ?Sized>(&mut self, doc: &D, line: usize) -> Relex {
        self.rehighlight_range(doc, line, line)
    }

    /// Re-lex from the cursor line until the end states converge.
    pub fn rehighlight_from<D: Document + ?Sized>(&mut self, doc: &D, line: usize) -> Relex {
        self.rehighlight_range(doc, line, line)
    }

    /// `count` lines were inserted before `at`; `doc` has the new text.
    pub fn on_lines_inserted<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        at: usize,
        count: usize,
    ) -> Relex {
        if count == 0 {
            return Relex::default();
        }
        self.store.insert_lines(at, count);
        self.scheduler.on_lines_inserted(at, count);
        self.rehighlight_range(doc, at, at + count - 1)
    }

    /// Lines `[at, at + count)` were removed; `doc` has the new text.
    pub fn on_lines_removed<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        at: usize,
        count: usize,
    ) -> Relex {
        self.store.remove_lines(at, count);
        self.scheduler.on_lines_removed(at, count);
        self.symbols = None;
        if at >= doc.line_count() {
            return Relex {
                from: at,
                ..Relex::default()
            };
        }
        self.rehighlight_line(doc, at)
    }

    pub fn on_line_changed<D: Document + ?Sized>(&mut self, doc: &D, line: usize) -> Relex {
        self.rehighlight_line(doc, line)
    }

    /// The host scrolled; lex deferred lines that are now near-visible.
    pub fn update_visible_window<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        last_visible: usize,
    ) -> usize {
        let lexer = lexer_for(&self.tables, self.kind, self.flags(), &self.config);
        let lexed = self
            .scheduler
            .advance_window(&lexer, &mut self.store, doc, last_visible);
        if lexed > 0 {
            self.symbols = None;
        }
        lexed
    }

    // -- line records --------------------------------------------------------

    #[must_use]
    pub fn line_data(&self, line: usize) -> Option<&LineData> {
        self.store.get(line)
    }

    /// Style ranges of `line`; empty when it was never lexed.
    #[must_use]
    pub fn format_ranges(&self, line: usize) -> &[FormatRange] {
        self.store.get(line).map_or(&[], |d| d.ranges.as_slice())
    }

    #[must_use]
    pub fn mode_spans(&self, line: usize) -> &[ModeSpan] {
        self.store.get(line).map_or(&[], |d| d.mode_spans.as_slice())
    }

    // -- point queries -------------------------------------------------------

    #[must_use]
    pub fn mode_at(&self, line: usize, col: usize) -> Option<Mode> {
        Some(self.store.get(line)?.mode_at(col))
    }

    /// Open construct of the active mode at `(line, col)`.
    #[must_use]
    pub fn state_at(&self, line: usize, col: usize) -> Option<StateTag> {
        let data = self.store.get(line)?;
        Some(data.state_mark_at(col).map_or(StateTag::None, |m| m.tag))
    }

    #[must_use]
    pub fn is_inside_string_or_comment(&self, line: usize, col: usize) -> bool {
        self.state_at(line, col)
            .is_some_and(|tag| tag.is_string() || tag.is_comment())
    }

    /// Scope entries open at `(line, col)` for the language active there.
    #[must_use]
    pub fn scopes_at(&self, line: usize, col: usize) -> Option<Vec<ScopeEntry>> {
        let data = self.store.get(line)?;
        let mode = data.mode_at(col);
        let lang = lang_of(mode);
        let mut entries = self
            .store
            .load(line)
            .map(|state| state.scopes_for(mode).entries().to_vec())
            .unwrap_or_default();
        for mark in data
            .scope_marks
            .iter()
            .filter(|m| m.lang == lang && m.col <= col)
        {
            mark.apply(&mut entries);
        }
        Some(entries)
    }

    #[must_use]
    pub fn namespace_at(&self, line: usize, col: usize) -> Option<String> {
        self.scopes_at(line, col)
            .and_then(|e| scope::namespace_of(&e).map(str::to_string))
    }

    #[must_use]
    pub fn class_at(&self, line: usize, col: usize) -> Option<String> {
        self.scopes_at(line, col)
            .and_then(|e| scope::class_of(&e).map(str::to_string))
    }

    #[must_use]
    pub fn function_at(&self, line: usize, col: usize) -> Option<String> {
        self.scopes_at(line, col)
            .and_then(|e| scope::function_of(&e).map(str::to_string))
    }

    /// Header of the innermost `@media` block at `(line, col)`.
    #[must_use]
    pub fn media_query_at(&self, line: usize, col: usize) -> Option<String> {
        self.scopes_at(line, col)
            .and_then(|e| scope::media_of(&e).map(str::to_string))
    }

    /// `Namespace\Class::function`; `None` through anonymous scopes.
    #[must_use]
    pub fn qualified_name_at(&self, line: usize, col: usize) -> Option<String> {
        scope::qualified_name(&self.scopes_at(line, col)?)
    }

    /// Symbol key (`Class::function`) at `(line, col)`.
    #[must_use]
    pub fn scope_key_at(&self, line: usize, col: usize) -> Option<String> {
        self.scopes_at(line, col).map(|e| scope::key_of(&e))
    }

    /// Open HTML elements at `(line, col)`, outermost first.
    #[must_use]
    pub fn tag_chain_at(&self, line: usize, col: usize) -> Vec<String> {
        let Some(data) = self.store.get(line) else {
            return Vec::new();
        };
        let mut chain = self
            .store
            .load(line)
            .map(|state| state.html.chain.clone())
            .unwrap_or_default();
        for mark in data.tag_marks.iter().filter(|m| m.end <= col) {
            mark.apply(&mut chain);
        }
        chain
    }

    // -- matching ------------------------------------------------------------

    #[must_use]
    pub fn matching_bracket<D: Document + ?Sized>(
        &self,
        doc: &D,
        line: usize,
        col: usize,
    ) -> Option<(usize, usize)> {
        matching::matching_bracket(&self.store, doc, line, col, self.config.search_cap)
    }

    #[must_use]
    pub fn matching_tag(&self, line: usize, col: usize) -> Option<(usize, TagMark)> {
        matching::matching_tag(&self.store, line, col, self.config.search_cap)
    }

    // -- symbols -------------------------------------------------------------

    /// The document-wide symbol index over every lexed line.
    pub fn symbols(&mut self) -> &SymbolTable {
        let store = &self.store;
        self.symbols.get_or_insert_with(|| {
            SymbolTable::from_lines(store.iter().map(|(n, d)| (n, &d.symbols)))
        })
    }

    pub fn known_variables(&mut self, scope_key: &str) -> Vec<String> {
        owned(self.symbols().known_variables(scope_key))
    }

    pub fn used_variables(&mut self, scope_key: &str) -> Vec<String> {
        owned(self.symbols().used_variables(scope_key))
    }

    pub fn unused_variables(&mut self, scope_key: &str) -> Vec<Declaration> {
        self.symbols()
            .unused_variables(scope_key)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Functions declared in `scope_key`, or all of them for `None`.
    pub fn known_functions(&mut self, scope_key: Option<&str>) -> Vec<Declaration> {
        self.symbols()
            .known_functions(scope_key)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn known_classes(&mut self) -> Vec<Declaration> {
        self.symbols().known_classes().to_vec()
    }

    /// `(line, col)` where `name` was first declared in `scope_key`.
    pub fn variable_declaration_site(
        &mut self,
        scope_key: &str,
        name: &str,
    ) -> Option<(usize, usize)> {
        self.symbols().variable_declaration_site(scope_key, name)
    }
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextDocument;

    fn highlighted(kind: DocumentKind, lines: &[&str]) -> (Highlighter, TextDocument) {
        let doc = TextDocument::from_lines(lines.iter().copied());
        let mut hl = Highlighter::with_builtin_tables().with_kind(kind);
        let status = hl.rehighlight_all_blocking(&doc, &mut ());
        assert!(matches!(status, PassStatus::Completed { .. }));
        (hl, doc)
    }

    // -- lifecycle -----------------------------------------------------------

    #[test]
    fn init_mode_picks_kind() {
        let mut hl = Highlighter::with_builtin_tables();
        assert_eq!(hl.init_mode("phtml"), DocumentKind::Mixed);
        assert_eq!(hl.init_mode("mjs"), DocumentKind::Js);
        assert_eq!(hl.init_mode("txt"), DocumentKind::Unknown);
    }

    #[test]
    fn big_file_threshold_and_override() {
        let doc = TextDocument::from_lines(["<?php $x = 1; ?>"]);
        let config = LexerConfig::default().with_big_file_threshold(4);
        let mut hl = Highlighter::new(Arc::new(LanguageTables::builtin()), config)
            .with_kind(DocumentKind::Mixed);
        hl.rehighlight_all_blocking(&doc, &mut ());
        assert!(hl.is_big_file());
        assert!(hl.known_variables("::").is_empty());
        assert_eq!(hl.mode_at(0, 7), Some(Mode::Php));

        hl.set_big_file(Some(false));
        assert!(hl.line_data(0).is_none());
        hl.rehighlight_line(&doc, 0);
        assert_eq!(hl.known_variables("::"), vec!["$x"]);
    }

    #[test]
    fn symbols_can_be_switched_off() {
        let doc = TextDocument::from_lines(["var a = 1;"]);
        let mut hl = Highlighter::new(
            Arc::new(LanguageTables::builtin()),
            LexerConfig::default().with_symbols(false),
        )
        .with_kind(DocumentKind::Js);
        hl.rehighlight_all_blocking(&doc, &mut ());
        assert!(hl.symbols().is_empty());
        assert!(!hl.format_ranges(0).is_empty());
    }

    // -- edits ---------------------------------------------------------------

    #[test]
    fn insert_and_remove_relex() {
        let (mut hl, mut doc) = highlighted(DocumentKind::Js, &["a;", "b;", "c;"]);
        doc.insert_line(1, "/*");
        let run = hl.on_lines_inserted(&doc, 1, 1);
        assert_eq!(run.lexed, 3);
        assert_eq!(hl.state_at(3, 0), Some(StateTag::CommentMlJs));

        doc.remove_line(1);
        hl.on_lines_removed(&doc, 1, 1);
        assert_eq!(hl.store().len(), 3);
        assert_eq!(hl.state_at(2, 0), Some(StateTag::None));
    }

    #[test]
    fn changed_line_updates_symbols() {
        let (mut hl, mut doc) = highlighted(DocumentKind::Js, &["var a = 1;", "b = a;"]);
        assert_eq!(hl.known_variables("::"), vec!["a"]);
        doc.set_line(0, "var c = 1;");
        hl.on_line_changed(&doc, 0);
        assert_eq!(hl.known_variables("::"), vec!["c"]);
    }

    #[test]
    fn windowed_pass_forgets_old_text() {
        let config = LexerConfig::default().with_visible_margin(0);
        let mut hl = Highlighter::new(Arc::new(LanguageTables::builtin()), config)
            .with_kind(DocumentKind::Js);
        let old = TextDocument::from_lines(["a;", "b;", "c;", "var gone = 1;"]);
        hl.update_visible_window(&old, 10);
        hl.rehighlight_all_blocking(&old, &mut ());
        assert_eq!(hl.known_variables("::"), vec!["gone"]);

        let doc = TextDocument::from_lines(["a;", "b;", "c;", "d;"]);
        hl.update_visible_window(&doc, 0);
        hl.rehighlight_all_blocking(&doc, &mut ());
        assert_eq!(hl.store().deferred_from(), Some(1));
        assert_eq!(hl.mode_at(3, 0), None);
        assert!(hl.known_variables("::").is_empty());

        hl.update_visible_window(&doc, 3);
        assert_eq!(hl.mode_at(3, 0), Some(Mode::Js));
        assert!(hl.known_variables("::").is_empty());
    }

    // -- queries -------------------------------------------------------------

    #[test]
    fn scope_queries_replay_marks() {
        let (hl, _) = highlighted(DocumentKind::Mixed, &[
            "<?php namespace App;",
            "class Foo { function bar() { $a = 1; } }",
        ]);
        assert_eq!(hl.class_at(1, 5).as_deref(), None);
        assert_eq!(hl.class_at(1, 11).as_deref(), Some("Foo"));
        assert_eq!(hl.function_at(1, 30).as_deref(), Some("bar"));
        assert_eq!(hl.qualified_name_at(1, 30).as_deref(), Some("App\\Foo::bar"));
        assert_eq!(hl.scope_key_at(1, 30).as_deref(), Some("Foo::bar"));
        assert_eq!(hl.function_at(1, 39), None);
        assert_eq!(hl.namespace_at(1, 40).as_deref(), Some("App"));
    }

    #[test]
    fn anonymous_scopes_have_no_qualified_name() {
        let (hl, _) = highlighted(DocumentKind::Mixed, &[
            "<?php class Foo {",
            "  function f() { $g = function () {",
            "  };",
        ]);
        assert_eq!(hl.function_at(2, 0).as_deref(), Some("anonymous function"));
        assert_eq!(hl.qualified_name_at(2, 0), None);
        assert_eq!(hl.qualified_name_at(1, 17).as_deref(), Some("Foo::f"));
    }

    #[test]
    fn media_and_tag_chain() {
        let (hl, _) = highlighted(DocumentKind::Mixed, &[
            "<body><style>",
            "@media screen {",
            "  a { color: red; }",
            "}</style>",
        ]);
        assert_eq!(hl.media_query_at(2, 4).as_deref(), Some("screen"));
        assert_eq!(hl.media_query_at(3, 1), None);
        assert_eq!(hl.tag_chain_at(0, 6), vec!["body"]);
        assert_eq!(hl.tag_chain_at(2, 0), vec!["body", "style"]);
        assert_eq!(hl.tag_chain_at(3, 9), vec!["body"]);
        assert_eq!(hl.mode_at(2, 3), Some(Mode::Css));
    }

    #[test]
    fn string_and_comment_queries() {
        let (hl, _) = highlighted(DocumentKind::Js, &["x = 'a'; // c"]);
        assert!(hl.is_inside_string_or_comment(0, 5));
        assert!(!hl.is_inside_string_or_comment(0, 8));
        assert!(hl.is_inside_string_or_comment(0, 11));
        assert!(!hl.is_inside_string_or_comment(5, 0));
        assert_eq!(hl.mode_at(5, 0), None);
    }

    #[test]
    fn matching_through_facade() {
        let (hl, doc) = highlighted(DocumentKind::Mixed, &["<div><?php f(1); ?></div>"]);
        assert_eq!(hl.matching_bracket(&doc, 0, 12), Some((0, 14)));
        assert_eq!(hl.matching_tag(0, 0).map(|(l, m)| (l, m.start)), Some((0, 19)));
    }

    // -- logging -------------------------------------------------------------

    #[test]
    #[tracing_test::traced_test]
    fn passes_and_relexes_are_logged() {
        let (mut hl, mut doc) = highlighted(DocumentKind::Js, &["a;", "b;"]);
        assert!(logs_contain("weblex full pass done"));
        doc.set_line(0, "/*");
        hl.on_line_changed(&doc, 0);
        assert!(logs_contain("weblex relex"));
    }
}
