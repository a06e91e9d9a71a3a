#![forbid(unsafe_code)]

//! Incremental lexer for mixed HTML/PHP/JS/CSS documents.
//!
//! Every line is lexed from the end state of the line before it, so an edit
//! only re-lexes lines until their end states stop changing.
//!
//! - [`Highlighter`] - host facade: passes, edits, point and symbol queries
//! - [`LineLexer`] - lexes one line from a [`LexState`]
//! - [`LineStore`] / [`Scheduler`] - per-line records and re-lex planning
//! - [`SymbolTable`] - declared and used variables, functions and classes
//! - [`Document`] / [`TextDocument`] - the text being lexed
//!
//! # Example
//! ```
//! use weblex::{DocumentKind, Highlighter, Mode, TextDocument};
//!
//! let doc = TextDocument::from_text("<?php $x = 1; ?>\n<p>$x</p>");
//! let mut hl = Highlighter::with_builtin_tables().with_kind(DocumentKind::Mixed);
//! hl.rehighlight_all_blocking(&doc, &mut ());
//!
//! assert_eq!(hl.mode_at(0, 6), Some(Mode::Php));
//! assert_eq!(hl.mode_at(1, 3), Some(Mode::Html));
//! assert_eq!(hl.known_variables("::"), vec!["$x"]);
//! ```

mod css;
mod html;
mod js;
mod php;
mod switcher;

pub mod document;
pub mod highlighter;
pub mod line;
pub mod matching;
pub mod scheduler;
pub mod scope;
pub mod state;
pub mod store;

pub use document::{Document, HighlightObserver, TextDocument};
pub use highlighter::Highlighter;
pub use html::{TagMark, TagMarkKind};
pub use line::{LexFlags, LineData, LineLexer, ModeSpan, StateMark};
pub use scheduler::{PassStatus, Relex, Scheduler};
pub use scope::{
    ANONYMOUS_CLASS, ANONYMOUS_FUNCTION, Declaration, ScopeEntry, ScopeKind, ScopeLang,
    ScopeStack, SymbolTable,
};
pub use state::{LexState, StateTag};
pub use store::LineStore;
pub use weblex_core::{
    DocumentKind, FormatRange, KeywordTable, LanguageTables, LexerConfig, Mode, StyleClass,
    TableError,
};
