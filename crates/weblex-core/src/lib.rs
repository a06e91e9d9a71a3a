#![forbid(unsafe_code)]

//! Shared vocabulary for the weblex incremental lexer.
//!
//! - [`chars`] - per-character classifiers
//! - [`Mode`] / [`DocumentKind`] - embedded languages and document types
//! - [`StyleClass`] / [`FormatRange`] - lexer output
//! - [`LanguageTables`] / [`KeywordTable`] - read-only keyword lookups
//! - [`LexerConfig`] - tuning knobs
//!
//! # Example
//! ```
//! use weblex_core::{LanguageTables, StyleClass};
//!
//! let tables = LanguageTables::builtin();
//! assert_eq!(tables.php.get("echo"), Some(StyleClass::Keyword));
//! ```

pub mod chars;
pub mod config;
pub mod error;
pub mod mode;
pub mod style;
pub mod tables;

pub use config::LexerConfig;
pub use error::TableError;
pub use mode::{DocumentKind, Mode};
pub use style::{FormatRange, StyleClass, validate_ranges};
pub use tables::{KeywordTable, LanguageTables};
