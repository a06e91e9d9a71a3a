//! Keyword and format lookup tables.
//!
//! Tables are immutable after construction and meant to be shared across
//! documents behind an [`Arc`](std::sync::Arc). The host can extend the
//! built-in tables from a small textual format:
//!
//! ```text
//! # comment
//! [php]
//! my_helper = function
//! [css]
//! gap = property
//! ```

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::TableError;
use crate::style::StyleClass;

/// Word → style lookup for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    entries: FxHashMap<String, StyleClass>,
    ignore_case: bool,
}

impl KeywordTable {
    /// An empty, case-sensitive table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty table that folds ASCII case on insert and lookup.
    #[must_use]
    pub fn case_insensitive() -> Self {
        Self {
            entries: FxHashMap::default(),
            ignore_case: true,
        }
    }

    /// Build a table from a word list that all share one style.
    #[must_use]
    pub fn with_words(mut self, words: &[&str], style: StyleClass) -> Self {
        for word in words {
            self.insert(word, style);
        }
        self
    }

    /// Parse `word = style` lines into a table.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse(source: &str, ignore_case: bool) -> Result<Self, TableError> {
        let mut table = Self {
            entries: FxHashMap::default(),
            ignore_case,
        };
        for (idx, raw) in source.lines().enumerate() {
            table.parse_entry(raw, idx + 1)?;
        }
        Ok(table)
    }

    fn parse_entry(&mut self, raw: &str, line: usize) -> Result<(), TableError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(());
        }
        let (word, style) = trimmed
            .split_once('=')
            .ok_or(TableError::MissingSeparator { line })?;
        let word = word.trim();
        if word.is_empty() {
            return Err(TableError::EmptyWord { line });
        }
        let style_name = style.trim();
        let style = StyleClass::from_name(style_name).ok_or_else(|| TableError::UnknownStyle {
            line,
            style: style_name.to_string(),
        })?;
        self.insert(word, style);
        Ok(())
    }

    /// Insert or replace a word.
    pub fn insert(&mut self, word: &str, style: StyleClass) {
        let key = if self.ignore_case {
            word.to_ascii_lowercase()
        } else {
            word.to_string()
        };
        self.entries.insert(key, style);
    }

    /// Look up a word.
    #[must_use]
    pub fn get(&self, word: &str) -> Option<StyleClass> {
        if self.ignore_case && word.bytes().any(|b| b.is_ascii_uppercase()) {
            return self.entries.get(&word.to_ascii_lowercase()).copied();
        }
        self.entries.get(word).copied()
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    /// Merge another table into this one; `other` wins on conflicts.
    pub fn extend(&mut self, other: &KeywordTable) {
        for (word, style) in &other.entries {
            self.insert(word, *style);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All lookup tables the tokenizers consult.
#[derive(Debug, Clone, Default)]
pub struct LanguageTables {
    pub html_tags: KeywordTable,
    pub html_attributes: KeywordTable,
    pub void_elements: FxHashSet<String>,
    pub css: KeywordTable,
    pub js: KeywordTable,
    pub php: KeywordTable,
}

impl LanguageTables {
    /// Empty tables: every word is unknown, no element is void.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            html_tags: KeywordTable::case_insensitive(),
            html_attributes: KeywordTable::case_insensitive(),
            void_elements: FxHashSet::default(),
            css: KeywordTable::case_insensitive(),
            js: KeywordTable::new(),
            php: KeywordTable::case_insensitive(),
        }
    }

    /// The built-in tables.
    #[must_use]
    pub fn builtin() -> Self {
        let mut tables = Self::empty();
        tables.html_tags = KeywordTable::case_insensitive().with_words(HTML_TAGS, StyleClass::Tag);
        tables.html_attributes =
            KeywordTable::case_insensitive().with_words(HTML_ATTRIBUTES, StyleClass::Attribute);
        tables.void_elements = VOID_ELEMENTS.iter().map(|s| (*s).to_string()).collect();
        tables.css = KeywordTable::case_insensitive()
            .with_words(CSS_PROPERTIES, StyleClass::Property)
            .with_words(CSS_VALUES, StyleClass::Keyword);
        tables.js = KeywordTable::new()
            .with_words(JS_KEYWORDS, StyleClass::Keyword)
            .with_words(JS_CLASSES, StyleClass::ClassName)
            .with_words(JS_FUNCTIONS, StyleClass::Function);
        tables.php = KeywordTable::case_insensitive()
            .with_words(PHP_KEYWORDS, StyleClass::Keyword)
            .with_words(PHP_CONSTANTS, StyleClass::Constant)
            .with_words(PHP_FUNCTIONS, StyleClass::Function);
        tables
    }

    /// Merge a sectioned table source (`[html_tags]`, `[html_attributes]`,
    /// `[css]`, `[js]`, `[php]`) into these tables.
    pub fn with_table_source(mut self, source: &str) -> Result<Self, TableError> {
        let mut section: Option<&str> = None;
        for (idx, raw) in source.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                let name = name.trim();
                if self.table_mut(name).is_none() {
                    return Err(TableError::UnknownSection {
                        line,
                        section: name.to_string(),
                    });
                }
                section = Some(name);
                continue;
            }
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let name = section.unwrap_or("php");
            if let Some(table) = self.table_mut(name) {
                table.parse_entry(trimmed, line)?;
            }
        }
        Ok(self)
    }

    fn table_mut(&mut self, name: &str) -> Option<&mut KeywordTable> {
        match name {
            "html_tags" => Some(&mut self.html_tags),
            "html_attributes" => Some(&mut self.html_attributes),
            "css" => Some(&mut self.css),
            "js" => Some(&mut self.js),
            "php" => Some(&mut self.php),
            _ => None,
        }
    }

    /// Whether `tag` never has a closing counterpart.
    #[must_use]
    pub fn is_void_element(&self, tag: &str) -> bool {
        if tag.bytes().any(|b| b.is_ascii_uppercase()) {
            return self.void_elements.contains(&tag.to_ascii_lowercase());
        }
        self.void_elements.contains(tag)
    }
}

// ---------------------------------------------------------------------------
// Built-in word lists
// ---------------------------------------------------------------------------

const HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "blockquote",
    "body", "br", "button", "canvas", "caption", "code", "col", "colgroup", "dd", "details",
    "dialog", "div", "dl", "dt", "em", "embed", "fieldset", "figcaption", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hr", "html", "i", "iframe",
    "img", "input", "label", "legend", "li", "link", "main", "meta", "nav", "noscript", "object",
    "ol", "optgroup", "option", "p", "param", "picture", "pre", "section", "select", "small",
    "source", "span", "strong", "style", "sub", "summary", "sup", "svg", "table", "tbody", "td",
    "template", "textarea", "tfoot", "th", "thead", "title", "tr", "track", "u", "ul", "video",
    "wbr", "script",
];

const HTML_ATTRIBUTES: &[&str] = &[
    "accept", "action", "alt", "async", "autocomplete", "autofocus", "charset", "checked",
    "class", "cols", "colspan", "content", "defer", "dir", "disabled", "download", "enctype",
    "for", "form", "height", "hidden", "href", "id", "lang", "max", "maxlength", "media",
    "method", "min", "multiple", "name", "onblur", "onchange", "onclick", "onfocus", "oninput",
    "onkeydown", "onkeyup", "onload", "onmouseover", "onsubmit", "pattern", "placeholder",
    "readonly", "rel", "required", "role", "rows", "rowspan", "selected", "size", "src",
    "step", "style", "tabindex", "target", "title", "type", "value", "width",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr", "!doctype",
];

const CSS_PROPERTIES: &[&str] = &[
    "align-items", "animation", "background", "background-color", "background-image",
    "border", "border-bottom", "border-color", "border-left", "border-radius", "border-right",
    "border-top", "bottom", "box-shadow", "box-sizing", "clear", "color", "content", "cursor",
    "display", "flex", "flex-direction", "float", "font", "font-family", "font-size",
    "font-style", "font-weight", "gap", "grid", "grid-template-columns", "height",
    "justify-content", "left", "letter-spacing", "line-height", "list-style", "margin",
    "margin-bottom", "margin-left", "margin-right", "margin-top", "max-height", "max-width",
    "min-height", "min-width", "opacity", "outline", "overflow", "padding", "padding-bottom",
    "padding-left", "padding-right", "padding-top", "position", "right", "text-align",
    "text-decoration", "text-transform", "top", "transform", "transition", "vertical-align",
    "visibility", "white-space", "width", "z-index",
];

const CSS_VALUES: &[&str] = &[
    "absolute", "auto", "block", "bold", "both", "center", "collapse", "dashed", "dotted",
    "fixed", "flex", "grid", "hidden", "inherit", "initial", "inline", "inline-block", "italic",
    "none", "normal", "pointer", "relative", "scroll", "solid", "static", "sticky",
    "transparent", "underline", "uppercase", "visible", "wrap",
];

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "false", "finally", "for", "from",
    "function", "if", "import", "in", "instanceof", "let", "new", "null", "of", "return",
    "static", "super", "switch", "this", "throw", "true", "try", "typeof", "undefined", "var",
    "void", "while", "with", "yield",
];

const JS_CLASSES: &[&str] = &[
    "Array", "Boolean", "Date", "Error", "JSON", "Map", "Math", "Number", "Object", "Promise",
    "RegExp", "Set", "String", "Symbol", "console", "document", "window",
];

const JS_FUNCTIONS: &[&str] = &[
    "alert", "clearInterval", "clearTimeout", "decodeURIComponent", "encodeURIComponent",
    "fetch", "isNaN", "parseFloat", "parseInt", "setInterval", "setTimeout",
];

const PHP_KEYWORDS: &[&str] = &[
    "abstract", "and", "array", "as", "break", "callable", "case", "catch", "class", "clone",
    "const", "continue", "declare", "default", "die", "do", "echo", "else", "elseif", "empty",
    "enddeclare", "endfor", "endforeach", "endif", "endswitch", "endwhile", "enum", "eval",
    "exit", "extends", "final", "finally", "fn", "for", "foreach", "function", "global",
    "goto", "if", "implements", "include", "include_once", "instanceof", "insteadof",
    "interface", "isset", "list", "match", "namespace", "new", "or", "parent", "print",
    "private", "protected", "public", "readonly", "require", "require_once", "return", "self",
    "static", "switch", "throw", "trait", "try", "unset", "use", "var", "while", "xor", "yield",
];

const PHP_CONSTANTS: &[&str] = &[
    "true", "false", "null", "__CLASS__", "__DIR__", "__FILE__", "__FUNCTION__", "__LINE__",
    "__METHOD__", "__NAMESPACE__", "PHP_EOL", "PHP_VERSION",
];

const PHP_FUNCTIONS: &[&str] = &[
    "array_filter", "array_key_exists", "array_keys", "array_map", "array_merge",
    "array_values", "count", "date", "explode", "file_get_contents", "htmlspecialchars",
    "implode", "in_array", "is_array", "is_null", "json_decode", "json_encode", "preg_match",
    "preg_replace", "printf", "sprintf", "str_replace", "strlen", "strpos", "strtolower",
    "substr", "trim", "var_dump",
];
