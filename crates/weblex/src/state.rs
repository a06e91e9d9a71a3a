//! The persisted per-line lexer state.
//!
//! [`LexState`] is a plain value: the end state of line `n` is cloned into
//! the lexer as the start state of line `n + 1`. Two lines with identical
//! text and identical incoming state always produce identical output.

use smallvec::SmallVec;
use weblex_core::Mode;

use crate::scope::{ScopeKind, ScopeStack};

/// The construct open at a position, as seen from the active mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StateTag {
    #[default]
    None,
    CommentMlCss,
    CommentMlJs,
    CommentSlJs,
    CommentMlPhp,
    CommentSlPhp,
    CommentMlHtml,
    StringSqHtml,
    StringDqHtml,
    StringSqCss,
    StringDqCss,
    StringSqJs,
    StringDqJs,
    TemplateJs,
    StringSqPhp,
    StringDqPhp,
    Heredoc,
    Nowdoc,
    /// Inside an HTML tag, between `<name` and `>`.
    Tag,
    RegexpJs,
    /// Code inside a JS template `${...}`.
    ExpressionJs,
    /// Code inside a PHP string `{$...}`.
    ExpressionPhp,
}

impl StateTag {
    #[must_use]
    pub const fn is_comment(self) -> bool {
        matches!(
            self,
            Self::CommentMlCss
                | Self::CommentMlJs
                | Self::CommentSlJs
                | Self::CommentMlPhp
                | Self::CommentSlPhp
                | Self::CommentMlHtml
        )
    }

    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(
            self,
            Self::StringSqHtml
                | Self::StringDqHtml
                | Self::StringSqCss
                | Self::StringDqCss
                | Self::StringSqJs
                | Self::StringDqJs
                | Self::TemplateJs
                | Self::StringSqPhp
                | Self::StringDqPhp
                | Self::Heredoc
                | Self::Nowdoc
        )
    }

    /// Literal or comment body: chars inside are not code.
    #[must_use]
    pub const fn is_body(self) -> bool {
        self.is_comment() || self.is_string() || matches!(self, Self::RegexpJs)
    }
}

/// Quote character of an open string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quote {
    Single,
    Double,
    Backtick,
}

impl Quote {
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '\'' => Some(Self::Single),
            '"' => Some(Self::Double),
            '`' => Some(Self::Backtick),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
            Self::Backtick => '`',
        }
    }
}

/// Class of the last significant token, used for context decisions
/// (regexp vs division, member access, declarations).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Prev {
    #[default]
    None,
    /// Identifier, number, string end, `)` or `]`.
    Value,
    Keyword,
    Punct(char),
    /// `.` in JS.
    Dot,
    /// `->` / `?->` in PHP.
    Arrow,
    /// `::` in PHP.
    DoubleColon,
    New,
}

impl Prev {
    /// Whether a following `/` is a division operator.
    #[must_use]
    pub const fn ends_operand(self) -> bool {
        matches!(self, Self::Value)
    }
}

/// Parameter collection progress of a pending function scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Params {
    /// The `(` has not been seen yet.
    Awaiting,
    /// Inside the parameter list; holds the paren depth outside it.
    Open(u16),
    Closed,
}

/// A scope whose name is known but whose `{` has not been seen yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingScope {
    pub kind: ScopeKind,
    pub name: String,
    pub params: Params,
    pub param_names: Vec<String>,
}

impl PendingScope {
    #[must_use]
    pub fn new(kind: ScopeKind, name: impl Into<String>) -> Self {
        let params = if matches!(kind, ScopeKind::Function | ScopeKind::FuncJs) {
            Params::Awaiting
        } else {
            Params::Closed
        };
        Self {
            kind,
            name: name.into(),
            params,
            param_names: Vec::new(),
        }
    }

    /// Whether parameters are being collected at paren depth `paren`.
    #[must_use]
    pub fn in_params(&self, paren: u16) -> bool {
        matches!(self.params, Params::Open(outer) if paren == outer + 1)
    }
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum HtmlScan {
    #[default]
    Text,
    /// `<!-- ... -->`
    Comment,
    /// Between `<name` and `>`.
    Tag {
        name: String,
        closing: bool,
        self_closing: bool,
        quote: Option<Quote>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HtmlState {
    pub scan: HtmlScan,
    /// Open ancestor elements, outermost first.
    pub chain: Vec<String>,
}

impl HtmlState {
    #[must_use]
    pub fn tag(&self) -> StateTag {
        match &self.scan {
            HtmlScan::Text => StateTag::None,
            HtmlScan::Comment => StateTag::CommentMlHtml,
            HtmlScan::Tag { quote: None, .. } => StateTag::Tag,
            HtmlScan::Tag {
                quote: Some(Quote::Single),
                ..
            } => StateTag::StringSqHtml,
            HtmlScan::Tag { quote: Some(_), .. } => StateTag::StringDqHtml,
        }
    }
}

// ---------------------------------------------------------------------------
// CSS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CssScan {
    #[default]
    Normal,
    Comment,
    String(Quote),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssState {
    pub scan: CssScan,
    pub depth: u16,
    /// Brace depth outside each open `@media` block.
    pub media_open: SmallVec<[u16; 2]>,
    /// Open `@media` blocks.
    pub scopes: ScopeStack,
    /// Header text of an `@media` rule awaiting its `{`.
    pub pending_media: Option<String>,
    /// After `property:` and before `;`/`}`.
    pub in_value: bool,
}

impl CssState {
    #[must_use]
    pub fn tag(&self) -> StateTag {
        match self.scan {
            CssScan::Normal => StateTag::None,
            CssScan::Comment => StateTag::CommentMlCss,
            CssScan::String(Quote::Single) => StateTag::StringSqCss,
            CssScan::String(_) => StateTag::StringDqCss,
        }
    }

    /// Inside a declaration block (as opposed to selector position).
    #[must_use]
    pub fn in_declarations(&self) -> bool {
        usize::from(self.depth) > self.media_open.len()
    }
}

// ---------------------------------------------------------------------------
// JS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JsScan {
    #[default]
    Code,
    CommentMl,
    CommentSl,
    String(Quote),
    Template,
    Regexp {
        in_class: bool,
    },
}

/// What the next JS identifier is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JsExpect {
    #[default]
    None,
    FunctionName,
    ClassName,
    ClassRef,
    VarName,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsState {
    pub scan: JsScan,
    pub depth: u16,
    pub paren: u16,
    /// Brace depth outside each open template `${`.
    pub template_exprs: SmallVec<[u16; 2]>,
    pub prev: Prev,
    pub expect: JsExpect,
    /// `(paren, depth)` of the open `var`/`let`/`const` statement; commas at
    /// that position continue the declaration list.
    pub decl_at: Option<(u16, u16)>,
    pub pending: Option<PendingScope>,
    pub scopes: ScopeStack,
}

impl JsState {
    #[must_use]
    pub fn tag(&self) -> StateTag {
        match self.scan {
            JsScan::Code if !self.template_exprs.is_empty() => StateTag::ExpressionJs,
            JsScan::Code => StateTag::None,
            JsScan::CommentMl => StateTag::CommentMlJs,
            JsScan::CommentSl => StateTag::CommentSlJs,
            JsScan::String(Quote::Single) => StateTag::StringSqJs,
            JsScan::String(_) => StateTag::StringDqJs,
            JsScan::Template => StateTag::TemplateJs,
            JsScan::Regexp { .. } => StateTag::RegexpJs,
        }
    }
}

// ---------------------------------------------------------------------------
// PHP
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PhpScan {
    #[default]
    Code,
    CommentMl,
    CommentSl,
    String(Quote),
    Heredoc(String),
    Nowdoc(String),
}

/// An open `{$...}` interpolation inside a PHP string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interp {
    /// Brace depth outside the `{`.
    pub depth: u16,
    /// String scan to resume at the matching `}`.
    pub resume: PhpScan,
}

/// What the next PHP name or variable is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PhpExpect {
    #[default]
    None,
    NamespaceName,
    ClassName,
    FunctionName,
    ClassRef,
    /// Variables until `;` or `)` are declarations (`global`, `static`, `catch`).
    Declare,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PhpState {
    pub scan: PhpScan,
    pub depth: u16,
    pub paren: u16,
    pub interp: SmallVec<[Interp; 1]>,
    pub prev: Prev,
    pub expect: PhpExpect,
    /// After `as` inside `foreach (...)`; `=>` keeps declaring.
    pub foreach_as: bool,
    pub pending: Option<PendingScope>,
    pub scopes: ScopeStack,
}

impl PhpState {
    #[must_use]
    pub fn tag(&self) -> StateTag {
        match &self.scan {
            PhpScan::Code if !self.interp.is_empty() => StateTag::ExpressionPhp,
            PhpScan::Code => StateTag::None,
            PhpScan::CommentMl => StateTag::CommentMlPhp,
            PhpScan::CommentSl => StateTag::CommentSlPhp,
            PhpScan::String(Quote::Single) => StateTag::StringSqPhp,
            PhpScan::String(_) => StateTag::StringDqPhp,
            PhpScan::Heredoc(_) => StateTag::Heredoc,
            PhpScan::Nowdoc(_) => StateTag::Nowdoc,
        }
    }
}

// ---------------------------------------------------------------------------
// LexState
// ---------------------------------------------------------------------------

/// Complete lexer state at a line boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LexState {
    pub mode: Mode,
    /// Mode to return to when the current embedded region ends.
    pub prev_mode: Mode,
    pub html: HtmlState,
    pub css: CssState,
    pub js: JsState,
    pub php: PhpState,
}

impl LexState {
    /// A fresh state with nothing open.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            prev_mode: Mode::Html,
            ..Self::default()
        }
    }

    /// Open construct of the active mode.
    #[must_use]
    pub fn state_tag(&self) -> StateTag {
        self.tag_of(self.mode)
    }

    /// Open construct of the mode enclosing the active one.
    #[must_use]
    pub fn prev_state(&self) -> StateTag {
        match self.mode {
            Mode::Php => self.tag_of(self.prev_mode),
            Mode::Js | Mode::Css => self.html.tag(),
            Mode::Html | Mode::Unknown => StateTag::None,
        }
    }

    /// Open construct two levels out (HTML around JS/CSS around PHP).
    #[must_use]
    pub fn prev_prev_state(&self) -> StateTag {
        match (self.mode, self.prev_mode) {
            (Mode::Php, Mode::Js | Mode::Css) => self.html.tag(),
            _ => StateTag::None,
        }
    }

    fn tag_of(&self, mode: Mode) -> StateTag {
        match mode {
            Mode::Html => self.html.tag(),
            Mode::Php => self.php.tag(),
            Mode::Js => self.js.tag(),
            Mode::Css => self.css.tag(),
            Mode::Unknown => StateTag::None,
        }
    }

    /// Whether the active mode is inside a string or comment.
    #[must_use]
    pub fn in_string_or_comment(&self) -> bool {
        let tag = self.state_tag();
        tag.is_string() || tag.is_comment()
    }

    /// Scope stack consulted for position queries in `mode`.
    #[must_use]
    pub fn scopes_for(&self, mode: Mode) -> &ScopeStack {
        match mode {
            Mode::Js => &self.js.scopes,
            Mode::Css => &self.css.scopes,
            _ => &self.php.scopes,
        }
    }
}
