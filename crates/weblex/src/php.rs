//! PHP tokenizer.
//!
//! Variables are recorded with their `$` sigil. A variable is a declaration
//! when it is a parameter, follows `global`/`static`/`catch`/a property
//! modifier, is a `foreach ... as` target, or is directly assigned with `=`;
//! every other occurrence is a use. `$this` and the superglobals are never
//! recorded.
//!
//! Heredoc and nowdoc bodies are opaque until a line whose first
//! non-whitespace text is the closing identifier.

use weblex_core::{StyleClass, chars};

use crate::line::{LineCx, Tokenizer};
use crate::scope::{ANONYMOUS_CLASS, ANONYMOUS_FUNCTION, ScopeKind, ScopeLang};
use crate::state::{Interp, LexState, Params, PendingScope, PhpExpect, PhpScan, Prev, Quote};

const SPECIAL_VARIABLES: &[&str] = &[
    "$this", "$GLOBALS", "$_SERVER", "$_GET", "$_POST", "$_FILES", "$_COOKIE", "$_SESSION",
    "$_REQUEST", "$_ENV",
];

pub(crate) struct Php;

impl Tokenizer for Php {
    fn step(cx: &mut LineCx<'_>, i: usize) -> usize {
        match &cx.state.php.scan {
            PhpScan::Code => code(cx, i),
            PhpScan::CommentMl => block_comment(cx, i),
            PhpScan::CommentSl => line_comment(cx, i),
            PhpScan::String(Quote::Single) => single_quoted(cx, i),
            PhpScan::String(q) => {
                let quote = q.as_char();
                interpolated(cx, i, Some(quote))
            }
            PhpScan::Heredoc(id) => {
                let id = id.clone();
                heredoc(cx, i, &id, true)
            }
            PhpScan::Nowdoc(id) => {
                let id = id.clone();
                heredoc(cx, i, &id, false)
            }
        }
    }

    fn end_line(state: &mut LexState, _: &[char]) {
        if state.php.scan == PhpScan::CommentSl {
            state.php.scan = PhpScan::Code;
        }
    }
}

// ---------------------------------------------------------------------------
// Literal and comment bodies
// ---------------------------------------------------------------------------

fn block_comment(cx: &mut LineCx<'_>, i: usize) -> usize {
    match (i..cx.len()).find(|&k| cx.starts_with(k, "*/")) {
        Some(k) => {
            cx.push_range(i, k + 2, StyleClass::Comment);
            cx.state.php.scan = PhpScan::Code;
            k + 2
        }
        None => {
            cx.push_range(i, cx.len(), StyleClass::Comment);
            cx.len()
        }
    }
}

/// `//` and `#` comments end at the line end or before `?>`.
fn line_comment(cx: &mut LineCx<'_>, i: usize) -> usize {
    let end = (i + 1..cx.len())
        .find(|&k| cx.starts_with(k, "?>"))
        .unwrap_or(cx.len());
    cx.push_range(i, end, StyleClass::Comment);
    end
}

fn close_string(cx: &mut LineCx<'_>) {
    cx.state.php.scan = PhpScan::Code;
    cx.state.php.prev = Prev::Value;
}

fn single_quoted(cx: &mut LineCx<'_>, i: usize) -> usize {
    let close = (i..cx.len()).find(|&k| cx.chars[k] == '\'' && !chars::is_escaped(cx.chars, k));
    match close {
        Some(k) => {
            cx.push_range(i, k + 1, StyleClass::String);
            close_string(cx);
            k + 1
        }
        None => {
            cx.push_range(i, cx.len(), StyleClass::String);
            cx.len()
        }
    }
}

/// Double-quoted, backtick and heredoc bodies with `$var`, `{$...}` and
/// `${...}` interpolation. `quote` is `None` for heredocs.
fn interpolated(cx: &mut LineCx<'_>, i: usize, quote: Option<char>) -> usize {
    let len = cx.len();
    let mut k = i;
    while k < len {
        let c = cx.chars[k];
        let next = cx.at(k + 1);
        if c == '\\' {
            k += 2;
            continue;
        }
        if Some(c) == quote {
            cx.push_range(i, k + 1, StyleClass::String);
            close_string(cx);
            return k + 1;
        }
        let simple = c == '$' && next.is_some_and(chars::is_alpha);
        let complex = (c == '{' && next == Some('$')) || (c == '$' && next == Some('{'));
        if simple || complex {
            if k > i {
                cx.push_range(i, k, StyleClass::String);
                return k;
            }
            if simple {
                let end = cx.scan_while(k + 1, chars::is_alnum);
                cx.push_range(k, end, StyleClass::Variable);
                let name: String = cx.chars[k..end].iter().collect();
                if !is_special(&name) {
                    cx.tracker(ScopeLang::Php).use_variable(&name);
                }
                return end;
            }
            // `{$` leaves the `$` to the code; `${` consumes both.
            let open = if c == '{' { 1 } else { 2 };
            cx.push_range(k, k + open, StyleClass::Interpolation);
            let php = &mut cx.state.php;
            let resume = std::mem::take(&mut php.scan);
            php.interp.push(Interp {
                depth: php.depth,
                resume,
            });
            php.depth = php.depth.saturating_add(1);
            php.prev = Prev::None;
            return k + open;
        }
        k += 1;
    }
    cx.push_range(i, len, StyleClass::String);
    len
}

fn heredoc(cx: &mut LineCx<'_>, i: usize, id: &str, interpolate: bool) -> usize {
    let at_line_start = cx.chars[..i].iter().all(|&c| chars::is_whitespace(c));
    if at_line_start {
        if cx.at(i).is_some_and(chars::is_whitespace) {
            let end = cx.scan_while(i, chars::is_whitespace);
            cx.push_range(i, end, StyleClass::String);
            return end;
        }
        let end = i + id.chars().count();
        if cx.starts_with(i, id) && !cx.at(end).is_some_and(chars::is_alnum) {
            cx.push_range(i, end, StyleClass::String);
            close_string(cx);
            return end;
        }
    }
    if interpolate {
        return interpolated(cx, i, None);
    }
    cx.push_range(i, cx.len(), StyleClass::String);
    cx.len()
}

fn is_special(name: &str) -> bool {
    SPECIAL_VARIABLES.contains(&name)
}

// ---------------------------------------------------------------------------
// Code
// ---------------------------------------------------------------------------

fn code(cx: &mut LineCx<'_>, i: usize) -> usize {
    let c = cx.chars[i];
    let next = cx.at(i + 1);
    match c {
        c if chars::is_whitespace(c) => cx.scan_while(i, chars::is_whitespace),
        '#' if next == Some('[') => punct(cx, i, 2, Prev::Punct('[')),
        '#' => open_comment(cx, i, 1, PhpScan::CommentSl),
        '/' if next == Some('/') => open_comment(cx, i, 2, PhpScan::CommentSl),
        '/' if next == Some('*') => open_comment(cx, i, 2, PhpScan::CommentMl),
        '\'' | '"' | '`' => {
            cx.push_range(i, i + 1, StyleClass::String);
            cx.state.php.scan = Quote::from_char(c).map_or(PhpScan::Code, PhpScan::String);
            i + 1
        }
        '<' if cx.starts_with(i, "<<<") => heredoc_open(cx, i),
        '$' if next.is_some_and(chars::is_alpha) => variable(cx, i),
        c if c.is_ascii_digit() => number(cx, i),
        '.' if next.is_some_and(|n| n.is_ascii_digit()) => number(cx, i),
        c if chars::is_alpha(c) => word(cx, i),
        '\\' if next.is_some_and(chars::is_alpha) => word(cx, i),
        '{' => {
            open_brace(cx, i);
            i + 1
        }
        '}' => {
            close_brace(cx, i);
            i + 1
        }
        '(' => {
            let php = &mut cx.state.php;
            if let Some(p) = php.pending.as_mut()
                && p.params == Params::Awaiting
            {
                p.params = Params::Open(php.paren);
            }
            php.paren = php.paren.saturating_add(1);
            if php.expect == PhpExpect::ClassRef {
                php.expect = PhpExpect::None;
            }
            punct(cx, i, 1, Prev::Punct('('))
        }
        ')' => {
            let php = &mut cx.state.php;
            if let Some(p) = php.pending.as_mut()
                && p.in_params(php.paren)
            {
                p.params = Params::Closed;
            }
            php.paren = php.paren.saturating_sub(1);
            php.foreach_as = false;
            if php.expect == PhpExpect::Declare {
                php.expect = PhpExpect::None;
            }
            punct(cx, i, 1, Prev::Value)
        }
        ';' => {
            semicolon(cx, i);
            i + 1
        }
        ']' => punct(cx, i, 1, Prev::Value),
        '-' if next == Some('>') => operator(cx, i, 2, Prev::Arrow),
        '?' if next == Some('-') && cx.at(i + 2) == Some('>') => operator(cx, i, 3, Prev::Arrow),
        ':' if next == Some(':') => operator(cx, i, 2, Prev::DoubleColon),
        '=' if next == Some('>') => operator(cx, i, 2, Prev::Punct('>')),
        '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' | '&' | '|' | '^' | '~' | '?'
        | ':' | '.' | '@' => operator(cx, i, 1, Prev::Punct(c)),
        _ => punct(cx, i, 1, Prev::Punct(c)),
    }
}

fn punct(cx: &mut LineCx<'_>, i: usize, len: usize, prev: Prev) -> usize {
    cx.push_range(i, i + len, StyleClass::Punctuation);
    cx.state.php.prev = prev;
    i + len
}

fn operator(cx: &mut LineCx<'_>, i: usize, len: usize, prev: Prev) -> usize {
    cx.push_range(i, i + len, StyleClass::Operator);
    cx.state.php.prev = prev;
    i + len
}

fn open_comment(cx: &mut LineCx<'_>, i: usize, len: usize, scan: PhpScan) -> usize {
    cx.push_range(i, i + len, StyleClass::Comment);
    cx.state.php.scan = scan;
    i + len
}

/// `<<<ID`, `<<<"ID"` or `<<<'ID'` (nowdoc).
fn heredoc_open(cx: &mut LineCx<'_>, i: usize) -> usize {
    let mut k = cx.scan_while(i + 3, |c| c == ' ' || c == '\t');
    let quote = cx.at(k).filter(|&c| c == '\'' || c == '"');
    if quote.is_some() {
        k += 1;
    }
    if !cx.at(k).is_some_and(chars::is_alpha) {
        return operator(cx, i, 3, Prev::Punct('<'));
    }
    let id_end = cx.scan_while(k, chars::is_alnum);
    let id: String = cx.chars[k..id_end].iter().collect();
    let end = if quote.is_some() && cx.at(id_end) == quote {
        id_end + 1
    } else {
        id_end
    };
    cx.push_range(i, end, StyleClass::String);
    cx.state.php.scan = if quote == Some('\'') {
        PhpScan::Nowdoc(id)
    } else {
        PhpScan::Heredoc(id)
    };
    end
}

fn number(cx: &mut LineCx<'_>, i: usize) -> usize {
    let radix = cx.chars[i] == '0' && matches!(cx.at(i + 1), Some('x' | 'X' | 'b' | 'B'));
    let mut end = if radix {
        cx.scan_while(i + 2, |c| c.is_ascii_hexdigit() || c == '_')
    } else {
        cx.scan_while(i, |c| c.is_ascii_digit() || c == '.' || c == '_')
    };
    if !radix && matches!(cx.at(end), Some('e' | 'E')) {
        let digits = if matches!(cx.at(end + 1), Some('+' | '-')) {
            end + 2
        } else {
            end + 1
        };
        if cx.at(digits).is_some_and(|c| c.is_ascii_digit()) {
            end = cx.scan_while(digits, |c| c.is_ascii_digit());
        }
    }
    cx.push_range(i, end, StyleClass::Number);
    cx.state.php.prev = Prev::Value;
    end
}

fn open_brace(cx: &mut LineCx<'_>, i: usize) {
    cx.push_range(i, i + 1, StyleClass::Punctuation);
    let php = &mut cx.state.php;
    let depth = php.depth;
    if php.expect == PhpExpect::NamespaceName {
        php.pending = Some(PendingScope::new(ScopeKind::Namespace, ""));
    }
    if let Some(p) = php.pending.take_if(|p| !matches!(p.params, Params::Open(_))) {
        cx.tracker(ScopeLang::Php)
            .on_scope_open(p.kind, &p.name, depth, i, &p.param_names);
    }
    let php = &mut cx.state.php;
    php.depth = depth.saturating_add(1);
    php.expect = PhpExpect::None;
    php.prev = Prev::Punct('{');
}

fn close_brace(cx: &mut LineCx<'_>, i: usize) {
    let php = &mut cx.state.php;
    let depth = php.depth;
    if depth > 0 && php.interp.last().is_some_and(|f| f.depth == depth - 1) {
        if let Some(frame) = php.interp.pop() {
            php.scan = frame.resume;
        }
        php.depth = depth - 1;
        cx.push_range(i, i + 1, StyleClass::Interpolation);
        return;
    }
    cx.push_range(i, i + 1, StyleClass::Punctuation);
    cx.tracker(ScopeLang::Php).on_scope_close(depth, i + 1);
    let php = &mut cx.state.php;
    php.depth = depth.saturating_sub(1);
    php.prev = Prev::Punct('}');
}

/// Ends statements: brace-less namespaces open here; unopened function
/// declarations (abstract, interface) are dropped.
fn semicolon(cx: &mut LineCx<'_>, i: usize) {
    cx.push_range(i, i + 1, StyleClass::Punctuation);
    let php = &mut cx.state.php;
    php.expect = PhpExpect::None;
    php.foreach_as = false;
    php.prev = Prev::Punct(';');
    let depth = php.depth;
    if let Some(p) = php.pending.take()
        && p.kind == ScopeKind::Namespace
    {
        cx.tracker(ScopeLang::Php)
            .on_braceless_namespace(&p.name, depth, i);
    }
}

fn variable(cx: &mut LineCx<'_>, i: usize) -> usize {
    let end = cx.scan_while(i + 1, chars::is_alnum);
    let name: String = cx.chars[i..end].iter().collect();
    cx.push_range(i, end, StyleClass::Variable);
    if is_special(&name) {
        cx.state.php.prev = Prev::Value;
        return end;
    }

    let assigns = cx
        .next_significant(end)
        .is_some_and(|(pos, c)| c == '=' && !matches!(cx.at(pos + 1), Some('=' | '>')));
    let php = &cx.state.php;
    let param_of = php
        .pending
        .as_ref()
        .filter(|p| p.in_params(php.paren))
        .map(|p| p.name.clone());
    let declares = php.expect == PhpExpect::Declare || php.foreach_as || assigns;

    if let Some(function) = param_of {
        let mut tracker = cx.tracker(ScopeLang::Php);
        let key = tracker.pending_key(&function);
        tracker.declare_variable_in(key, &name, i);
        if let Some(p) = cx.state.php.pending.as_mut() {
            p.param_names.push(name);
        }
    } else if declares {
        cx.tracker(ScopeLang::Php).declare_variable(&name, i);
    } else {
        cx.tracker(ScopeLang::Php).use_variable(&name);
    }
    cx.state.php.prev = Prev::Value;
    end
}

// ---------------------------------------------------------------------------
// Words
// ---------------------------------------------------------------------------

/// `FOO`, `MAX_SIZE`, `E2`: at least two chars, upper case, not a digit first.
fn is_constant_name(word: &str) -> bool {
    word.len() >= 2
        && word.starts_with(|c: char| c.is_ascii_uppercase() || c == '_')
        && word
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        && word.chars().any(|c| c.is_ascii_uppercase())
}

fn word(cx: &mut LineCx<'_>, i: usize) -> usize {
    let end = cx.scan_while(i + 1, chars::is_php_name_char);
    let word: String = cx.chars[i..end].iter().collect();
    let next = cx.next_significant(end);
    let next_char = next.map(|(_, c)| c);
    let before_double_colon = next.is_some_and(|(pos, c)| c == ':' && cx.at(pos + 1) == Some(':'));
    let prev = cx.state.php.prev;

    let style = if prev == Prev::Arrow {
        if next_char == Some('(') {
            StyleClass::Function
        } else {
            StyleClass::Text
        }
    } else if prev == Prev::DoubleColon {
        if next_char == Some('(') {
            StyleClass::Function
        } else if word.eq_ignore_ascii_case("class") {
            StyleClass::Keyword
        } else if cx.flags.cosmetic && is_constant_name(&word) {
            StyleClass::Constant
        } else {
            StyleClass::Text
        }
    } else if before_double_colon {
        StyleClass::ClassName
    } else {
        let table = cx.tables.php.get(&word);
        if table == Some(StyleClass::Keyword) {
            keyword(cx, i, end, &word, next_char);
            return end;
        }
        return named(cx, i, end, &word, next_char, table);
    };
    cx.push_range(i, end, style);
    cx.state.php.prev = Prev::Value;
    end
}

/// A name that is not a keyword nor a member access.
fn named(
    cx: &mut LineCx<'_>,
    i: usize,
    end: usize,
    word: &str,
    next: Option<char>,
    table: Option<StyleClass>,
) -> usize {
    let style = match cx.state.php.expect {
        PhpExpect::NamespaceName => {
            cx.state.php.pending = Some(PendingScope::new(ScopeKind::Namespace, word));
            cx.state.php.expect = PhpExpect::None;
            StyleClass::ClassName
        }
        PhpExpect::ClassName => {
            cx.tracker(ScopeLang::Php).declare_class(word, i);
            cx.state.php.pending = Some(PendingScope::new(ScopeKind::Class, word));
            cx.state.php.expect = PhpExpect::None;
            StyleClass::ClassName
        }
        PhpExpect::FunctionName => {
            cx.tracker(ScopeLang::Php).declare_function(word, i);
            cx.state.php.pending = Some(PendingScope::new(ScopeKind::Function, word));
            cx.state.php.expect = PhpExpect::None;
            StyleClass::Function
        }
        PhpExpect::ClassRef => {
            if next != Some(',') {
                cx.state.php.expect = PhpExpect::None;
            }
            StyleClass::ClassName
        }
        // Type hints in `catch (E $e)` and typed properties.
        PhpExpect::Declare => StyleClass::ClassName,
        PhpExpect::None => match table {
            _ if next == Some('(') => StyleClass::Function,
            Some(style) => style,
            None if cx.flags.cosmetic && is_constant_name(word) => StyleClass::Constant,
            None => StyleClass::Text,
        },
    };
    cx.push_range(i, end, style);
    cx.state.php.prev = Prev::Value;
    end
}

/// `function (` and `function &(`; `function &name(` declares by reference.
fn opens_closure(cx: &LineCx<'_>, end: usize) -> bool {
    match cx.next_significant(end) {
        Some((_, '(')) => true,
        Some((amp, '&')) => matches!(cx.next_significant(amp + 1), Some((_, '('))),
        _ => false,
    }
}

fn keyword(cx: &mut LineCx<'_>, i: usize, end: usize, word: &str, next: Option<char>) {
    cx.push_range(i, end, StyleClass::Keyword);
    let closure = opens_closure(cx, end);
    let php = &mut cx.state.php;
    let prev = std::mem::replace(&mut php.prev, Prev::Keyword);
    match word.to_ascii_lowercase().as_str() {
        "namespace" if next == Some('{') => {
            php.pending = Some(PendingScope::new(ScopeKind::Namespace, ""));
        }
        // `namespace\foo()` is a relative name, not a declaration.
        "namespace" if next == Some('\\') => {}
        "namespace" => php.expect = PhpExpect::NamespaceName,
        "class" | "interface" | "trait" | "enum" if prev == Prev::New => {
            php.pending = Some(PendingScope::new(ScopeKind::Class, ANONYMOUS_CLASS));
            php.expect = PhpExpect::None;
        }
        "class" | "interface" | "trait" | "enum" => php.expect = PhpExpect::ClassName,
        "function" if closure => {
            php.pending = Some(PendingScope::new(ScopeKind::Function, ANONYMOUS_FUNCTION));
            php.expect = PhpExpect::None;
        }
        "function" => php.expect = PhpExpect::FunctionName,
        "use" => match php.pending.as_mut() {
            Some(p) if p.kind == ScopeKind::Function && p.params == Params::Closed => {
                p.params = Params::Awaiting;
            }
            _ => php.expect = PhpExpect::None,
        },
        "new" => {
            php.expect = PhpExpect::ClassRef;
            php.prev = Prev::New;
        }
        "extends" | "implements" | "instanceof" | "insteadof" => php.expect = PhpExpect::ClassRef,
        "global" | "catch" | "public" | "private" | "protected" | "var" | "readonly" => {
            php.expect = PhpExpect::Declare;
        }
        "static" if next == Some('$') => php.expect = PhpExpect::Declare,
        "const" => php.expect = PhpExpect::None,
        "as" => php.foreach_as = true,
        _ => {}
    }
}
