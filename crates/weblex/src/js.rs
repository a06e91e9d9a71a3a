//! JavaScript tokenizer.
//!
//! A `/` starts a regexp unless the previous significant token ends an
//! operand (identifier, literal, `)` or `]`). Template literals nest code
//! through `${`; the brace depth at each `${` is kept so the matching `}`
//! resumes the template.

use weblex_core::{StyleClass, chars};

use crate::line::{LineCx, Tokenizer};
use crate::scope::{ANONYMOUS_CLASS, ANONYMOUS_FUNCTION, ScopeKind, ScopeLang};
use crate::state::{JsExpect, JsScan, LexState, Params, PendingScope, Prev, Quote};

pub(crate) struct Js;

impl Tokenizer for Js {
    fn step(cx: &mut LineCx<'_>, i: usize) -> usize {
        match cx.state.js.scan {
            JsScan::Code => code(cx, i),
            JsScan::CommentMl => block_comment(cx, i),
            JsScan::CommentSl => {
                let stop = cx.body_end(i, cx.len());
                cx.push_range(i, stop, StyleClass::Comment);
                stop
            }
            JsScan::String(q) => string(cx, i, q),
            JsScan::Template => template(cx, i),
            JsScan::Regexp { in_class } => regexp(cx, i, in_class),
        }
    }

    /// Line comments and regexps end with the line; quoted strings too,
    /// unless the line ends in an escaping backslash.
    fn end_line(state: &mut LexState, chars: &[char]) {
        let js = &mut state.js;
        match js.scan {
            JsScan::CommentSl => js.scan = JsScan::Code,
            JsScan::Regexp { .. } => {
                js.scan = JsScan::Code;
                js.prev = Prev::Value;
            }
            JsScan::String(_) if !chars::is_escaped(chars, chars.len()) => {
                js.scan = JsScan::Code;
                js.prev = Prev::Value;
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Literal and comment bodies
// ---------------------------------------------------------------------------

fn block_comment(cx: &mut LineCx<'_>, i: usize) -> usize {
    let close = (i..cx.len()).find(|&k| cx.starts_with(k, "*/"));
    let end = close.map_or(cx.len(), |k| k + 2);
    let stop = cx.body_end(i, end);
    cx.push_range(i, stop, StyleClass::Comment);
    if close.is_some() && stop == end {
        cx.state.js.scan = JsScan::Code;
    }
    stop
}

fn string(cx: &mut LineCx<'_>, i: usize, q: Quote) -> usize {
    let close = (i..cx.len())
        .find(|&k| cx.chars[k] == q.as_char() && !chars::is_escaped(cx.chars, k));
    let end = close.map_or(cx.len(), |k| k + 1);
    let stop = cx.body_end(i, end);
    cx.push_range(i, stop, StyleClass::String);
    if close.is_some() && stop == end {
        cx.state.js.scan = JsScan::Code;
        cx.state.js.prev = Prev::Value;
    }
    stop
}

fn template(cx: &mut LineCx<'_>, i: usize) -> usize {
    let len = cx.len();
    let mut k = i;
    while k < len {
        match cx.chars[k] {
            '\\' => {
                k += 2;
                continue;
            }
            '`' => {
                cx.push_range(i, k + 1, StyleClass::String);
                cx.state.js.scan = JsScan::Code;
                cx.state.js.prev = Prev::Value;
                return k + 1;
            }
            '$' if cx.at(k + 1) == Some('{') => {
                if k > i {
                    cx.push_range(i, k, StyleClass::String);
                    return k;
                }
                cx.push_range(k, k + 2, StyleClass::Interpolation);
                let js = &mut cx.state.js;
                js.template_exprs.push(js.depth);
                js.depth = js.depth.saturating_add(1);
                js.scan = JsScan::Code;
                js.prev = Prev::None;
                return k + 2;
            }
            '<' if k > i && cx.kind.is_mixed() => {
                cx.push_range(i, k, StyleClass::String);
                return k;
            }
            _ => k += 1,
        }
    }
    cx.push_range(i, len, StyleClass::String);
    len
}

fn regexp(cx: &mut LineCx<'_>, i: usize, mut in_class: bool) -> usize {
    let len = cx.len();
    let mut k = i;
    while k < len {
        match cx.chars[k] {
            '\\' => {
                k += 2;
                continue;
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                let end = cx.scan_while(k + 1, |c| c.is_ascii_alphabetic());
                cx.push_range(i, end, StyleClass::Regexp);
                cx.state.js.scan = JsScan::Code;
                cx.state.js.prev = Prev::Value;
                return end;
            }
            '<' if k > i && cx.kind.is_mixed() => {
                cx.push_range(i, k, StyleClass::Regexp);
                cx.state.js.scan = JsScan::Regexp { in_class };
                return k;
            }
            _ => {}
        }
        k += 1;
    }
    cx.push_range(i, len, StyleClass::Regexp);
    cx.state.js.scan = JsScan::Regexp { in_class };
    len
}

// ---------------------------------------------------------------------------
// Code
// ---------------------------------------------------------------------------

fn code(cx: &mut LineCx<'_>, i: usize) -> usize {
    let c = cx.chars[i];
    let next = cx.at(i + 1);
    if !chars::is_whitespace(c) && !(c == '/' && matches!(next, Some('*' | '/'))) {
        drop_expression_arrow(cx, c);
    }
    match c {
        c if chars::is_whitespace(c) => cx.scan_while(i, chars::is_whitespace),
        '/' if next == Some('*') => {
            cx.push_range(i, i + 2, StyleClass::Comment);
            cx.state.js.scan = JsScan::CommentMl;
            i + 2
        }
        '/' if next == Some('/') => {
            cx.push_range(i, i + 2, StyleClass::Comment);
            cx.state.js.scan = JsScan::CommentSl;
            i + 2
        }
        '/' if cx.state.js.prev.ends_operand() => {
            cx.push_range(i, i + 1, StyleClass::Operator);
            cx.state.js.prev = Prev::Punct('/');
            i + 1
        }
        '/' => {
            cx.push_range(i, i + 1, StyleClass::Regexp);
            cx.state.js.scan = JsScan::Regexp { in_class: false };
            i + 1
        }
        '"' | '\'' | '`' => {
            cx.push_range(i, i + 1, StyleClass::String);
            cx.state.js.scan = match Quote::from_char(c) {
                Some(Quote::Backtick) => JsScan::Template,
                Some(q) => JsScan::String(q),
                None => JsScan::Code,
            };
            i + 1
        }
        c if c.is_ascii_digit() => number(cx, i),
        '.' if next.is_some_and(|n| n.is_ascii_digit()) => number(cx, i),
        c if chars::is_js_ident_start(c) => word(cx, i),
        '{' => {
            open_brace(cx, i);
            i + 1
        }
        '}' => {
            close_brace(cx, i);
            i + 1
        }
        '(' => {
            let js = &mut cx.state.js;
            if let Some(p) = js.pending.as_mut()
                && p.params == Params::Awaiting
            {
                p.params = Params::Open(js.paren);
            }
            js.paren = js.paren.saturating_add(1);
            js.prev = Prev::Punct('(');
            cx.push_range(i, i + 1, StyleClass::Punctuation);
            i + 1
        }
        ')' => {
            let js = &mut cx.state.js;
            if let Some(p) = js.pending.as_mut()
                && p.in_params(js.paren)
            {
                p.params = Params::Closed;
            }
            js.paren = js.paren.saturating_sub(1);
            js.prev = Prev::Value;
            cx.push_range(i, i + 1, StyleClass::Punctuation);
            i + 1
        }
        ']' => {
            cx.state.js.prev = Prev::Value;
            cx.push_range(i, i + 1, StyleClass::Punctuation);
            i + 1
        }
        ';' => {
            let js = &mut cx.state.js;
            js.pending = None;
            js.decl_at = None;
            js.expect = JsExpect::None;
            js.prev = Prev::Punct(';');
            cx.push_range(i, i + 1, StyleClass::Punctuation);
            i + 1
        }
        ',' => {
            let js = &mut cx.state.js;
            if js.decl_at == Some((js.paren, js.depth)) {
                js.expect = JsExpect::VarName;
            }
            js.prev = Prev::Punct(',');
            cx.push_range(i, i + 1, StyleClass::Punctuation);
            i + 1
        }
        '.' => {
            cx.state.js.prev = Prev::Dot;
            cx.push_range(i, i + 1, StyleClass::Punctuation);
            i + 1
        }
        '=' if next == Some('>') => {
            arrow(cx, i);
            i + 2
        }
        '+' | '-' | '*' | '%' | '=' | '<' | '>' | '!' | '&' | '|' | '^' | '~' | '?' | ':' => {
            cx.state.js.prev = Prev::Punct(c);
            cx.push_range(i, i + 1, StyleClass::Operator);
            i + 1
        }
        _ => {
            cx.state.js.prev = Prev::Punct(c);
            cx.push_range(i, i + 1, StyleClass::Punctuation);
            i + 1
        }
    }
}

/// Decimal, hex/binary/octal, exponent and bigint literals.
fn number(cx: &mut LineCx<'_>, i: usize) -> usize {
    let radix =
        cx.chars[i] == '0' && matches!(cx.at(i + 1), Some('x' | 'X' | 'b' | 'B' | 'o' | 'O'));
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
    if cx.at(end) == Some('n') {
        end += 1;
    }
    cx.push_range(i, end, StyleClass::Number);
    cx.state.js.prev = Prev::Value;
    end
}

fn arrow(cx: &mut LineCx<'_>, i: usize) {
    cx.push_range(i, i + 2, StyleClass::Operator);
    let body = cx.next_significant(i + 2).map(|(_, c)| c);
    let js = &mut cx.state.js;
    if matches!(body, None | Some('{')) {
        let mut pending = PendingScope::new(ScopeKind::FuncJs, ANONYMOUS_FUNCTION);
        pending.params = Params::Closed;
        js.pending = Some(pending);
    }
    js.prev = Prev::Punct('>');
}

/// An arrow left pending at the end of a line only opens a scope if its
/// body turns out to be a block.
fn drop_expression_arrow(cx: &mut LineCx<'_>, c: char) {
    let js = &mut cx.state.js;
    let arrow_pending = js.pending.as_ref().is_some_and(|p| {
        p.kind == ScopeKind::FuncJs && p.name == ANONYMOUS_FUNCTION && p.params == Params::Closed
    });
    if c != '{' && arrow_pending && js.prev == Prev::Punct('>') {
        js.pending = None;
    }
}

fn open_brace(cx: &mut LineCx<'_>, i: usize) {
    cx.push_range(i, i + 1, StyleClass::Punctuation);
    let depth = cx.state.js.depth;
    if let Some(p) = cx
        .state
        .js
        .pending
        .take_if(|p| !matches!(p.params, Params::Open(_)))
    {
        cx.tracker(ScopeLang::Js)
            .on_scope_open(p.kind, &p.name, depth, i, &p.param_names);
    }
    let js = &mut cx.state.js;
    js.depth = depth.saturating_add(1);
    js.expect = JsExpect::None;
    js.prev = Prev::Punct('{');
}

fn close_brace(cx: &mut LineCx<'_>, i: usize) {
    let depth = cx.state.js.depth;
    if depth > 0 && cx.state.js.template_exprs.last() == Some(&(depth - 1)) {
        let js = &mut cx.state.js;
        js.template_exprs.pop();
        js.depth = depth - 1;
        js.scan = JsScan::Template;
        cx.push_range(i, i + 1, StyleClass::Interpolation);
        return;
    }
    cx.push_range(i, i + 1, StyleClass::Punctuation);
    cx.tracker(ScopeLang::Js).on_scope_close(depth, i + 1);
    let js = &mut cx.state.js;
    js.depth = depth.saturating_sub(1);
    js.prev = Prev::Punct('}');
}

// ---------------------------------------------------------------------------
// Words
// ---------------------------------------------------------------------------

fn word(cx: &mut LineCx<'_>, i: usize) -> usize {
    let end = cx.scan_while(i, chars::is_js_ident_char);
    let word: String = cx.chars[i..end].iter().collect();
    let next = cx.next_significant(end).map(|(_, c)| c);

    if cx.state.js.prev == Prev::Dot {
        let style = if next == Some('(') {
            StyleClass::Function
        } else {
            StyleClass::Text
        };
        cx.push_range(i, end, style);
        cx.state.js.prev = Prev::Value;
        return end;
    }

    let table = cx.tables.js.get(&word);
    if table == Some(StyleClass::Keyword) {
        keyword(cx, i, end, &word, next);
        return end;
    }

    let style = match cx.state.js.expect {
        JsExpect::FunctionName => {
            cx.tracker(ScopeLang::Js).declare_function(&word, i);
            cx.state.js.pending = Some(PendingScope::new(ScopeKind::FuncJs, word.as_str()));
            StyleClass::Function
        }
        JsExpect::ClassName => {
            cx.tracker(ScopeLang::Js).declare_class(&word, i);
            cx.state.js.pending = Some(PendingScope::new(ScopeKind::Class, word.as_str()));
            StyleClass::ClassName
        }
        JsExpect::ClassRef => StyleClass::ClassName,
        JsExpect::VarName => {
            cx.tracker(ScopeLang::Js).declare_variable(&word, i);
            StyleClass::Variable
        }
        JsExpect::None => plain_word(cx, i, &word, next, table),
    };
    cx.push_range(i, end, style);
    let js = &mut cx.state.js;
    js.expect = JsExpect::None;
    js.prev = Prev::Value;
    end
}

/// An identifier with no pending expectation.
fn plain_word(
    cx: &mut LineCx<'_>,
    i: usize,
    word: &str,
    next: Option<char>,
    table: Option<StyleClass>,
) -> StyleClass {
    let js = &cx.state.js;
    let param_of = js
        .pending
        .as_ref()
        .filter(|p| p.in_params(js.paren))
        .filter(|_| matches!(js.prev, Prev::Punct('(' | ',')))
        .map(|p| p.name.clone());
    if let Some(function) = param_of {
        let mut tracker = cx.tracker(ScopeLang::Js);
        let key = tracker.pending_key(&function);
        tracker.declare_variable_in(key, word, i);
        if let Some(p) = cx.state.js.pending.as_mut() {
            p.param_names.push(word.to_string());
        }
        return StyleClass::Variable;
    }

    let in_class_body = js
        .scopes
        .top()
        .is_some_and(|top| top.kind == ScopeKind::Class && js.depth == top.start_depth + 1);
    if in_class_body && next == Some('(') {
        cx.tracker(ScopeLang::Js).declare_function(word, i);
        cx.state.js.pending = Some(PendingScope::new(ScopeKind::FuncJs, word));
        return StyleClass::Function;
    }
    if next == Some('(') {
        return StyleClass::Function;
    }
    if let Some(style) = table {
        return style;
    }
    let mut tracker = cx.tracker(ScopeLang::Js);
    if tracker.knows(word) {
        tracker.use_variable(word);
        return StyleClass::Variable;
    }
    StyleClass::Text
}

fn keyword(cx: &mut LineCx<'_>, i: usize, end: usize, word: &str, next: Option<char>) {
    cx.push_range(i, end, StyleClass::Keyword);
    let js = &mut cx.state.js;
    js.prev = Prev::Keyword;
    match word {
        "function" if next == Some('(') => {
            js.pending = Some(PendingScope::new(ScopeKind::FuncJs, ANONYMOUS_FUNCTION));
        }
        "function" => js.expect = JsExpect::FunctionName,
        "class" if next == Some('{') => {
            js.pending = Some(PendingScope::new(ScopeKind::Class, ANONYMOUS_CLASS));
        }
        "class" => js.expect = JsExpect::ClassName,
        "var" | "let" | "const" => {
            js.decl_at = Some((js.paren, js.depth));
            js.expect = JsExpect::VarName;
        }
        "new" => {
            js.expect = JsExpect::ClassRef;
            js.prev = Prev::New;
        }
        "extends" | "instanceof" => js.expect = JsExpect::ClassRef,
        "this" | "super" | "true" | "false" | "null" | "undefined" => js.prev = Prev::Value,
        _ => {}
    }
}
