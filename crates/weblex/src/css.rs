//! CSS tokenizer.
//!
//! Selector position and declaration blocks are told apart by brace depth:
//! inside `depth - open @media blocks > 0` a block holds declarations.

use weblex_core::{StyleClass, chars};

use crate::line::{LineCx, Tokenizer};
use crate::scope::{ScopeKind, ScopeLang};
use crate::state::{CssScan, LexState, Quote};

pub(crate) struct Css;

impl Tokenizer for Css {
    fn step(cx: &mut LineCx<'_>, i: usize) -> usize {
        match cx.state.css.scan {
            CssScan::Comment => comment(cx, i),
            CssScan::String(q) => string(cx, i, q),
            CssScan::Normal => {
                let collecting = cx.state.css.pending_media.is_some();
                let next = normal(cx, i);
                if collecting && let Some(header) = cx.state.css.pending_media.as_mut() {
                    header.extend(&cx.chars[i..next]);
                }
                next
            }
        }
    }

    /// Strings end at the line end unless escaped.
    fn end_line(state: &mut LexState, chars: &[char]) {
        if matches!(state.css.scan, CssScan::String(_)) && !chars::is_escaped(chars, chars.len()) {
            state.css.scan = CssScan::Normal;
        }
    }
}

fn comment(cx: &mut LineCx<'_>, i: usize) -> usize {
    let close = (i..cx.len()).find(|&k| cx.starts_with(k, "*/"));
    let end = close.map_or(cx.len(), |k| k + 2);
    let stop = cx.body_end(i, end);
    cx.push_range(i, stop, StyleClass::Comment);
    if close.is_some() && stop == end {
        cx.state.css.scan = CssScan::Normal;
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
        cx.state.css.scan = CssScan::Normal;
    }
    stop
}

fn normal(cx: &mut LineCx<'_>, i: usize) -> usize {
    let c = cx.chars[i];
    let in_decl = cx.state.css.in_declarations();
    let in_value = cx.state.css.in_value;
    match c {
        c if chars::is_whitespace(c) => cx.scan_while(i, chars::is_whitespace),
        '/' if cx.at(i + 1) == Some('*') => {
            cx.push_range(i, i + 2, StyleClass::Comment);
            cx.state.css.scan = CssScan::Comment;
            i + 2
        }
        '"' | '\'' => {
            cx.push_range(i, i + 1, StyleClass::String);
            let quote = if c == '"' { Quote::Double } else { Quote::Single };
            cx.state.css.scan = CssScan::String(quote);
            i + 1
        }
        '@' => at_rule(cx, i),
        '{' => {
            open_block(cx, i);
            i + 1
        }
        '}' => {
            close_block(cx, i);
            i + 1
        }
        ';' => {
            cx.push_range(i, i + 1, StyleClass::Punctuation);
            cx.state.css.in_value = false;
            cx.state.css.pending_media = None;
            i + 1
        }
        ':' if in_decl && !in_value => {
            cx.push_range(i, i + 1, StyleClass::Punctuation);
            cx.state.css.in_value = true;
            i + 1
        }
        ':' if !in_decl => pseudo(cx, i),
        '#' if in_value => color(cx, i),
        '#' | '.' if !in_decl && cx.at(i + 1).is_some_and(is_ident_start) => {
            let end = cx.scan_while(i + 1, chars::is_css_ident_char);
            if cx.flags.cosmetic {
                cx.push_range(i, end, StyleClass::Selector);
            }
            end
        }
        '!' if in_value => important(cx, i),
        c if c.is_ascii_digit() => number(cx, i),
        '.' | '-' | '+' if in_value && cx.at(i + 1).is_some_and(|n| n.is_ascii_digit()) => {
            number(cx, i)
        }
        c if is_ident_start(c) => ident(cx, i, in_decl, in_value),
        _ => {
            cx.push_range(i, i + 1, StyleClass::Punctuation);
            i + 1
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '-' || chars::is_alpha(c)
}

fn at_rule(cx: &mut LineCx<'_>, i: usize) -> usize {
    let end = cx.scan_while(i + 1, chars::is_css_ident_char);
    if end == i + 1 {
        cx.push_range(i, end, StyleClass::Punctuation);
        return end;
    }
    cx.push_range(i, end, StyleClass::AtRule);
    let name: String = cx.chars[i + 1..end].iter().collect();
    if name.eq_ignore_ascii_case("media") {
        cx.state.css.pending_media = Some(String::new());
    }
    end
}

fn open_block(cx: &mut LineCx<'_>, i: usize) {
    cx.push_range(i, i + 1, StyleClass::Punctuation);
    let depth = cx.state.css.depth;
    if let Some(header) = cx.state.css.pending_media.take() {
        let name = header.split_whitespace().collect::<Vec<_>>().join(" ");
        cx.state.css.media_open.push(depth);
        cx.tracker(ScopeLang::Css)
            .on_scope_open(ScopeKind::Media, &name, depth, i, &[]);
    }
    let css = &mut cx.state.css;
    css.depth = depth.saturating_add(1);
    css.in_value = false;
}

fn close_block(cx: &mut LineCx<'_>, i: usize) {
    cx.push_range(i, i + 1, StyleClass::Punctuation);
    let depth = cx.state.css.depth;
    cx.tracker(ScopeLang::Css).on_scope_close(depth, i + 1);
    let css = &mut cx.state.css;
    css.depth = depth.saturating_sub(1);
    if css.media_open.last() == Some(&css.depth) {
        css.media_open.pop();
    }
    css.in_value = false;
}

/// `:hover`, `::before` in selector position.
fn pseudo(cx: &mut LineCx<'_>, i: usize) -> usize {
    let name_start = if cx.at(i + 1) == Some(':') { i + 2 } else { i + 1 };
    let end = cx.scan_while(name_start, chars::is_css_ident_char);
    if end == name_start {
        cx.push_range(i, name_start, StyleClass::Punctuation);
        return name_start;
    }
    if cx.flags.cosmetic {
        cx.push_range(i, end, StyleClass::Selector);
    }
    end
}

/// `#rgb`, `#rrggbb` or `#rrggbbaa`.
fn color(cx: &mut LineCx<'_>, i: usize) -> usize {
    let end = cx.scan_while(i + 1, chars::is_css_ident_char);
    let digits = end - i - 1;
    let is_hex = cx.chars[i + 1..end].iter().all(|&c| chars::is_hex_digit(c));
    if cx.flags.cosmetic && is_hex && matches!(digits, 3 | 6 | 8) {
        cx.push_range(i, end, StyleClass::Color);
    }
    end.max(i + 1)
}

fn important(cx: &mut LineCx<'_>, i: usize) -> usize {
    let word = chars::skip_whitespace(cx.chars, i + 1);
    if chars::starts_with_at(cx.chars, word, "important", true) {
        let end = word + "important".len();
        cx.push_range(i, end, StyleClass::Keyword);
        return end;
    }
    cx.push_range(i, i + 1, StyleClass::Punctuation);
    i + 1
}

/// Number with optional unit (`12px`, `.5em`, `-3`, `50%`).
fn number(cx: &mut LineCx<'_>, i: usize) -> usize {
    let mut end = if matches!(cx.chars[i], '-' | '+') {
        i + 1
    } else {
        i
    };
    end = cx.scan_while(end, |c| c.is_ascii_digit() || c == '.');
    if cx.at(end) == Some('%') {
        end += 1;
    } else {
        end = cx.scan_while(end, |c| c.is_ascii_alphabetic());
    }
    cx.push_range(i, end, StyleClass::Number);
    end
}

fn ident(cx: &mut LineCx<'_>, i: usize, in_decl: bool, in_value: bool) -> usize {
    let end = cx.scan_while(i, chars::is_css_ident_char);
    let word: String = cx.chars[i..end].iter().collect();
    let style = if cx.at(end) == Some('(') {
        StyleClass::Function
    } else if in_value {
        match cx.tables.css.get(&word) {
            Some(StyleClass::Keyword) => StyleClass::Keyword,
            _ => StyleClass::Text,
        }
    } else if in_decl {
        StyleClass::Property
    } else if cx.tables.html_tags.contains(&word) {
        StyleClass::Tag
    } else {
        StyleClass::Text
    };
    cx.push_range(i, end, style);
    end
}
