//! Mode switcher for mixed documents.
//!
//! Runs before the active tokenizer at every position and recognizes the
//! delimiters that enter or leave an embedded language:
//!
//! | mode       | delimiter                   | boundary        |
//! |------------|-----------------------------|-----------------|
//! | not PHP    | `<?php`, `<?=`, `<?` + space | after delimiter |
//! | PHP        | `?>`                         | after delimiter |
//! | JS         | `</script`                   | before `<`      |
//! | CSS        | `</style`                    | before `<`      |
//!
//! `<script>`/`<style>` are entered by the HTML tokenizer when the open tag
//! completes. PHP openers fire anywhere, including inside HTML attribute
//! values and JS strings; `?>` only fires in PHP code or a line comment.

use weblex_core::{Mode, StyleClass, chars};

use crate::line::LineCx;
use crate::scope::ScopeLang;
use crate::state::{CssScan, CssState, JsScan, JsState, PhpExpect, PhpScan};

/// A completed switch: where lexing resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Switch {
    pub next: usize,
}

pub(crate) fn try_switch(cx: &mut LineCx<'_>, i: usize) -> Option<Switch> {
    match cx.state.mode {
        Mode::Php => leave_php(cx, i),
        Mode::Js if closes_region(cx, i, "</script") => {
            reset_js(&mut cx.state.js);
            cx.tracker(ScopeLang::Js).on_region_end(i);
            cx.switch_mode(Mode::Html, i);
            Some(Switch { next: i })
        }
        Mode::Css if closes_region(cx, i, "</style") => {
            reset_css(&mut cx.state.css);
            cx.tracker(ScopeLang::Css).on_region_end(i);
            cx.switch_mode(Mode::Html, i);
            Some(Switch { next: i })
        }
        _ => enter_php(cx, i),
    }
}

fn fits(cx: &LineCx<'_>, pat: &str) -> bool {
    pat.len() <= cx.lookahead
}

/// `pat` at `i`, case-insensitive, not followed by a name char.
fn closes_region(cx: &LineCx<'_>, i: usize, pat: &str) -> bool {
    fits(cx, pat)
        && chars::starts_with_at(cx.chars, i, pat, true)
        && !cx
            .at(i + pat.len())
            .is_some_and(chars::is_markup_name_char)
}

/// Length of a PHP open delimiter at `i`, if any.
fn php_opener(cx: &LineCx<'_>, i: usize) -> Option<usize> {
    if !cx.starts_with(i, "<?") {
        return None;
    }
    if fits(cx, "<?php") && chars::starts_with_at(cx.chars, i, "<?php", true) {
        return (!cx.at(i + 5).is_some_and(chars::is_alnum)).then_some(5);
    }
    if fits(cx, "<?=") && cx.at(i + 2) == Some('=') {
        return Some(3);
    }
    match cx.at(i + 2) {
        None => Some(2),
        Some(c) if chars::is_whitespace(c) => Some(2),
        _ => None,
    }
}

fn enter_php(cx: &mut LineCx<'_>, i: usize) -> Option<Switch> {
    let len = php_opener(cx, i)?;
    let end = i + len;
    cx.push_range(i, end, StyleClass::ModeDelimiter);
    cx.state.prev_mode = cx.state.mode;
    cx.switch_mode(Mode::Php, end);
    Some(Switch { next: end })
}

fn leave_php(cx: &mut LineCx<'_>, i: usize) -> Option<Switch> {
    if !cx.starts_with(i, "?>") || !matches!(cx.state.php.scan, PhpScan::Code | PhpScan::CommentSl)
    {
        return None;
    }
    let end = i + 2;
    cx.push_range(i, end, StyleClass::ModeDelimiter);
    let php = &mut cx.state.php;
    php.scan = PhpScan::Code;
    php.interp.clear();
    php.expect = PhpExpect::None;
    php.foreach_as = false;
    let back = match cx.state.prev_mode {
        Mode::Php | Mode::Unknown => Mode::Html,
        mode => mode,
    };
    cx.state.prev_mode = Mode::Html;
    cx.switch_mode(back, end);
    Some(Switch { next: end })
}

/// `</script` ends every JS construct. Known globals survive.
fn reset_js(js: &mut JsState) {
    *js = JsState {
        scan: JsScan::Code,
        scopes: std::mem::take(&mut js.scopes),
        ..JsState::default()
    };
}

fn reset_css(css: &mut CssState) {
    *css = CssState {
        scan: CssScan::Normal,
        scopes: std::mem::take(&mut css.scopes),
        ..CssState::default()
    };
}
