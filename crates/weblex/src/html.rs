//! HTML tokenizer: tags, attributes, comments, entities and the tag chain.

use weblex_core::{Mode, StyleClass, chars};

use crate::line::{LineCx, Tokenizer};
use crate::state::{HtmlScan, LexState, Quote};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMarkKind {
    Open,
    Close,
    /// Void element or `<x/>`: no chain change.
    SelfClosed,
}

/// A completed tag on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMark {
    /// Column of `<`, or 0 when the tag started on an earlier line.
    pub start: usize,
    /// Column after `>`.
    pub end: usize,
    /// Lowercased element name.
    pub name: String,
    pub kind: TagMarkKind,
}

impl TagMark {
    /// Replay this tag on an ancestor chain.
    pub fn apply(&self, chain: &mut Vec<String>) {
        match self.kind {
            TagMarkKind::Open => chain.push(self.name.clone()),
            TagMarkKind::Close => close_in_chain(chain, &self.name),
            TagMarkKind::SelfClosed => {}
        }
    }

    #[must_use]
    pub const fn contains(&self, col: usize) -> bool {
        col >= self.start && col < self.end
    }
}

/// Pop `name` and everything opened after it. Unmatched closes are ignored.
fn close_in_chain(chain: &mut Vec<String>, name: &str) {
    if let Some(pos) = chain.iter().rposition(|n| n == name) {
        chain.truncate(pos);
    }
}

pub(crate) struct Html;

impl Tokenizer for Html {
    fn step(cx: &mut LineCx<'_>, i: usize) -> usize {
        match cx.state.html.scan {
            HtmlScan::Text => text(cx, i),
            HtmlScan::Comment => comment(cx, i),
            HtmlScan::Tag { .. } => in_tag(cx, i),
        }
    }

    fn end_line(_: &mut LexState, _: &[char]) {}
}

fn text(cx: &mut LineCx<'_>, i: usize) -> usize {
    match cx.chars[i] {
        '<' => open_angle(cx, i),
        '&' => entity(cx, i),
        _ => cx.scan_while(i + 1, |c| c != '<' && c != '&'),
    }
}

fn open_angle(cx: &mut LineCx<'_>, i: usize) -> usize {
    if cx.starts_with(i, "<!--") {
        cx.push_range(i, i + 4, StyleClass::Comment);
        cx.state.html.scan = HtmlScan::Comment;
        return i + 4;
    }
    let closing = cx.at(i + 1) == Some('/');
    let name_start = if closing { i + 2 } else { i + 1 };
    let bang = !closing && cx.at(name_start) == Some('!');
    let first = if bang { name_start + 1 } else { name_start };
    if !cx.at(first).is_some_and(chars::is_alpha) {
        return i + 1;
    }
    let end = cx.scan_while(first, chars::is_markup_name_char);
    let name: String = cx.chars[name_start..end]
        .iter()
        .map(char::to_ascii_lowercase)
        .collect();
    cx.push_range(i, end, StyleClass::Tag);
    cx.tag_start = Some(i);
    cx.state.html.scan = HtmlScan::Tag {
        name,
        closing,
        self_closing: false,
        quote: None,
    };
    end
}

/// `&name;`, `&#123;` or `&#x1F;`.
fn entity(cx: &mut LineCx<'_>, i: usize) -> usize {
    let body = if cx.at(i + 1) == Some('#') {
        if matches!(cx.at(i + 2), Some('x' | 'X')) {
            cx.scan_while(i + 3, chars::is_hex_digit)
        } else {
            cx.scan_while(i + 2, |c| c.is_ascii_digit())
        }
    } else {
        cx.scan_while(i + 1, |c| c.is_ascii_alphanumeric())
    };
    if body > i + 1 && cx.at(body) == Some(';') {
        if cx.flags.cosmetic {
            cx.push_range(i, body + 1, StyleClass::Constant);
        }
        return body + 1;
    }
    i + 1
}

fn comment(cx: &mut LineCx<'_>, i: usize) -> usize {
    let close = (i..cx.len()).find(|&k| cx.starts_with(k, "-->"));
    let end = close.map_or(cx.len(), |k| k + 3);
    let stop = cx.body_end(i, end);
    cx.push_range(i, stop, StyleClass::Comment);
    if close.is_some() && stop == end {
        cx.state.html.scan = HtmlScan::Text;
    }
    stop
}

fn in_tag(cx: &mut LineCx<'_>, i: usize) -> usize {
    let quote = match &cx.state.html.scan {
        HtmlScan::Tag { quote, .. } => *quote,
        _ => return i + 1,
    };
    if let Some(q) = quote {
        return attribute_value(cx, i, q);
    }
    let c = cx.chars[i];
    match c {
        '>' => {
            cx.push_range(i, i + 1, StyleClass::Tag);
            finish_tag(cx, i + 1);
            i + 1
        }
        '/' if cx.at(i + 1) == Some('>') => {
            if let HtmlScan::Tag { self_closing, .. } = &mut cx.state.html.scan {
                *self_closing = true;
            }
            cx.push_range(i, i + 1, StyleClass::Tag);
            i + 1
        }
        '=' => {
            cx.push_range(i, i + 1, StyleClass::Operator);
            i + 1
        }
        '"' | '\'' => {
            if let HtmlScan::Tag { quote, .. } = &mut cx.state.html.scan {
                *quote = Quote::from_char(c);
            }
            cx.push_range(i, i + 1, StyleClass::String);
            i + 1
        }
        // A new tag before `>`: drop the broken one.
        '<' => {
            cx.state.html.scan = HtmlScan::Text;
            cx.tag_start = None;
            text(cx, i)
        }
        c if chars::is_whitespace(c) => cx.scan_while(i, chars::is_whitespace),
        c if chars::is_alpha(c) => {
            let end = cx.scan_while(i, chars::is_markup_name_char);
            cx.push_range(i, end, StyleClass::Attribute);
            end
        }
        _ => i + 1,
    }
}

/// Quoted attribute value up to the closing quote.
fn attribute_value(cx: &mut LineCx<'_>, i: usize, q: Quote) -> usize {
    let close = (i..cx.len()).find(|&k| cx.chars[k] == q.as_char());
    let end = close.map_or(cx.len(), |k| k + 1);
    let stop = cx.body_end(i, end);
    cx.push_range(i, stop, StyleClass::String);
    if close.is_some()
        && stop == end
        && let HtmlScan::Tag { quote, .. } = &mut cx.state.html.scan
    {
        *quote = None;
    }
    stop
}

/// The `>` ending the current tag was consumed; `end` is the column after it.
fn finish_tag(cx: &mut LineCx<'_>, end: usize) {
    let HtmlScan::Tag {
        name,
        closing,
        self_closing,
        ..
    } = std::mem::take(&mut cx.state.html.scan)
    else {
        return;
    };
    let start = cx.tag_start.take().unwrap_or(0);
    let kind = if closing {
        close_in_chain(&mut cx.state.html.chain, &name);
        TagMarkKind::Close
    } else if self_closing || cx.tables.is_void_element(&name) {
        TagMarkKind::SelfClosed
    } else {
        cx.state.html.chain.push(name.clone());
        TagMarkKind::Open
    };
    if kind == TagMarkKind::Open && cx.kind.is_mixed() {
        match name.as_str() {
            "script" => cx.switch_mode(Mode::Js, end),
            "style" => cx.switch_mode(Mode::Css, end),
            _ => {}
        }
    }
    cx.tag_marks.push(TagMark {
        start,
        end,
        name,
        kind,
    });
}

#[cfg(test)]
mod tests {
    use weblex_core::{DocumentKind, FormatRange, LanguageTables};

    use super::*;
    use crate::line::{LexFlags, LineData, LineLexer};
    use crate::state::StateTag;

    fn lex_from(kind: DocumentKind, text: &str, state: &LexState) -> LineData {
        let tables = LanguageTables::builtin();
        LineLexer::new(&tables, kind).lex_line(text, state)
    }

    fn lex(text: &str) -> LineData {
        lex_from(DocumentKind::Html, text, &LexState::default())
    }

    fn styles(data: &LineData) -> Vec<(usize, usize, StyleClass)> {
        data.ranges
            .iter()
            .map(|r: &FormatRange| (r.start, r.end(), r.style))
            .collect()
    }

    // -- tags ----------------------------------------------------------------

    #[test]
    fn tag_with_attribute() {
        let data = lex(r#"<a href="x">hi</a>"#);
        assert_eq!(
            styles(&data),
            vec![
                (0, 2, StyleClass::Tag),
                (3, 7, StyleClass::Attribute),
                (7, 8, StyleClass::Operator),
                (8, 11, StyleClass::String),
                (11, 12, StyleClass::Tag),
                (14, 18, StyleClass::Tag),
            ]
        );
        assert!(data.end_state.html.chain.is_empty());
        assert_eq!(data.tag_marks.len(), 2);
        assert_eq!(data.tag_marks[0].kind, TagMarkKind::Open);
        assert_eq!(data.tag_marks[1].kind, TagMarkKind::Close);
    }

    #[test]
    fn chain_tracks_ancestors() {
        let data = lex("<html><body><DIV class=x>");
        assert_eq!(data.end_state.html.chain, vec!["html", "body", "div"]);
    }

    #[test]
    fn void_and_self_closing_do_not_nest() {
        let data = lex("<div><br><img src=a /><x-y/>");
        assert_eq!(data.end_state.html.chain, vec!["div"]);
        assert!(
            data.tag_marks[1..]
                .iter()
                .all(|m| m.kind == TagMarkKind::SelfClosed)
        );
    }

    #[test]
    fn unmatched_close_is_ignored() {
        let data = lex("<p></span>");
        assert_eq!(data.end_state.html.chain, vec!["p"]);
    }

    #[test]
    fn close_pops_unclosed_children() {
        let data = lex("<ul><li>a<li>b</ul>");
        assert!(data.end_state.html.chain.is_empty());
    }

    #[test]
    fn tag_spanning_lines() {
        let first = lex(r#"<input type="text"#);
        assert_eq!(first.end_state.state_tag(), StateTag::StringDqHtml);
        let second = lex_from(DocumentKind::Html, r#"" value=1>"#, &first.end_state);
        assert_eq!(second.end_state.state_tag(), StateTag::None);
        assert_eq!(second.tag_marks[0].start, 0);
        assert_eq!(second.tag_marks[0].name, "input");
    }

    // -- comments and entities -----------------------------------------------

    #[test]
    fn comment_across_lines() {
        let first = lex("a <!-- b");
        assert_eq!(first.end_state.state_tag(), StateTag::CommentMlHtml);
        assert_eq!(styles(&first), vec![(2, 8, StyleClass::Comment)]);
        let second = lex_from(DocumentKind::Html, "c --> <b>", &first.end_state);
        assert_eq!(second.end_state.state_tag(), StateTag::None);
        assert_eq!(second.ranges[0], FormatRange::new(0, 5, StyleClass::Comment));
    }

    #[test]
    fn tags_inside_comment_are_ignored() {
        let data = lex("<!-- <div> -->");
        assert!(data.tag_marks.is_empty());
        assert!(data.end_state.html.chain.is_empty());
    }

    #[test]
    fn entities_are_constants() {
        let data = lex("a &amp; b &#169; &#x1F600; & c");
        assert_eq!(
            styles(&data),
            vec![
                (2, 7, StyleClass::Constant),
                (10, 16, StyleClass::Constant),
                (17, 26, StyleClass::Constant),
            ]
        );
    }

    #[test]
    fn entities_are_plain_without_cosmetics() {
        let tables = LanguageTables::builtin();
        let lexer = LineLexer::new(&tables, DocumentKind::Html).with_flags(LexFlags::MINIMAL);
        let data = lexer.lex_line("a &amp; b", &LexState::default());
        assert!(data.ranges.is_empty());
    }

    #[test]
    fn less_than_in_text_is_not_a_tag() {
        let data = lex("a < b");
        assert!(data.ranges.is_empty());
        assert_eq!(data.end_state.state_tag(), StateTag::None);
    }

    #[test]
    fn doctype_is_void() {
        let data = lex("<!DOCTYPE html>");
        assert_eq!(data.tag_marks[0].name, "!doctype");
        assert_eq!(data.tag_marks[0].kind, TagMarkKind::SelfClosed);
    }

    #[test]
    fn script_only_switches_in_mixed_documents() {
        let plain = lex("<script>");
        assert_eq!(plain.end_state.mode, Mode::Html);
        let mixed = lex_from(DocumentKind::Mixed, "<script>", &LexState::default());
        assert_eq!(mixed.end_state.mode, Mode::Js);
        assert_eq!(mixed.end_state.html.chain, vec!["script"]);
    }
}
