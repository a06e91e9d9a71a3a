//! Capped bracket and tag-pair searches over lexed lines.
//!
//! Both searches give up after `cap` steps and report no match; malformed
//! input never makes them walk the whole document.

use tracing::debug;
use weblex_core::Mode;

use crate::document::Document;
use crate::html::{TagMark, TagMarkKind};
use crate::line::LineData;
use crate::store::LineStore;

/// Whether `col` of a lexed line is code (not a literal or comment body).
fn is_code(data: &LineData, col: usize) -> bool {
    data.state_mark_at(col).is_none_or(|m| !m.tag.is_body())
}

fn partner(c: char) -> Option<(char, bool)> {
    match c {
        '(' => Some((')', true)),
        '[' => Some((']', true)),
        '{' => Some(('}', true)),
        ')' => Some(('(', false)),
        ']' => Some(('[', false)),
        '}' => Some(('{', false)),
        _ => None,
    }
}

/// Position of the bracket matching the one at `(line, col)`, searching
/// only code of the same mode.
#[must_use]
pub fn matching_bracket<D: Document + ?Sized>(
    store: &LineStore,
    doc: &D,
    line: usize,
    col: usize,
    cap: usize,
) -> Option<(usize, usize)> {
    let data = store.get(line)?;
    let text: Vec<char> = doc.line_text(line).chars().collect();
    let open = *text.get(col)?;
    let (close, forward) = partner(open)?;
    if !is_code(data, col) {
        return None;
    }
    let mode = data.mode_at(col);

    let mut depth = 0usize;
    let mut steps = 0usize;
    let mut cur_line = line;
    let mut chars = text;
    let mut cur = Some(col);
    loop {
        let data = store.get(cur_line)?;
        while let Some(c) = cur {
            steps += 1;
            if steps > cap {
                debug!(line, col, cap, "weblex bracket search capped");
                return None;
            }
            let ch = chars[c];
            if (ch == open || ch == close) && data.mode_at(c) == mode && is_code(data, c) {
                if ch == open {
                    depth += 1;
                } else {
                    depth -= 1;
                    if depth == 0 {
                        return Some((cur_line, c));
                    }
                }
            }
            cur = if forward {
                (c + 1 < chars.len()).then_some(c + 1)
            } else {
                c.checked_sub(1)
            };
        }

        cur_line = if forward {
            (cur_line + 1 < store.len()).then_some(cur_line + 1)?
        } else {
            cur_line.checked_sub(1)?
        };
        steps += 1;
        if steps > cap {
            debug!(line, col, cap, "weblex bracket search capped");
            return None;
        }
        chars = doc.line_text(cur_line).chars().collect();
        cur = if forward {
            (!chars.is_empty()).then_some(0)
        } else {
            chars.len().checked_sub(1)
        };
    }
}

/// The tag mark matching the open or close tag covering `(line, col)`,
/// counting nested tags of the same name.
#[must_use]
pub fn matching_tag(
    store: &LineStore,
    line: usize,
    col: usize,
    cap: usize,
) -> Option<(usize, TagMark)> {
    let data = store.get(line)?;
    let (index, mark) = data
        .tag_marks
        .iter()
        .enumerate()
        .find(|(_, m)| m.contains(col))?;
    let forward = match mark.kind {
        TagMarkKind::Open => true,
        TagMarkKind::Close => false,
        TagMarkKind::SelfClosed => return None,
    };
    if data.mode_at(mark.start) != Mode::Html {
        return None;
    }
    let name = mark.name.as_str();

    let mut depth = 0usize;
    let mut steps = 0usize;
    let mut cur_line = line;
    let mut next = Some(index);
    loop {
        let marks = &store.get(cur_line)?.tag_marks;
        while let Some(i) = next {
            steps += 1;
            if steps > cap {
                debug!(line, col, cap, "weblex tag search capped");
                return None;
            }
            let m = &marks[i];
            if m.name == name {
                let opens = match m.kind {
                    TagMarkKind::Open => forward,
                    TagMarkKind::Close => !forward,
                    TagMarkKind::SelfClosed => {
                        next = step(i, marks.len(), forward);
                        continue;
                    }
                };
                if opens {
                    depth += 1;
                } else {
                    depth -= 1;
                    if depth == 0 {
                        return Some((cur_line, m.clone()));
                    }
                }
            }
            next = step(i, marks.len(), forward);
        }

        cur_line = if forward {
            (cur_line + 1 < store.len()).then_some(cur_line + 1)?
        } else {
            cur_line.checked_sub(1)?
        };
        steps += 1;
        if steps > cap {
            debug!(line, col, cap, "weblex tag search capped");
            return None;
        }
        let len = store.get(cur_line)?.tag_marks.len();
        next = if forward {
            (len > 0).then_some(0)
        } else {
            len.checked_sub(1)
        };
    }
}

fn step(i: usize, len: usize, forward: bool) -> Option<usize> {
    if forward {
        (i + 1 < len).then_some(i + 1)
    } else {
        i.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use weblex_core::{DocumentKind, LanguageTables};

    use super::*;
    use crate::line::LineLexer;

    fn lexed(kind: DocumentKind, lines: &[&str]) -> LineStore {
        let tables = LanguageTables::builtin();
        let lexer = LineLexer::new(&tables, kind);
        let mut store = LineStore::new();
        store.resize(lines.len());
        let mut state = lexer.initial_state();
        for (n, text) in lines.iter().enumerate() {
            let data = lexer.lex_line(text, &state);
            state = data.end_state.clone();
            store.save(n, data);
        }
        store
    }

    // -- brackets ------------------------------------------------------------

    #[test]
    fn brackets_across_lines() {
        let lines = ["function f(a) {", "  if (a) { g(); }", "}"];
        let store = lexed(DocumentKind::Js, &lines);
        assert_eq!(matching_bracket(&store, &lines[..], 0, 14, 100), Some((2, 0)));
        assert_eq!(matching_bracket(&store, &lines[..], 2, 0, 100), Some((0, 14)));
        assert_eq!(matching_bracket(&store, &lines[..], 1, 5, 100), Some((1, 7)));
        assert_eq!(matching_bracket(&store, &lines[..], 0, 0, 100), None);
    }

    #[test]
    fn brackets_in_strings_are_skipped() {
        let lines = ["f(')', \"(\", /* ) */ x)"];
        let store = lexed(DocumentKind::Js, &lines);
        assert_eq!(matching_bracket(&store, &lines[..], 0, 1, 100), Some((0, 21)));
        assert_eq!(matching_bracket(&store, &lines[..], 0, 3, 100), None);
    }

    #[test]
    fn brackets_stay_in_mode() {
        let lines = ["<p>(<?php f(1); ?>)</p>"];
        let store = lexed(DocumentKind::Mixed, &lines);
        assert_eq!(matching_bracket(&store, &lines[..], 0, 11, 100), Some((0, 13)));
        assert_eq!(matching_bracket(&store, &lines[..], 0, 3, 100), Some((0, 18)));
    }

    #[test]
    fn bracket_search_is_capped() {
        let lines = ["(", "", "", "", ")"];
        let store = lexed(DocumentKind::Js, &lines);
        assert_eq!(matching_bracket(&store, &lines[..], 0, 0, 100), Some((4, 0)));
        assert_eq!(matching_bracket(&store, &lines[..], 0, 0, 3), None);
    }

    // -- tags ----------------------------------------------------------------

    #[test]
    fn nested_same_name_tags() {
        let lines = ["<div><div>", "<br></div>", "</div>"];
        let store = lexed(DocumentKind::Html, &lines);
        let (line, mark) = matching_tag(&store, 0, 1, 100).unwrap();
        assert_eq!((line, mark.start), (2, 0));
        let (line, mark) = matching_tag(&store, 1, 6, 100).unwrap();
        assert_eq!((line, mark.start), (0, 5));
    }

    #[test]
    fn void_and_unmatched_tags() {
        let lines = ["<br>", "<p>"];
        let store = lexed(DocumentKind::Html, &lines);
        assert!(matching_tag(&store, 0, 1, 100).is_none());
        assert!(matching_tag(&store, 1, 1, 100).is_none());
    }

    #[test]
    fn tag_search_is_capped() {
        let lines = ["<ul>", "<li></li>", "<li></li>", "</ul>"];
        let store = lexed(DocumentKind::Html, &lines);
        assert!(matching_tag(&store, 0, 1, 100).is_some());
        assert!(matching_tag(&store, 0, 1, 3).is_none());
    }
}
