//! End-to-end scenarios through the `Highlighter` facade.

use weblex::{
    DocumentKind, FormatRange, Highlighter, Mode, PassStatus, StateTag, StyleClass, TextDocument,
};

fn highlight(kind: DocumentKind, lines: &[&str]) -> (Highlighter, TextDocument) {
    let doc = TextDocument::from_lines(lines.iter().copied());
    let mut hl = Highlighter::with_builtin_tables().with_kind(kind);
    let status = hl.rehighlight_all_blocking(&doc, &mut ());
    assert!(matches!(status, PassStatus::Completed { .. }));
    (hl, doc)
}

fn spans(hl: &Highlighter, line: usize) -> Vec<(usize, usize, Mode)> {
    hl.mode_spans(line)
        .iter()
        .map(|s| (s.start, s.end, s.mode))
        .collect()
}

fn style_at(hl: &Highlighter, line: usize, col: usize) -> Option<StyleClass> {
    hl.format_ranges(line)
        .iter()
        .find(|r| r.contains(col))
        .map(|r| r.style)
}

// ── Mode switching ──────────────────────────────────────────────────────

#[test]
fn php_block_inside_html_line() {
    let (mut hl, _) = highlight(DocumentKind::Mixed, &["<?php $x = 1; ?>  "]);
    assert_eq!(spans(&hl, 0), vec![
        (0, 5, Mode::Html),
        (5, 16, Mode::Php),
        (16, 18, Mode::Html),
    ]);
    assert_eq!(style_at(&hl, 0, 6), Some(StyleClass::Variable));
    assert_eq!(hl.known_variables("::"), vec!["$x"]);
    assert_eq!(hl.variable_declaration_site("::", "$x"), Some((0, 6)));
}

#[test]
fn script_block_declares_js_global() {
    let (mut hl, _) = highlight(DocumentKind::Mixed, &["<script>var a = 1;</script>"]);
    let modes: Vec<Mode> = hl.mode_spans(0).iter().map(|s| s.mode).collect();
    assert_eq!(modes, vec![Mode::Html, Mode::Js, Mode::Html]);
    assert_eq!(hl.mode_at(0, 10), Some(Mode::Js));
    assert!(hl.known_variables("::").contains(&"a".to_string()));
}

// ── Scopes ──────────────────────────────────────────────────────────────

#[test]
fn class_scope_opens_and_closes() {
    let (hl, mut doc) = highlight(DocumentKind::Mixed, &["<?php", "class Foo {", "}"]);
    assert_eq!(hl.class_at(1, 11).as_deref(), Some("Foo"));
    assert_eq!(hl.class_at(2, 0).as_deref(), Some("Foo"));
    assert!(hl.line_data(2).is_some_and(|d| d.end_state.php.scopes.is_empty()));

    doc.insert_line(3, "$y = 2;");
    let mut hl = hl;
    hl.on_lines_inserted(&doc, 3, 1);
    assert_eq!(hl.class_at(3, 0), None);
    assert_eq!(hl.scope_key_at(3, 0).as_deref(), Some("::"));
}

// ── Literals spanning lines ─────────────────────────────────────────────

#[test]
fn unterminated_string_continues_on_next_line() {
    let (hl, _) = highlight(DocumentKind::Mixed, &["<?php $s = 'abc", "?> <b>'; $t = 1;"]);
    let end = hl.line_data(0).map(|d| d.end_state.state_tag());
    assert_eq!(end, Some(StateTag::StringSqPhp));

    // The `?>` and `<b>` are string content, not a mode boundary.
    assert_eq!(hl.mode_at(1, 0), Some(Mode::Php));
    assert_eq!(hl.mode_spans(1).len(), 1);
    assert_eq!(hl.state_at(1, 3), Some(StateTag::StringSqPhp));
    assert_eq!(hl.format_ranges(1)[0], FormatRange::new(0, 7, StyleClass::String));
    assert_eq!(hl.state_at(1, 10), Some(StateTag::None));
}

#[test]
fn heredoc_body_and_close() {
    let (hl, _) = highlight(DocumentKind::Mixed, &["<?php", "$x = <<<EOT", "hello", "EOT;"]);
    assert_eq!(hl.format_ranges(2), &[FormatRange::new(0, 5, StyleClass::String)]);
    assert!(hl.is_inside_string_or_comment(2, 0));
    assert_eq!(style_at(&hl, 3, 0), Some(StyleClass::String));
    assert_eq!(style_at(&hl, 3, 3), Some(StyleClass::Punctuation));
    assert!(
        hl.line_data(3)
            .is_some_and(|d| d.end_state.state_tag() == StateTag::None)
    );
}

// ── Incremental editing ─────────────────────────────────────────────────

#[test]
fn opening_a_comment_propagates_until_closed() {
    let (mut hl, mut doc) = highlight(DocumentKind::Js, &["a;", "b;", "c;", "*/", "d;", "e;"]);
    doc.set_line(0, "/* a;");
    let run = hl.on_line_changed(&doc, 0);
    assert_eq!(run.from, 0);
    assert!(run.converged);
    assert!((4..=5).contains(&run.lexed));
    assert_eq!(hl.state_at(2, 0), Some(StateTag::CommentMlJs));
    assert_eq!(hl.state_at(4, 0), Some(StateTag::None));
}

#[test]
fn big_file_keeps_modes_and_drops_scopes() {
    let mut hl = Highlighter::with_builtin_tables().with_kind(DocumentKind::Mixed);
    let doc = TextDocument::from_lines(["<?php class A { function f() { $v = 1; } } ?>"]);
    hl.set_big_file(Some(true));
    hl.rehighlight_all_blocking(&doc, &mut ());
    assert_eq!(hl.mode_at(0, 8), Some(Mode::Php));
    assert_eq!(hl.class_at(0, 40), None);
    assert!(hl.known_classes().is_empty());

    hl.set_big_file(None);
    hl.rehighlight_all_blocking(&doc, &mut ());
    assert_eq!(hl.class_at(0, 40).as_deref(), Some("A"));
    assert_eq!(hl.known_variables("A::f"), vec!["$v"]);
}
