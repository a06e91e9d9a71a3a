//! Per-character predicates shared by every tokenizer.
//!
//! All predicates are pure and allocation free. They accept any `char`; the
//! non-ASCII behaviour follows PHP/JS identifier rules loosely (letters in
//! any script are accepted as identifier characters).

/// Identifier start: ASCII/Unicode letter or underscore.
#[inline]
#[must_use]
pub fn is_alpha(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

/// Identifier continuation: [`is_alpha`] or a decimal digit.
#[inline]
#[must_use]
pub fn is_alnum(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}

/// Whitespace inside a line (line terminators never reach the lexer).
#[inline]
#[must_use]
pub fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

#[inline]
#[must_use]
pub fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// JS identifiers may also start with `$`.
#[inline]
#[must_use]
pub fn is_js_ident_start(c: char) -> bool {
    c == '$' || is_alpha(c)
}

#[inline]
#[must_use]
pub fn is_js_ident_char(c: char) -> bool {
    c == '$' || is_alnum(c)
}

/// PHP names may contain `\` namespace separators after the first char.
#[inline]
#[must_use]
pub fn is_php_name_char(c: char) -> bool {
    c == '\\' || is_alnum(c)
}

/// HTML tag and attribute names: alnum plus `-`, `:` and `.`.
#[inline]
#[must_use]
pub fn is_markup_name_char(c: char) -> bool {
    matches!(c, '-' | ':' | '.') || is_alnum(c)
}

/// CSS identifiers allow `-` anywhere, including the first char (`-webkit-`).
#[inline]
#[must_use]
pub fn is_css_ident_char(c: char) -> bool {
    c == '-' || is_alnum(c)
}

/// Count the backslashes immediately before `pos`.
///
/// An odd count means the character at `pos` is escaped.
#[must_use]
pub fn backslash_run(chars: &[char], pos: usize) -> usize {
    chars[..pos.min(chars.len())]
        .iter()
        .rev()
        .take_while(|&&c| c == '\\')
        .count()
}

/// Whether the character at `pos` is escaped by an odd backslash run.
#[inline]
#[must_use]
pub fn is_escaped(chars: &[char], pos: usize) -> bool {
    backslash_run(chars, pos) % 2 == 1
}

/// Index of the next non-whitespace char at or after `pos`.
#[must_use]
pub fn skip_whitespace(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && is_whitespace(chars[pos]) {
        pos += 1;
    }
    pos
}

/// Whether `chars[pos..]` starts with `pat`, optionally ASCII case-insensitive.
#[must_use]
pub fn starts_with_at(chars: &[char], pos: usize, pat: &str, ignore_case: bool) -> bool {
    let mut idx = pos;
    for p in pat.chars() {
        let Some(&c) = chars.get(idx) else {
            return false;
        };
        let same = if ignore_case {
            c.eq_ignore_ascii_case(&p)
        } else {
            c == p
        };
        if !same {
            return false;
        }
        idx += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn alpha_and_alnum() {
        assert!(is_alpha('a'));
        assert!(is_alpha('_'));
        assert!(is_alpha('é'));
        assert!(!is_alpha('1'));
        assert!(is_alnum('1'));
        assert!(!is_alnum('-'));
        assert!(!is_alpha('$'));
    }

    #[test]
    fn whitespace_includes_nbsp_and_tab() {
        assert!(is_whitespace(' '));
        assert!(is_whitespace('\t'));
        assert!(is_whitespace('\u{A0}'));
        assert!(!is_whitespace('x'));
    }

    #[test]
    fn js_and_php_name_chars() {
        assert!(is_js_ident_start('$'));
        assert!(is_js_ident_char('$'));
        assert!(is_php_name_char('\\'));
        assert!(!is_php_name_char('$'));
        assert!(is_css_ident_char('-'));
        assert!(is_markup_name_char(':'));
    }

    #[test]
    fn backslash_parity() {
        let s = chars(r#"a\"b\\"c"#);
        assert_eq!(backslash_run(&s, 2), 1);
        assert!(is_escaped(&s, 2));
        assert_eq!(backslash_run(&s, 6), 2);
        assert!(!is_escaped(&s, 6));
        assert_eq!(backslash_run(&s, 0), 0);
    }

    #[test]
    fn starts_with_case_folding() {
        let s = chars("<?PHP echo");
        assert!(starts_with_at(&s, 0, "<?php", true));
        assert!(!starts_with_at(&s, 0, "<?php", false));
        assert!(!starts_with_at(&s, 8, "echo", false));
        assert!(starts_with_at(&s, 6, "echo", false));
    }

    #[test]
    fn skip_whitespace_stops_at_content() {
        let s = chars("   x");
        assert_eq!(skip_whitespace(&s, 0), 3);
        assert_eq!(skip_whitespace(&s, 4), 4);
    }
}
