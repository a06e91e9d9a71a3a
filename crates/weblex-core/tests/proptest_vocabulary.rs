//! Property-based tests for the shared vocabulary.
//!
//! 1. `validate_ranges` accepts ordered, disjoint ranges inside the line and
//!    rejects any range that runs past it.
//! 2. `starts_with_at` agrees with string prefix matching.
//! 3. Parsed keyword tables look up every word they were given.

use proptest::prelude::*;
use weblex_core::chars::starts_with_at;
use weblex_core::{FormatRange, KeywordTable, StyleClass, validate_ranges};

// ── Helpers ─────────────────────────────────────────────────────────────

fn style_strategy() -> impl Strategy<Value = StyleClass> {
    prop::sample::select(StyleClass::ALL.to_vec())
}

/// `(gap, length)` pairs laid out left to right.
fn layout(pairs: &[(usize, usize)], style: StyleClass) -> Vec<FormatRange> {
    let mut at = 0;
    pairs
        .iter()
        .map(|&(gap, length)| {
            let range = FormatRange::new(at + gap, length, style);
            at = range.end();
            range
        })
        .collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Range validation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn ordered_ranges_inside_line_are_valid(
        pairs in prop::collection::vec((0usize..4, 0usize..6), 0..10),
        slack in 0usize..5,
        style in style_strategy(),
    ) {
        let ranges = layout(&pairs, style);
        let used = ranges.last().map_or(0, FormatRange::end);
        prop_assert!(validate_ranges(used + slack, &ranges));
    }

    #[test]
    fn range_past_line_end_is_invalid(
        pairs in prop::collection::vec((0usize..4, 1usize..6), 1..10),
        short_by in 1usize..4,
    ) {
        let ranges = layout(&pairs, StyleClass::Text);
        let used = ranges.last().map_or(0, FormatRange::end);
        prop_assert!(!validate_ranges(used.saturating_sub(short_by), &ranges));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Prefix matching
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn starts_with_at_matches_str_prefix(
        text in "[a-zA-Z<?/ ]{0,12}",
        pat in "[a-zA-Z<?/]{0,4}",
        pos in 0usize..14,
    ) {
        let chars: Vec<char> = text.chars().collect();
        let tail: String = chars.iter().skip(pos).collect();
        prop_assert_eq!(starts_with_at(&chars, pos, &pat, false), tail.starts_with(&pat));
        prop_assert_eq!(
            starts_with_at(&chars, pos, &pat, true),
            tail.to_ascii_lowercase().starts_with(&pat.to_ascii_lowercase())
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Keyword table loading
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn parsed_words_look_up_their_style(
        entries in prop::collection::vec(("[a-z][a-z0-9_]{0,7}", style_strategy()), 1..12),
    ) {
        let source: String = entries
            .iter()
            .map(|(word, style)| format!("{word} = {}\n", style.name()))
            .collect();
        let table = KeywordTable::parse(&source, true)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        for (word, _) in &entries {
            // Later lines replace earlier ones.
            let expected = entries.iter().rev().find(|(w, _)| w == word).map(|(_, s)| *s);
            prop_assert_eq!(table.get(word), expected);
            prop_assert_eq!(table.get(&word.to_ascii_uppercase()), expected);
        }
    }
}
