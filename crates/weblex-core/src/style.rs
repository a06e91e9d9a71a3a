//! Style classes and format ranges produced by the lexer.

/// Syntactic category assigned to a span of characters.
///
/// The set is flat; hosts map each class to a concrete rendering style.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StyleClass {
    // Default / plain text
    #[default]
    Text,

    // Words
    Keyword,
    ClassName,
    Function,
    Variable,
    Constant,

    // Literals
    Number,
    String,
    Regexp,
    /// `{$...}` / `${...}` delimiters inside strings.
    Interpolation,

    Comment,

    // Markup
    Tag,
    Attribute,

    // Stylesheets
    Selector,
    Property,
    Color,
    AtRule,

    Punctuation,
    Operator,

    /// `<?php`, `?>`, and the like.
    ModeDelimiter,
}

impl StyleClass {
    /// Every class, in declaration order.
    pub const ALL: [Self; 20] = [
        Self::Text,
        Self::Keyword,
        Self::ClassName,
        Self::Function,
        Self::Variable,
        Self::Constant,
        Self::Number,
        Self::String,
        Self::Regexp,
        Self::Interpolation,
        Self::Comment,
        Self::Tag,
        Self::Attribute,
        Self::Selector,
        Self::Property,
        Self::Color,
        Self::AtRule,
        Self::Punctuation,
        Self::Operator,
        Self::ModeDelimiter,
    ];

    /// Stable snake_case name used by keyword table sources.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Keyword => "keyword",
            Self::ClassName => "class",
            Self::Function => "function",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Number => "number",
            Self::String => "string",
            Self::Regexp => "regexp",
            Self::Interpolation => "interpolation",
            Self::Comment => "comment",
            Self::Tag => "tag",
            Self::Attribute => "attribute",
            Self::Selector => "selector",
            Self::Property => "property",
            Self::Color => "color",
            Self::AtRule => "at_rule",
            Self::Punctuation => "punctuation",
            Self::Operator => "operator",
            Self::ModeDelimiter => "mode_delimiter",
        }
    }

    /// Inverse of [`StyleClass::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Whether this class covers literal text (strings, regexps).
    #[must_use]
    pub fn is_literal(self) -> bool {
        matches!(self, Self::String | Self::Regexp)
    }
}

/// A classified span on a single line.
///
/// `start` and `length` count chars (not bytes) from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatRange {
    pub start: usize,
    pub length: usize,
    pub style: StyleClass,
}

impl FormatRange {
    #[must_use]
    pub const fn new(start: usize, length: usize, style: StyleClass) -> Self {
        Self {
            start,
            length,
            style,
        }
    }

    /// Exclusive end column.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.length
    }

    /// Whether `col` falls inside the range.
    #[must_use]
    pub const fn contains(&self, col: usize) -> bool {
        col >= self.start && col < self.end()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Validate that ranges are ordered, non-overlapping and within `line_len`.
#[must_use]
pub fn validate_ranges(line_len: usize, ranges: &[FormatRange]) -> bool {
    let mut prev_end = 0;
    for range in ranges {
        if range.start < prev_end || range.end() > line_len {
            return false;
        }
        prev_end = range.end();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_for_every_class() {
        for class in StyleClass::ALL {
            assert_eq!(StyleClass::from_name(class.name()), Some(class));
        }
        assert_eq!(StyleClass::from_name("bogus"), None);
    }

    #[test]
    fn range_geometry() {
        let r = FormatRange::new(2, 3, StyleClass::String);
        assert_eq!(r.end(), 5);
        assert!(r.contains(2));
        assert!(r.contains(4));
        assert!(!r.contains(5));
        assert!(!r.is_empty());
        assert!(FormatRange::new(1, 0, StyleClass::Text).is_empty());
    }

    #[test]
    fn validation_rejects_overlap_and_overflow() {
        let ok = [
            FormatRange::new(0, 2, StyleClass::Tag),
            FormatRange::new(2, 3, StyleClass::Text),
        ];
        assert!(validate_ranges(5, &ok));
        assert!(!validate_ranges(4, &ok));
        let overlapping = [
            FormatRange::new(0, 3, StyleClass::Tag),
            FormatRange::new(2, 1, StyleClass::Text),
        ];
        assert!(!validate_ranges(10, &overlapping));
    }

    #[test]
    fn literal_predicate() {
        assert!(StyleClass::String.is_literal());
        assert!(StyleClass::Regexp.is_literal());
        assert!(!StyleClass::Comment.is_literal());
    }
}
