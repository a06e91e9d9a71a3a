//! Errors for host-supplied keyword tables.

/// Failure while parsing a keyword table source.
///
/// Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A line has no `=` between word and style.
    MissingSeparator { line: usize },
    /// The word on the left of `=` is empty.
    EmptyWord { line: usize },
    /// The style name is not a known [`StyleClass`](crate::StyleClass).
    UnknownStyle { line: usize, style: String },
    /// A `[section]` header names no known table.
    UnknownSection { line: usize, section: String },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSeparator { line } => {
                write!(f, "line {}: expected `word = style`", line)
            }
            Self::EmptyWord { line } => write!(f, "line {}: empty word", line),
            Self::UnknownStyle { line, style } => {
                write!(f, "line {}: unknown style '{}'", line, style)
            }
            Self::UnknownSection { line, section } => {
                write!(f, "line {}: unknown table section [{}]", line, section)
            }
        }
    }
}

impl std::error::Error for TableError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            TableError::MissingSeparator { line: 3 }.to_string(),
            "line 3: expected `word = style`"
        );
        assert_eq!(
            TableError::UnknownStyle {
                line: 1,
                style: "glow".into()
            }
            .to_string(),
            "line 1: unknown style 'glow'"
        );
        assert_eq!(
            TableError::UnknownSection {
                line: 9,
                section: "sql".into()
            }
            .to_string(),
            "line 9: unknown table section [sql]"
        );
    }
}
