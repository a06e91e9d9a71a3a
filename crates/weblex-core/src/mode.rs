//! Embedded-language modes and document kinds.

/// The language governing lexing at a given position.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    #[default]
    Html,
    Php,
    Js,
    Css,
    /// Fallback for unrecognized files: whitespace/punctuation only.
    Unknown,
}

impl Mode {
    /// Short lowercase name, used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Php => "php",
            Self::Js => "js",
            Self::Css => "css",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this mode is one of the languages embedded inside HTML.
    #[must_use]
    pub const fn is_embedded(self) -> bool {
        matches!(self, Self::Php | Self::Js | Self::Css)
    }
}

/// The overall type of a document, picked from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DocumentKind {
    /// Pure markup; no embedded languages.
    Html,
    Js,
    Css,
    /// HTML host with embedded PHP, JS and CSS regions.
    Mixed,
    #[default]
    Unknown,
}

impl DocumentKind {
    /// Pick a document kind from a file extension (case-insensitive, dot optional).
    ///
    /// ```
    /// use weblex_core::{DocumentKind, Mode};
    ///
    /// assert_eq!(DocumentKind::from_extension(".PHP"), DocumentKind::Mixed);
    /// assert_eq!(DocumentKind::from_extension("css").initial_mode(), Mode::Css);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        let key = ext.trim_start_matches('.').to_ascii_lowercase();
        match key.as_str() {
            "php" | "phtml" | "php3" | "php4" | "php5" | "php7" | "php8" | "inc" | "tpl"
            | "html" | "htm" | "xhtml" => Self::Mixed,
            "js" | "mjs" | "cjs" | "json" => Self::Js,
            "css" => Self::Css,
            "xml" | "svg" => Self::Html,
            _ => Self::Unknown,
        }
    }

    /// Mode in effect at the start of the document.
    #[must_use]
    pub const fn initial_mode(self) -> Mode {
        match self {
            Self::Html | Self::Mixed => Mode::Html,
            Self::Js => Mode::Js,
            Self::Css => Mode::Css,
            Self::Unknown => Mode::Unknown,
        }
    }

    /// Whether the mode switcher runs for this document.
    #[must_use]
    pub const fn is_mixed(self) -> bool {
        matches!(self, Self::Mixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping() {
        assert_eq!(DocumentKind::from_extension("php"), DocumentKind::Mixed);
        assert_eq!(DocumentKind::from_extension("html"), DocumentKind::Mixed);
        assert_eq!(DocumentKind::from_extension("js"), DocumentKind::Js);
        assert_eq!(DocumentKind::from_extension("svg"), DocumentKind::Html);
        assert_eq!(DocumentKind::from_extension("rs"), DocumentKind::Unknown);
        assert_eq!(DocumentKind::from_extension(""), DocumentKind::Unknown);
    }

    #[test]
    fn initial_modes() {
        assert_eq!(DocumentKind::Mixed.initial_mode(), Mode::Html);
        assert_eq!(DocumentKind::Js.initial_mode(), Mode::Js);
        assert_eq!(DocumentKind::Unknown.initial_mode(), Mode::Unknown);
        assert!(DocumentKind::Mixed.is_mixed());
        assert!(!DocumentKind::Html.is_mixed());
    }

    #[test]
    fn embedded_modes() {
        assert!(Mode::Php.is_embedded());
        assert!(!Mode::Html.is_embedded());
        assert_eq!(Mode::Css.name(), "css");
    }
}
