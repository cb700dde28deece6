//! [`SubstringPattern`] definition.

use derive_more::Display;
use postgres_types::{FromSql, ToSql};

/// SQL `LIKE` pattern matching values containing a literal substring.
///
/// Must be used along with the `ESCAPE '\'` clause.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct SubstringPattern(String);

impl SubstringPattern {
    /// Escape character of a [`SubstringPattern`].
    pub const ESCAPE: char = '\\';

    /// Creates a new [`SubstringPattern`] matching any value containing the
    /// given `input` literally.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self(format!(
            "%{}%",
            input
                .replace('\\', r"\\")
                .replace('%', r"\%")
                .replace('_', r"\_"),
        ))
    }
}

#[cfg(test)]
mod spec {
    use super::SubstringPattern;

    #[test]
    fn wraps_plain_input() {
        assert_eq!(SubstringPattern::new("oh").to_string(), "%oh%");
        assert_eq!(SubstringPattern::new("").to_string(), "%%");
    }

    #[test]
    fn escapes_wildcards() {
        assert_eq!(SubstringPattern::new("a_b").to_string(), r"%a\_b%");
        assert_eq!(SubstringPattern::new("100%").to_string(), r"%100\%%");
        assert_eq!(SubstringPattern::new(r"a\b").to_string(), r"%a\\b%");
        assert_eq!(SubstringPattern::new(r"\%").to_string(), r"%\\\%%");
    }

    #[test]
    fn keeps_sql_as_is() {
        let input = "'; DROP TABLE users; --";

        assert_eq!(
            SubstringPattern::new(input).to_string(),
            format!("%{input}%"),
        );
    }
}
