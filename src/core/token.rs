//! Macro token grammar.
//!
//! A macro token stands in for a model URL inside stored content:
//!
//! ```text
//! {@ example.models.Page 1 @}
//! {@ example.models.Item 2 my_url @}
//! ```
//!
//! The type path is letters and dots only, the primary key and the optional
//! accessor are any non-whitespace run. Separators are any whitespace except a
//! newline, so tokens never span lines.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ReplaceError;

/// Token body shared by the scanning and the anchored pattern.
const TOKEN_BODY: &str =
    r"\{@[^\S\n]*([.a-zA-Z]+)[^\S\n]+(\S+?)(?:[^\S\n]+(\S+?))?[^\S\n]*@\}";

/// Matches tokens anywhere in a body.
pub static MACRO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_BODY).expect("token pattern is valid"));

/// Matches a token at the very start of a value.
static MACRO_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{TOKEN_BODY}")).expect("token pattern is valid"));

/// Anything delimited like a token on one line, well-formed or not.
static CANDIDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{@[^\n]*?@\}").expect("candidate pattern is valid"));

/// A parsed `{@ <type> <pk> [<accessor>] @}` token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MacroToken {
    /// Dotted type path, e.g. `example.models.Page`.
    pub type_ref: String,
    /// Primary key as written in the token.
    pub primary_key: String,
    /// Accessor name; `None` means the type's configured accessor.
    pub accessor: Option<String>,
}

impl MacroToken {
    pub fn new(type_ref: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            type_ref: type_ref.into(),
            primary_key: primary_key.into(),
            accessor: None,
        }
    }

    /// Attach an explicit accessor. Empty names are treated as absent.
    pub fn with_accessor(mut self, accessor: impl Into<String>) -> Self {
        let accessor = accessor.into();
        self.accessor = (!accessor.is_empty()).then_some(accessor);
        self
    }

    /// Parse a value that is exactly one token (surrounding whitespace allowed).
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let (token, len) = Self::parse_prefix(trimmed)?;
        (len == trimmed.len()).then_some(token)
    }

    /// Parse a token at the start of `text`, returning it with the matched length.
    ///
    /// `{@ example.models.Page 1 @}#anchor` yields the token and the offset of `#`.
    pub fn parse_prefix(text: &str) -> Option<(Self, usize)> {
        let caps = MACRO_PREFIX_RE.captures(text)?;
        let len = caps.get(0)?.end();
        Some((Self::from_captures(&caps)?, len))
    }

    /// Check whether `text` starts with a token.
    #[inline]
    pub fn is_macro(text: &str) -> bool {
        MACRO_PREFIX_RE.is_match(text)
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Option<Self> {
        let token = Self::new(caps.get(1)?.as_str(), caps.get(2)?.as_str());
        Some(match caps.get(3) {
            Some(accessor) => token.with_accessor(accessor.as_str()),
            None => token,
        })
    }
}

impl fmt::Display for MacroToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.accessor {
            Some(accessor) => write!(
                f,
                "{{@ {} {} {} @}}",
                self.type_ref, self.primary_key, accessor
            ),
            None => write!(f, "{{@ {} {} @}}", self.type_ref, self.primary_key),
        }
    }
}

impl FromStr for MacroToken {
    type Err = ReplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ReplaceError::TokenNotFound(s.to_string()))
    }
}

/// Build the token text for a type path, primary key and optional accessor.
pub fn format_token(type_ref: &str, primary_key: &str, accessor: Option<&str>) -> String {
    let token = MacroToken::new(type_ref, primary_key);
    match accessor {
        Some(accessor) => token.with_accessor(accessor).to_string(),
        None => token.to_string(),
    }
}

/// Iterate over all non-overlapping tokens in `body` with their byte ranges.
pub fn find_tokens(body: &str) -> impl Iterator<Item = (Range<usize>, MacroToken)> + '_ {
    MACRO_RE.captures_iter(body).filter_map(|caps| {
        let range = caps.get(0)?.range();
        Some((range, MacroToken::from_captures(&caps)?))
    })
}

/// Iterate over every `{@ ... @}` span in `body`, including malformed ones.
pub fn find_candidates(body: &str) -> impl Iterator<Item = regex::Match<'_>> + '_ {
    CANDIDATE_RE.find_iter(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let token = MacroToken::parse("{@ example.models.Page 1 @}").unwrap();
        assert_eq!(token.type_ref, "example.models.Page");
        assert_eq!(token.primary_key, "1");
        assert_eq!(token.accessor, None);
    }

    #[test]
    fn test_parse_with_accessor() {
        let token = MacroToken::parse("{@ example.models.Item 2 my_url @}").unwrap();
        assert_eq!(token.primary_key, "2");
        assert_eq!(token.accessor.as_deref(), Some("my_url"));
    }

    #[test]
    fn test_parse_whitespace_insensitive() {
        let token = MacroToken::parse("{@example.models.Page\t7@}").unwrap();
        assert_eq!(token, MacroToken::new("example.models.Page", "7"));

        let token = MacroToken::parse("  {@   example.models.Page   7   @}  ").unwrap();
        assert_eq!(token, MacroToken::new("example.models.Page", "7"));
    }

    #[test]
    fn test_parse_rejects_missing_type() {
        assert!(MacroToken::parse("{@ 1 @}").is_none());
        assert!(!MACRO_RE.is_match("<a href=\"{@ 1 @}\">Page</a>"));
    }

    #[test]
    fn test_parse_rejects_bad_type_chars() {
        assert!(MacroToken::parse("{@ example-models-Page 1 @}").is_none());
    }

    #[test]
    fn test_parse_rejects_multiline() {
        assert!(MacroToken::parse("{@ example.models.Page\n1 @}").is_none());
    }

    #[test]
    fn test_parse_accepts_carriage_return_separator() {
        let token = MacroToken::parse("{@ example.models.Page\r1 @}").unwrap();
        assert_eq!(token, MacroToken::new("example.models.Page", "1"));
        assert_eq!(find_tokens("x {@\x0Ba.B\u{a0}2\r@} y").count(), 1);
    }

    #[test]
    fn test_from_str_reports_token_not_found() {
        let token: MacroToken = "{@ a.B 1 @}".parse().unwrap();
        assert_eq!(token, MacroToken::new("a.B", "1"));
        assert_eq!(
            "{@ 1 @}".parse::<MacroToken>(),
            Err(ReplaceError::TokenNotFound("{@ 1 @}".into()))
        );
    }

    #[test]
    fn test_find_candidates_includes_malformed() {
        let body = "{@ a.B 1 @} {@ 1 @} {@ a.B\n2 @}";
        let found: Vec<_> = find_candidates(body).map(|m| m.as_str()).collect();
        assert_eq!(found, ["{@ a.B 1 @}", "{@ 1 @}"]);
    }

    #[test]
    fn test_parse_prefix_reports_length() {
        let (token, len) = MacroToken::parse_prefix("{@ example.models.Page 1 @}#anchor").unwrap();
        assert_eq!(token.primary_key, "1");
        assert_eq!(len, "{@ example.models.Page 1 @}".len());
        assert!(MacroToken::parse("{@ example.models.Page 1 @}#anchor").is_none());
        assert!(MacroToken::is_macro("{@ example.models.Page 1 @}#anchor"));
        assert!(!MacroToken::is_macro("/page_by_id/1"));
    }

    #[test]
    fn test_format_round_trip() {
        for (type_ref, pk) in [("example.models.Page", "1"), ("a.B", "some-slug"), ("X", "0")] {
            let text = format_token(type_ref, pk, None);
            assert_eq!(MacroToken::parse(&text), Some(MacroToken::new(type_ref, pk)));
        }
        let text = format_token("example.models.Item", "2", Some("my_url"));
        assert_eq!(text, "{@ example.models.Item 2 my_url @}");
        assert_eq!(
            MacroToken::parse(&text),
            Some(MacroToken::new("example.models.Item", "2").with_accessor("my_url"))
        );
    }

    #[test]
    fn test_empty_accessor_is_absent() {
        let token = MacroToken::new("a.B", "1").with_accessor("");
        assert_eq!(token.accessor, None);
        assert_eq!(token.to_string(), "{@ a.B 1 @}");
    }

    #[test]
    fn test_find_tokens() {
        let body = "<a href=\"{@ a.Page 1 @}\">x</a> {@ 1 @} {@ a.Item 2 my_url @}";
        let found: Vec<_> = find_tokens(body).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(&body[found[0].0.clone()], "{@ a.Page 1 @}");
        assert_eq!(found[1].1.accessor.as_deref(), Some("my_url"));
    }
}
