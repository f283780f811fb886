//! HTML text helpers.
//!
//! - `Markup` - a string already safe for direct embedding
//! - `escape()` / `escape_attr()` - entity escaping for untrusted text
//! - `unescape()` - decode entities found in attribute values

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

// =============================================================================
// Safe markup
// =============================================================================

/// Text that the caller must embed verbatim, without HTML escaping.
///
/// Forward rewriting produces `Markup`: the substituted URLs come from
/// accessors, not from user input, so an outer renderer must not escape them again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Markup(String);

impl Markup {
    /// Mark `text` as safe for direct embedding.
    #[inline]
    pub fn trusted(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Markup {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Markup> for String {
    fn from(markup: Markup) -> Self {
        markup.0
    }
}

impl PartialEq<str> for Markup {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Markup {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// Escaping
// =============================================================================

#[inline]
fn entity_for(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters. Borrows when nothing needs escaping.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match entity_for(c) {
            Some(entity) => out.push_str(entity),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Escape an attribute value (same character set as [`escape`]).
#[inline]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape(s)
}

/// Decode named and numeric entities. Unknown entities are kept as written.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail
            .find(';')
            .filter(|&end| end > 0 && end <= 10)
            .and_then(|end| decode_entity(&tail[..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Check if tag is a raw text element (content is not markup).
///
/// Per HTML spec: script and style content is "raw text".
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Check if tag is an escapable raw text element.
///
/// Per HTML spec: textarea and title are "escapable raw text".
#[inline]
pub fn is_escapable_raw_text_element(tag: &str) -> bool {
    matches!(tag, "textarea" | "title")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_borrows_when_clean() {
        assert!(matches!(escape("/page_by_id/1"), Cow::Borrowed(_)));
        assert_eq!(escape("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("/a?x=1&amp;y=2"), "/a?x=1&y=2");
        assert_eq!(unescape("&#47;page&#x2F;1"), "/page/1");
        assert_eq!(unescape("a & b"), "a & b");
        assert_eq!(unescape("&unknown; &"), "&unknown; &");
    }

    #[test]
    fn test_escape_unescape_inverse() {
        let raw = "/search?q=\"a\"&b='c'";
        assert_eq!(unescape(&escape(raw)), raw);
    }

    #[test]
    fn test_raw_text_elements() {
        assert!(is_raw_text_element("script"));
        assert!(is_raw_text_element("style"));
        assert!(!is_raw_text_element("textarea"));
        assert!(is_escapable_raw_text_element("title"));
        assert!(!is_escapable_raw_text_element("a"));
    }

    #[test]
    fn test_markup() {
        let trusted = Markup::trusted("<b>/page_by_id/1</b>");
        assert_eq!(trusted, "<b>/page_by_id/1</b>");
        assert_eq!(escape("<b>"), "&lt;b&gt;");
        assert_eq!(String::from(trusted).len(), 20);
    }
}
