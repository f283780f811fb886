//! URL attribute rewriting over raw markup.
//!
//! Tags are located with a scanner instead of a DOM round trip, so the text
//! between (and inside) tags is reproduced exactly; only the value of a
//! URL-bearing attribute is ever replaced. Comments and the bodies of
//! raw-text elements (`<script>`, `<style>`, `<textarea>`, `<title>`) are
//! copied as they are.

use std::sync::LazyLock;

use regex::Regex;

use crate::utils::html::{escape_attr, is_escapable_raw_text_element, is_raw_text_element, unescape};

/// Element → URL attribute table.
pub const URL_ATTRIBUTES: &[(&str, &str)] = &[
    ("a", "href"),
    ("area", "href"),
    ("link", "href"),
    ("img", "src"),
    ("script", "src"),
    ("iframe", "src"),
    ("embed", "src"),
    ("source", "src"),
    ("form", "action"),
    ("object", "data"),
];

/// A comment (possibly unterminated), or an opening tag: name, then the
/// attribute run (quoted values may contain `>`).
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<!--.*?(?:-->|\z)|<([a-zA-Z][a-zA-Z0-9-]*)((?:"[^"]*"|'[^']*'|[^'">])*)>"#)
        .expect("tag pattern is valid")
});

/// One attribute: name and a double-quoted, single-quoted or bare value.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

fn url_attribute(tag: &str) -> Option<&'static str> {
    URL_ATTRIBUTES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(tag))
        .map(|(_, attr)| *attr)
}

/// Offset of the `</tag` closing `tag`'s raw text, or the end of `markup`.
fn raw_text_end(markup: &str, from: usize, tag: &str) -> usize {
    markup[from..]
        .match_indices("</")
        .map(|(i, _)| from + i)
        .find(|&i| {
            markup
                .get(i + 2..i + 2 + tag.len())
                .is_some_and(|name| name.eq_ignore_ascii_case(tag))
        })
        .unwrap_or(markup.len())
}

/// Replace every URL attribute value in `markup` with `resolve(value)`.
///
/// `resolve` receives the unescaped value. A value it returns unchanged is
/// left byte for byte; anything else is escaped back, and a bare value whose
/// replacement needs quoting gets double quotes.
pub fn rewrite_attributes<E>(
    markup: &str,
    mut resolve: impl FnMut(&str) -> Result<String, E>,
) -> Result<String, E> {
    let mut out = String::with_capacity(markup.len());
    let mut last = 0;
    let mut pos = 0;

    while let Some(caps) = TAG_RE.captures_at(markup, pos) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        pos = whole.end();
        let (Some(name), Some(attrs)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let tag = name.as_str().to_ascii_lowercase();
        if is_raw_text_element(&tag) || is_escapable_raw_text_element(&tag) {
            pos = raw_text_end(markup, pos, &tag);
        }
        let Some(target) = url_attribute(&tag) else {
            continue;
        };

        for attr in ATTR_RE.captures_iter(attrs.as_str()) {
            let Some(attr_name) = attr.get(1) else {
                continue;
            };
            if !attr_name.as_str().eq_ignore_ascii_case(target) {
                continue;
            }
            let (value, bare) = match (attr.get(2), attr.get(3), attr.get(4)) {
                (Some(v), _, _) | (_, Some(v), _) => (v, false),
                (_, _, Some(v)) => (v, true),
                _ => continue,
            };

            let unescaped = unescape(value.as_str());
            let resolved = resolve(&unescaped)?;
            if resolved == *unescaped {
                continue;
            }
            let escaped = escape_attr(&resolved);

            let start = attrs.start() + value.start();
            let end = attrs.start() + value.end();
            out.push_str(&markup[last..start]);
            if bare && (escaped.is_empty() || escaped.contains(char::is_whitespace)) {
                out.push('"');
                out.push_str(&escaped);
                out.push('"');
            } else {
                out.push_str(&escaped);
            }
            last = end;
        }
    }

    out.push_str(&markup[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    fn upper(markup: &str) -> String {
        rewrite_attributes(markup, |v| Ok::<_, Infallible>(v.to_uppercase())).unwrap()
    }

    #[test]
    fn test_only_url_attributes_change() {
        assert_eq!(
            upper(r#"<a class="x" href="/a">/b</a><img src='/c' alt="/d"><p title="/e">"#),
            r#"<a class="x" href="/A">/b</a><img src='/C' alt="/d"><p title="/e">"#
        );
    }

    #[test]
    fn test_case_insensitive_names() {
        assert_eq!(upper(r#"<A HREF="/a">"#), r#"<A HREF="/A">"#);
        assert_eq!(upper(r#"<form action="/f" method=post>"#), r#"<form action="/F" method=post>"#);
    }

    #[test]
    fn test_value_is_unescaped_then_escaped() {
        let out = rewrite_attributes(r#"<a href="/s?a=1&amp;b=2">"#, |v| {
            assert_eq!(v, "/s?a=1&b=2");
            Ok::<_, Infallible>(format!("{v}&c=3"))
        })
        .unwrap();
        assert_eq!(out, r#"<a href="/s?a=1&amp;b=2&amp;c=3">"#);
    }

    #[test]
    fn test_bare_value_gets_quoted_when_needed() {
        let out = rewrite_attributes("<a href=/page_by_id/1>x</a>", |_| {
            Ok::<_, Infallible>("{@ example.models.Page 1 @}".to_string())
        })
        .unwrap();
        assert_eq!(out, r#"<a href="{@ example.models.Page 1 @}">x</a>"#);
    }

    #[test]
    fn test_gt_inside_quotes() {
        assert_eq!(
            upper(r#"<a title="a > b" href="/x">"#),
            r#"<a title="a > b" href="/X">"#
        );
    }

    #[test]
    fn test_error_stops() {
        let result = rewrite_attributes(r#"<a href="/a"><a href="/b">"#, |v| {
            if v == "/b" { Err(v.to_string()) } else { Ok(v.to_string()) }
        });
        assert_eq!(result, Err("/b".to_string()));
    }

    #[test]
    fn test_text_outside_tags_untouched() {
        let markup = "plain /a text & <b>bold</b>";
        assert_eq!(upper(markup), markup);
    }

    #[test]
    fn test_unchanged_value_keeps_its_bytes() {
        let markup = r#"<a href="http://another.com/?a=1&b=2">x</a><a href=/q&#38;b>y</a>"#;
        assert_eq!(
            rewrite_attributes(markup, |v| Ok::<_, Infallible>(v.to_string())).unwrap(),
            markup
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let markup = r#"<!-- <a href="/x"> --><a href="/y"><!-- <img src="/z">"#;
        assert_eq!(
            upper(markup),
            r#"<!-- <a href="/x"> --><a href="/Y"><!-- <img src="/z">"#
        );
    }

    #[test]
    fn test_raw_text_bodies_are_skipped() {
        let markup = concat!(
            r#"<script src="/s.js">var s = '<a href="/x">';</script>"#,
            r#"<STYLE>a[href="/y"]{}</STYLE><title><a href="/t"></title>"#,
            r#"<a href="/z">"#,
        );
        assert_eq!(
            upper(markup),
            concat!(
                r#"<script src="/S.JS">var s = '<a href="/x">';</script>"#,
                r#"<STYLE>a[href="/y"]{}</STYLE><title><a href="/t"></title>"#,
                r#"<a href="/Z">"#,
            )
        );
    }

    #[test]
    fn test_unterminated_script_runs_to_end() {
        let markup = r#"<script>document.write('<a href="/x">')"#;
        assert_eq!(upper(markup), markup);
    }
}
