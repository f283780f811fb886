//! Generic URL decomposition (RFC 2396 appendix B).
//!
//! - `UrlParts::split` never fails: every string decomposes
//! - Absent parts are `None`, so `join(split(s)) == s` byte for byte

use std::fmt;
use std::sync::{LazyLock, OnceLock};

use regex::Regex;

static SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(([^:/?#]+):)?(//([^/?#]*))?([^?#]*)(\?([^#]*))?(#(.*))?")
        .expect("split pattern is valid")
});

/// A URL split into scheme, authority, path, query and fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UrlParts {
    pub scheme: Option<String>,
    pub authority: Option<String>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl UrlParts {
    /// Decompose `url`. An empty path is reported as `None`.
    pub fn split(url: &str) -> Self {
        let Some(caps) = SPLIT_RE.captures(url) else {
            // The pattern accepts any input; keep the value as a path regardless.
            return Self {
                path: (!url.is_empty()).then(|| url.to_string()),
                ..Self::default()
            };
        };
        let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
        Self {
            scheme: group(2),
            authority: group(4),
            path: group(5).filter(|p| !p.is_empty()),
            query: group(7),
            fragment: group(9),
        }
    }

    /// Re-assemble the parts, emitting separators only for present parts.
    pub fn join(&self) -> String {
        let mut url = String::new();
        if let Some(scheme) = &self.scheme {
            url.push_str(scheme);
            url.push(':');
        }
        if let Some(authority) = &self.authority {
            url.push_str("//");
            url.push_str(authority);
        }
        if let Some(path) = &self.path {
            url.push_str(path);
        }
        if let Some(query) = &self.query {
            url.push('?');
            url.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            url.push('#');
            url.push_str(fragment);
        }
        url
    }

    /// True when there is nothing to route: only a query and/or fragment.
    #[inline]
    pub fn has_no_path(&self) -> bool {
        self.scheme.is_none() && self.authority.is_none() && self.path.is_none()
    }

    /// Keep only path, query and fragment (site-relative form).
    pub fn site_relative(mut self) -> Self {
        self.scheme = None;
        self.authority = None;
        self
    }
}

impl fmt::Display for UrlParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

/// Resolve a redirect `Location` against the path that produced it.
///
/// Absolute and site-root targets are returned untouched, relative ones
/// (`response`, `../item_by_id/1`) are joined onto `base_path`.
pub fn resolve_location(base_path: &str, location: &str) -> String {
    let parts = UrlParts::split(location);
    let is_relative = parts.scheme.is_none()
        && parts.authority.is_none()
        && parts.path.as_deref().is_some_and(|p| !p.starts_with('/'));
    if !is_relative {
        return location.to_string();
    }

    static BASE: OnceLock<Option<url::Url>> = OnceLock::new();
    let Some(base) = BASE.get_or_init(|| url::Url::parse("http://x").ok()) else {
        return location.to_string();
    };

    match base.join(base_path).and_then(|b| b.join(location)) {
        Ok(joined) => {
            let mut resolved = joined.path().to_string();
            if let Some(query) = joined.query() {
                resolved.push('?');
                resolved.push_str(query);
            }
            if let Some(fragment) = joined.fragment() {
                resolved.push('#');
                resolved.push_str(fragment);
            }
            resolved
        }
        Err(_) => location.to_string(),
    }
}

/// Decode a percent-encoded request path, keeping the raw text when it is not UTF-8.
pub fn decode_path(encoded: &str) -> String {
    use percent_encoding::percent_decode_str;
    percent_decode_str(encoded)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| encoded.to_string())
}
