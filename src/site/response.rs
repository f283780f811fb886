//! In-process HTTP response.

/// Content type forward rewriting applies to.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A response as seen by middleware and probes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    /// `200 OK` with the default content type.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::html(200, body)
    }

    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string())],
            body: body.into(),
        }
    }

    pub fn with_content_type(status: u16, content_type: &str, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    /// `302 Found`, or `301 Moved Permanently` when `permanent`.
    pub fn redirect(location: &str, permanent: bool) -> Self {
        Self {
            status: if permanent { 301 } else { 302 },
            headers: vec![
                ("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string()),
                ("Location".to_string(), location.to_string()),
            ],
            body: String::new(),
        }
    }

    pub fn not_found() -> Self {
        Self::html(404, "Not found")
    }

    pub fn server_error() -> Self {
        Self::html(500, "Error")
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[inline]
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    #[inline]
    pub fn location(&self) -> Option<&str> {
        self.header("Location")
    }

    #[inline]
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }

    /// Whether the body is the default text/HTML type.
    pub fn is_default_html(&self) -> bool {
        self.content_type().is_some_and(|ct| {
            ct.split(';')
                .next()
                .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/html"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect() {
        let response = Response::redirect("/response", false);
        assert_eq!(response.status, 302);
        assert_eq!(response.location(), Some("/response"));
        assert!(response.is_redirect());
        assert_eq!(Response::redirect("/a", true).status, 301);
    }

    #[test]
    fn test_header_case_insensitive() {
        let response = Response::ok("Done");
        assert_eq!(response.header("content-type"), Some(DEFAULT_CONTENT_TYPE));
    }

    #[test]
    fn test_is_default_html() {
        assert!(Response::ok("x").is_default_html());
        assert!(Response::with_content_type(200, "TEXT/HTML", "x").is_default_html());
        assert!(!Response::with_content_type(200, "application/json", "{}").is_default_html());
    }
}
