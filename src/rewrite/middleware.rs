//! Response middleware applying forward rewriting.

use std::sync::Arc;

use super::Rewriter;
use crate::site::{Middleware, Response};

/// Rewrites tokens in `text/html` responses; other content types pass through.
pub struct RewriteMiddleware {
    rewriter: Arc<Rewriter>,
}

impl RewriteMiddleware {
    pub fn new(rewriter: Arc<Rewriter>) -> Self {
        Self { rewriter }
    }
}

impl Middleware for RewriteMiddleware {
    fn process_response(&self, mut response: Response) -> Response {
        if response.is_default_html() {
            response.body = self.rewriter.rewrite(&response.body).into();
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::Host;

    #[test]
    fn test_only_html_is_rewritten() {
        let middleware = RewriteMiddleware::new(Host::example().unwrap().rewriter);
        let token = "{@ example.models.Page 1 @}";

        let html = middleware.process_response(Response::ok(token));
        assert_eq!(html.body, "/page_by_id/1");

        let json = middleware.process_response(Response::with_content_type(
            200,
            "application/json",
            token,
        ));
        assert_eq!(json.body, token);
    }
}
