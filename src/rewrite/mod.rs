//! Forward rewriting (token → URL).
//!
//! Scans an outgoing body for macro tokens and splices in the URL of the
//! object each token points at:
//!
//! | Token                              | Result                          |
//! |------------------------------------|---------------------------------|
//! | mapped type, existing object       | accessor output, unescaped      |
//! | mapped type, missing object        | empty                           |
//! | type not in `[[types]]`            | empty                           |
//! | text not matching the grammar      | left untouched                  |
//!
//! Failures never reach the caller: content always renders, stale links
//! simply collapse to empty strings.

mod middleware;

pub use middleware::RewriteMiddleware;

use std::sync::Arc;

use crate::core::{MacroToken, find_candidates, find_tokens};
use crate::debug;
use crate::error::ReplaceError;
use crate::model::ObjectResolver;
use crate::registry::TypeRegistry;
use crate::utils::html::Markup;

/// Token → URL substitution over a type registry.
pub struct Rewriter {
    resolver: Arc<ObjectResolver>,
    types: TypeRegistry,
}

impl Rewriter {
    pub fn new(resolver: Arc<ObjectResolver>, types: TypeRegistry) -> Self {
        Self { resolver, types }
    }

    #[inline]
    pub fn resolver(&self) -> &ObjectResolver {
        &self.resolver
    }

    #[inline]
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Resolve one token to its URL.
    ///
    /// The token's own accessor wins over the one configured for its type.
    pub fn try_substitute(&self, token: &MacroToken) -> Result<String, ReplaceError> {
        let entry = self
            .types
            .get(&token.type_ref)
            .ok_or_else(|| ReplaceError::TypeUnmapped(token.type_ref.clone()))?;
        let object = self
            .resolver
            .resolve(&token.type_ref, &token.primary_key)?;
        let accessor = token.accessor.as_deref().or(entry.accessor.as_deref());
        self.resolver.invoke_accessor(object.as_ref(), accessor)
    }

    /// Resolve one token, collapsing every failure to an empty string.
    pub fn substitute(&self, token: &MacroToken) -> String {
        self.try_substitute(token).unwrap_or_else(|e| {
            debug!("forward"; "{} -> empty: {}", token, e);
            String::new()
        })
    }

    /// Replace every token in `body`.
    ///
    /// The result is trusted markup: substituted URLs must not be escaped again.
    pub fn rewrite(&self, body: &str) -> Markup {
        let mut tokens = find_tokens(body).peekable();
        if tokens.peek().is_none() {
            return Markup::trusted(body);
        }

        let mut out = String::with_capacity(body.len());
        let mut last = 0;
        for (range, token) in tokens {
            out.push_str(&body[last..range.start]);
            out.push_str(&self.substitute(&token));
            last = range.end;
        }
        out.push_str(&body[last..]);
        Markup::trusted(out)
    }

    /// Strict [`rewrite`](Self::rewrite) for batch tooling.
    ///
    /// Fails on the first `{@ ... @}` span that is malformed or does not
    /// resolve, instead of leaving or emptying it.
    pub fn try_rewrite(&self, body: &str) -> Result<Markup, ReplaceError> {
        let mut out = String::with_capacity(body.len());
        let mut last = 0;
        for span in find_candidates(body) {
            let token: MacroToken = span.as_str().parse()?;
            out.push_str(&body[last..span.start()]);
            out.push_str(&self.try_substitute(&token)?);
            last = span.end();
        }
        out.push_str(&body[last..]);
        Ok(Markup::trusted(out))
    }
}
