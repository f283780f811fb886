//! Reverse resolution (URL → token).
//!
//! Two strategies recover the macro token behind a literal URL found in
//! authored content:
//!
//! | Strategy             | Source of truth                                   |
//! |----------------------|---------------------------------------------------|
//! | `DictionaryResolver` | precomputed URL → token snapshot                  |
//! | `ViewResolver`       | live probe of the routed view, object captured    |
//!
//! Both are strict underneath (`try_url`) and lenient on top (`url`): the
//! lenient form never fails and decides per strategy what a failed value
//! turns into.

mod dict;
mod markup;
mod view;


pub use dict::{DictionaryResolver, Snapshot};
pub use markup::URL_ATTRIBUTES;
pub use view::ViewResolver;

use crate::error::ReplaceError;

/// A reverse resolution strategy.
pub trait Replace: Send + Sync {
    /// Resolve `value`, surfacing every failure.
    fn try_url(&self, value: &str) -> Result<String, ReplaceError>;

    /// What the lenient entry points produce when `value` failed with `error`.
    fn fallback(&self, value: &str, error: &ReplaceError) -> String;

    /// Resolve `value`, never failing.
    fn url(&self, value: &str) -> String {
        self.try_url(value)
            .unwrap_or_else(|e| self.fallback(value, &e))
    }

    /// Apply [`Replace::url`] to every URL-bearing attribute of `markup`.
    ///
    /// Everything outside those attribute values is kept byte for byte.
    fn html(&self, markup: &str) -> String {
        markup::rewrite_attributes(markup, |value| {
            Ok::<_, ReplaceError>(self.url(value))
        })
        .unwrap_or_else(|_| markup.to_string())
    }

    /// Like [`Replace::html`], but stop at the first attribute that fails for
    /// a reason other than "already fine".
    fn try_html(&self, markup: &str) -> Result<String, ReplaceError> {
        markup::rewrite_attributes(markup, |value| match self.try_url(value) {
            Ok(resolved) => Ok(resolved),
            Err(e) if e.keeps_value() => Ok(value.to_string()),
            Err(e) => Err(e),
        })
    }
}
