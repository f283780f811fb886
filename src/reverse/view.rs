//! Live-dispatch strategy: ask the view itself which object a URL shows.
//!
//! Each call walks a small state machine over candidate values:
//!
//! 1. A value starting with a token is checked by forward rewriting; a
//!    resolvable token means the work is already done.
//! 2. Query- or fragment-only values have nothing to route.
//! 3. Schemes and hosts outside the whitelist belong to other sites.
//! 4. The path is routed to its view.
//! 5. Unregistered views are either probed for a plain status (when
//!    `check_unregistered` is on) or rejected; disabled views are rejected.
//! 6. Registered views are probed with capture armed for their context key;
//!    the captured object becomes the next candidate as a token.
//!
//! Redirects feed their target back into step 1. Every candidate is recorded,
//! so revisiting one is a cycle.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::Replace;
use crate::capture::{self, ProbeResult};
use crate::config::ReverseConfig;
use crate::core::{MacroToken, UrlParts, decode_path, resolve_location};
use crate::debug;
use crate::error::ReplaceError;
use crate::model::ObjectResolver;
use crate::registry::ViewRegistry;
use crate::rewrite::Rewriter;
use crate::site::{Site, Value};

/// One transition of the state machine.
#[derive(Debug)]
enum Step {
    /// Final value.
    Resolved(String),
    /// Stop here: the current value is already fine.
    Keep(ReplaceError),
    /// Re-examine a new candidate.
    Follow(String),
}

/// Reverse resolution by probing the routed view of each URL.
pub struct ViewResolver<S> {
    site: Arc<S>,
    views: ViewRegistry,
    rewriter: Arc<Rewriter>,
    options: ReverseConfig,
}

impl<S: Site> ViewResolver<S> {
    /// Create a resolver over `site`, installing the render interception on
    /// its template engine if no one has yet.
    pub fn new(site: Arc<S>, views: ViewRegistry, rewriter: Arc<Rewriter>) -> Self {
        capture::install(site.templates());
        Self {
            site,
            views,
            rewriter,
            options: ReverseConfig::default(),
        }
    }

    pub fn with_options(mut self, mut options: ReverseConfig) -> Self {
        options
            .check_schemes
            .iter_mut()
            .for_each(|scheme| *scheme = scheme.to_lowercase());
        options
            .check_sites
            .iter_mut()
            .for_each(|site| *site = site.to_lowercase());
        self.options = options;
        self
    }

    #[inline]
    pub fn options(&self) -> &ReverseConfig {
        &self.options
    }

    fn is_foreign(&self, parts: &UrlParts) -> bool {
        let foreign_scheme = parts.scheme.as_deref().is_some_and(|scheme| {
            !self
                .options
                .check_schemes
                .iter()
                .any(|s| s.eq_ignore_ascii_case(scheme))
        });
        let foreign_site = parts.authority.as_deref().is_some_and(|authority| {
            !self
                .options
                .check_sites
                .iter()
                .any(|s| s.eq_ignore_ascii_case(authority))
        });
        foreign_scheme || foreign_site
    }

    fn step(&self, current: &str) -> Result<Step, ReplaceError> {
        // 1. Already a token
        if let Some((token, _)) = MacroToken::parse_prefix(current) {
            let url = self.rewriter.try_substitute(&token)?;
            return if url.is_empty() {
                Err(ReplaceError::ObjectNotFound {
                    type_ref: token.type_ref,
                    primary_key: token.primary_key,
                })
            } else {
                Ok(Step::Keep(ReplaceError::AlreadyMacro(current.to_string())))
            };
        }

        // 2. Nothing to route
        let mut parts = UrlParts::split(current);
        if parts.has_no_path() {
            return Ok(Step::Keep(ReplaceError::NoPath(current.to_string())));
        }

        // 3. Not ours
        if self.is_foreign(&parts) {
            return Ok(Step::Keep(ReplaceError::ForeignUrl(current.to_string())));
        }

        // 4. Route
        let path = parts.path.clone().unwrap_or_else(|| "/".to_string());
        let Some(route) = self.site.resolve(&decode_path(&path)) else {
            debug!("reverse"; "{} -> no route", current);
            return Err(ReplaceError::UrlNotFound(current.to_string()));
        };

        let query = if self.options.send_query {
            parts.query.as_deref()
        } else {
            None
        };

        // 5. Unregistered or disabled
        let Some(entry) = self.views.get(&route.view) else {
            if !self.options.check_unregistered {
                return Err(ReplaceError::Unregistered {
                    url: current.to_string(),
                    view: route.view.to_string(),
                });
            }
            return match capture::probe(self.site.as_ref(), &path, query, None) {
                ProbeResult::Done(_) => Ok(Step::Resolved(current.to_string())),
                ProbeResult::Redirect(location) => Ok(self.redirect(&path, &location, &parts)),
                ProbeResult::Failed(status) => Err(probe_failure(current, status)),
            };
        };
        let (false, Some(context)) = (entry.disabled, entry.context.as_deref()) else {
            return Err(ReplaceError::DisabledView {
                url: current.to_string(),
                view: route.view.to_string(),
            });
        };

        // 6. Probe with capture
        match capture::probe(self.site.as_ref(), &path, query, Some(context)) {
            ProbeResult::Done(Some(Value::Object(object))) => {
                let token = ObjectResolver::encode(object.as_ref());
                debug!("reverse"; "{} -> {}", current, token);
                if entry.remove_query {
                    parts.query = None;
                }
                let next = UrlParts {
                    scheme: None,
                    authority: None,
                    path: Some(token.to_string()),
                    ..parts
                };
                Ok(Step::Follow(next.join()))
            }
            ProbeResult::Done(_) => {
                debug!("reverse"; "{} rendered without `{}`", current, context);
                Err(ReplaceError::UrlNotFound(current.to_string()))
            }
            ProbeResult::Redirect(location) => Ok(self.redirect(&path, &location, &parts)),
            ProbeResult::Failed(status) => Err(probe_failure(current, status)),
        }
    }

    /// Next candidate after a redirect; the fragment carries over unless the
    /// target brings its own.
    fn redirect(&self, path: &str, location: &str, from: &UrlParts) -> Step {
        let mut target = UrlParts::split(&resolve_location(path, location));
        if target.fragment.is_none() {
            target.fragment = from.fragment.clone();
        }
        let next = target.join();
        debug!("reverse"; "{} redirects to {}", path, next);
        Step::Follow(next)
    }
}

fn probe_failure(url: &str, status: u16) -> ReplaceError {
    match status {
        301 | 302 | 303 | 307 | 308 => ReplaceError::RedirectFailed(url.to_string()),
        404 => ReplaceError::UrlNotFound(url.to_string()),
        status => ReplaceError::ProbeFailed {
            url: url.to_string(),
            status,
        },
    }
}

impl<S: Site> Replace for ViewResolver<S> {
    /// Strict resolution.
    ///
    /// An "already fine" stop on the value itself is reported as an error
    /// (`AlreadyMacro`, `NoPath`, `ForeignUrl`); after at least one hop the
    /// value reached is the result.
    fn try_url(&self, value: &str) -> Result<String, ReplaceError> {
        let mut seen = FxHashSet::default();
        let mut current = value.to_string();

        loop {
            if !seen.insert(current.clone()) {
                debug!("reverse"; "{} -> cycle at {}", value, current);
                return Err(ReplaceError::RedirectCycle(current));
            }
            match self.step(&current)? {
                Step::Resolved(resolved) => return Ok(resolved),
                Step::Follow(next) => current = next,
                Step::Keep(reason) if seen.len() == 1 => return Err(reason),
                Step::Keep(_) => return Ok(current),
            }
        }
    }

    /// Values that are already fine stay; everything else collapses to empty.
    fn fallback(&self, value: &str, error: &ReplaceError) -> String {
        if error.keeps_value() {
            value.to_string()
        } else {
            debug!("reverse"; "{} -> empty: {}", value, error);
            String::new()
        }
    }
}
