//! Dictionary strategy: reverse lookups against a URL snapshot.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;

use super::Replace;
use crate::core::MacroToken;
use crate::debug;
use crate::error::ReplaceError;
use crate::model::ObjectResolver;
use crate::registry::TypeRegistry;

/// Compiled alternations over large snapshots exceed the default limit.
const REGEX_SIZE_LIMIT: usize = 256 * 1024 * 1024;

/// Known URLs and the token each one stands for.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entries: Vec<(String, MacroToken)>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, token: MacroToken) {
        self.entries.push((url.into(), token));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot every live object of every mapped type, keyed by the URL its
    /// configured accessor produces.
    pub fn from_objects(
        resolver: &ObjectResolver,
        types: &TypeRegistry,
    ) -> Result<Self, ReplaceError> {
        let mut snapshot = Self::new();
        for entry in types.entries() {
            for object in resolver.all(&entry.type_ref)? {
                let url = resolver.invoke_accessor(object.as_ref(), entry.accessor.as_deref())?;
                if url.is_empty() {
                    continue;
                }
                snapshot.insert(url, ObjectResolver::encode(object.as_ref()));
            }
        }
        debug!("reverse"; "snapshot of {} urls", snapshot.len());
        Ok(snapshot)
    }
}

impl FromIterator<(String, MacroToken)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, MacroToken)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Replaces known URLs with their tokens.
///
/// Lookup map, ordering and pattern are built on first use and never change;
/// build a new resolver when the underlying objects change.
pub struct DictionaryResolver {
    snapshot: Snapshot,
    lookup: OnceLock<FxHashMap<String, MacroToken>>,
    sorted: OnceLock<Vec<(String, MacroToken)>>,
    pattern: OnceLock<Option<Regex>>,
}

impl DictionaryResolver {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            lookup: OnceLock::new(),
            sorted: OnceLock::new(),
            pattern: OnceLock::new(),
        }
    }

    /// Lowercased URL → token. Later snapshot entries win.
    fn lookup(&self) -> &FxHashMap<String, MacroToken> {
        self.lookup.get_or_init(|| {
            self.snapshot
                .entries
                .iter()
                .map(|(url, token)| (url.to_lowercase(), token.clone()))
                .collect()
        })
    }

    /// Lookup entries, longest URL first (ties broken lexicographically).
    fn sorted(&self) -> &[(String, MacroToken)] {
        self.sorted.get_or_init(|| {
            let mut sorted: Vec<_> = self
                .lookup()
                .iter()
                .map(|(url, token)| (url.clone(), token.clone()))
                .collect();
            sorted.sort_unstable_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            sorted
        })
    }

    /// `(?i)(<longest>|...|<shortest>)(<boundary>)`.
    ///
    /// The boundary is captured and re-emitted, so `/page_by_id/1` never
    /// matches inside `/page_by_id/11` or `/page_by_id/1/more`.
    fn pattern(&self) -> Option<&Regex> {
        self.pattern
            .get_or_init(|| {
                let sorted = self.sorted();
                if sorted.is_empty() {
                    return None;
                }
                let alternation = sorted
                    .iter()
                    .map(|(url, _)| regex::escape(url))
                    .collect::<Vec<_>>()
                    .join("|");
                let source = format!(r#"(?i)({alternation})(\s|[#?"'>]|$)"#);
                match RegexBuilder::new(&source)
                    .size_limit(REGEX_SIZE_LIMIT)
                    .build()
                {
                    Ok(re) => Some(re),
                    Err(e) => {
                        debug!("reverse"; "dictionary pattern failed to build: {}", e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Exact, case-insensitive lookup of one URL.
    pub fn token(&self, value: &str) -> Option<&MacroToken> {
        self.lookup().get(&value.to_lowercase())
    }

    /// Replace every known URL in free text with its token.
    pub fn text(&self, value: &str) -> String {
        let Some(pattern) = self.pattern() else {
            return value.to_string();
        };
        pattern
            .replace_all(value, |caps: &regex::Captures<'_>| {
                let url = caps.get(1).map_or("", |m| m.as_str());
                let boundary = caps.get(2).map_or("", |m| m.as_str());
                match self.token(url) {
                    Some(token) => format!("{token}{boundary}"),
                    None => format!("{url}{boundary}"),
                }
            })
            .into_owned()
    }
}

impl Replace for DictionaryResolver {
    fn try_url(&self, value: &str) -> Result<String, ReplaceError> {
        self.token(value)
            .map(MacroToken::to_string)
            .ok_or_else(|| ReplaceError::UrlNotFound(value.to_string()))
    }

    /// Unknown URLs stay as they are.
    fn fallback(&self, value: &str, _error: &ReplaceError) -> String {
        value.to_string()
    }
}
