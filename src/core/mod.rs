//! Core types - token grammar and URL decomposition.

mod token;
mod url;

pub use token::{MACRO_RE, MacroToken, find_candidates, find_tokens, format_token};
pub use url::{UrlParts, decode_path, resolve_location};
