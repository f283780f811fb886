//! modelurl - macro tokens for object URLs.
//!
//! Authored content refers to objects through tokens such as
//! `{@ example.models.Page 1 @}`. Forward rewriting replaces each token with
//! the object's current URL at response time; reverse resolution turns
//! literal URLs back into tokens, either from a precomputed dictionary or by
//! probing the host application's own views.

pub mod capture;
pub mod config;
pub mod core;
pub mod demo;
pub mod error;
pub mod logger;
pub mod model;
pub mod registry;
pub mod reverse;
pub mod rewrite;
pub mod site;
pub mod utils;

pub use error::ReplaceError;
