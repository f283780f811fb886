//! Command-line interface module.

mod args;
pub mod check;
pub mod common;
pub mod reverse;
pub mod rewrite;
pub mod serve;

pub use args::{Cli, Commands, ReverseArgs, Strategy};
