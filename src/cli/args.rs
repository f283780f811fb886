//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use modelurl::config::CONFIG_FILE;

/// Object URL macros: forward rewriting and reverse resolution
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: modelurl.toml)
    #[arg(short = 'C', long, global = true, default_value = CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the example site with macros rewritten in every HTML response
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Replace macros with object URLs and print the result
    #[command(visible_alias = "w")]
    Rewrite {
        /// Files to rewrite. Use `-` (or nothing) to read content from stdin.
        #[arg(value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
        paths: Vec<PathBuf>,

        /// Fail on the first malformed or unresolvable macro
        #[arg(long)]
        strict: bool,
    },

    /// Replace literal URLs with macros in HTML files
    #[command(visible_alias = "r")]
    Reverse {
        #[command(flatten)]
        args: ReverseArgs,
    },

    /// Validate the type and view mappings
    #[command(visible_alias = "c")]
    Check,
}

/// Reverse command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ReverseArgs {
    /// Files or directories to process.
    /// Use `-` to read paths from stdin (one per line).
    #[arg(value_name = "PATH", required = true, value_hint = clap::ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,

    /// How URLs are recognised
    #[arg(short, long, value_enum, default_value_t = Strategy::View)]
    pub strategy: Strategy,

    /// Replace URLs anywhere in the text, not only in link attributes (dict only)
    #[arg(short, long)]
    pub text: bool,

    /// Fail on the first URL that cannot be resolved
    #[arg(long)]
    pub strict: bool,

    /// Write results back to the files instead of printing them
    #[arg(short, long)]
    pub write: bool,
}

/// Reverse resolution strategy.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Precomputed URL to macro dictionary of every mapped object
    Dict,
    /// Probe the site's own views and capture the rendered object
    View,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reverse() {
        let cli = Cli::parse_from([
            "modelurl", "-C", "site.toml", "reverse", "a.html", "out/", "-s", "dict", "--text",
        ]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        let Commands::Reverse { args } = cli.command else {
            panic!("expected reverse");
        };
        assert_eq!(args.paths.len(), 2);
        assert_eq!(args.strategy, Strategy::Dict);
        assert!(args.text && !args.strict && !args.write);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["modelurl", "check", "-v", "--color", "never"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("modelurl.toml"));
        assert!(matches!(cli.command, Commands::Check));
    }

    #[test]
    fn test_parse_rewrite_strict() {
        let cli = Cli::parse_from(["modelurl", "rewrite", "--strict", "-"]);
        let Commands::Rewrite { paths, strict } = cli.command else {
            panic!("expected rewrite");
        };
        assert_eq!(paths, [PathBuf::from("-")]);
        assert!(strict);
    }

    #[test]
    fn test_reverse_requires_paths() {
        assert!(Cli::try_parse_from(["modelurl", "reverse"]).is_err());
    }
}
