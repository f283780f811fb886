//! `modelurl reverse`: replace literal URLs with macros in HTML files.
//!
//! Files are processed in parallel. Without `--write` the results are
//! printed in path order; with it, changed files are rewritten in place and a
//! progress line tracks the batch.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;

use super::args::{ReverseArgs, Strategy};
use super::common::collect_html_files;
use modelurl::demo::{DemoSite, Host};
use modelurl::error::ReplaceError;
use modelurl::logger::ProgressLine;
use modelurl::reverse::{DictionaryResolver, Replace, ViewResolver};
use modelurl::utils::plural::plural_count;
use modelurl::{debug, log};

/// The resolver picked by `--strategy`.
enum Resolver {
    Dict(DictionaryResolver),
    View(ViewResolver<DemoSite>),
}

/// How one document is processed.
#[derive(Debug, Clone, Copy)]
struct Mode {
    text: bool,
    strict: bool,
}

impl Resolver {
    fn build(strategy: Strategy, host: &Host) -> Result<Self> {
        Ok(match strategy {
            Strategy::Dict => Self::Dict(
                host.dict_resolver()
                    .context("failed to build the URL dictionary")?,
            ),
            Strategy::View => Self::View(host.view_resolver()),
        })
    }

    fn process(&self, content: &str, mode: Mode) -> Result<String, ReplaceError> {
        match self {
            Self::Dict(dict) if mode.text => Ok(dict.text(content)),
            Self::Dict(dict) => apply(dict, content, mode.strict),
            Self::View(view) => apply(view, content, mode.strict),
        }
    }
}

fn apply(replace: &impl Replace, content: &str, strict: bool) -> Result<String, ReplaceError> {
    if strict {
        replace.try_html(content)
    } else {
        Ok(replace.html(content))
    }
}

/// Result of one file.
struct Processed {
    path: PathBuf,
    content: String,
    changed: bool,
}

pub fn run_reverse(args: &ReverseArgs, host: &Host) -> Result<()> {
    if args.text && args.strategy != Strategy::Dict {
        bail!("--text is only supported with --strategy dict");
    }
    if args.text && args.strict {
        bail!("--text cannot be combined with --strict");
    }

    let files = collect_html_files(&args.paths)?;
    if files.is_empty() {
        log!("reverse"; "no html files found");
        return Ok(());
    }

    let resolver = Resolver::build(args.strategy, host)?;
    let mode = Mode {
        text: args.text,
        strict: args.strict,
    };

    if args.write {
        let changed = write_files(&files, &resolver, mode)?;
        log!(
            "reverse";
            "{} changed, {} unchanged",
            plural_count(changed, "file"),
            files.len() - changed
        );
    } else {
        let mut stdout = io::stdout().lock();
        for processed in process_files(&files, &resolver, mode, None)? {
            write!(stdout, "{}", processed.content)?;
        }
        stdout.flush()?;
    }
    Ok(())
}

/// Rewrite changed files in place; returns how many changed.
fn write_files(files: &[PathBuf], resolver: &Resolver, mode: Mode) -> Result<usize> {
    let progress = ProgressLine::new("reverse", &[("files", files.len())]);
    let processed = process_files(files, resolver, mode, Some(&progress))?;
    progress.finish();

    let mut changed = 0;
    for file in processed.iter().filter(|file| file.changed) {
        fs::write(&file.path, &file.content)
            .with_context(|| format!("Failed to write {}", file.path.display()))?;
        debug!("reverse"; "wrote {}", file.path.display());
        changed += 1;
    }
    Ok(changed)
}

/// Process every file in parallel. In strict mode the first failure aborts
/// the batch before anything is written.
fn process_files(
    files: &[PathBuf],
    resolver: &Resolver,
    mode: Mode,
    progress: Option<&ProgressLine>,
) -> Result<Vec<Processed>> {
    files
        .par_iter()
        .map(|path| {
            let processed = process_file(path, resolver, mode);
            if let Some(progress) = progress {
                progress.inc("files");
            }
            processed
        })
        .collect()
}

fn process_file(path: &Path, resolver: &Resolver, mode: Mode) -> Result<Processed> {
    let original =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content = resolver
        .process(&original, mode)
        .with_context(|| format!("{}", path.display()))?;
    Ok(Processed {
        path: path.to_path_buf(),
        changed: content != original,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<a href="/page_by_id/1">one</a> /page_by_id/11"#;

    fn args(paths: Vec<PathBuf>, strategy: Strategy) -> ReverseArgs {
        ReverseArgs {
            paths,
            strategy,
            text: false,
            strict: false,
            write: true,
        }
    }

    fn site_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), PAGE).unwrap();
        fs::write(dir.path().join("plain.html"), "<p>no links</p>").unwrap();
        dir
    }

    #[test]
    fn test_write_view_strategy() {
        let host = Host::example().unwrap();
        let dir = site_dir();

        run_reverse(&args(vec![dir.path().to_path_buf()], Strategy::View), &host).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("index.html")).unwrap(),
            r#"<a href="{@ example.models.Page 1 @}">one</a> /page_by_id/11"#
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("plain.html")).unwrap(),
            "<p>no links</p>"
        );
    }

    #[test]
    fn test_write_dict_text() {
        let host = Host::example().unwrap();
        let dir = site_dir();
        let mut args = args(vec![dir.path().join("index.html")], Strategy::Dict);
        args.text = true;

        run_reverse(&args, &host).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("index.html")).unwrap(),
            r#"<a href="{@ example.models.Page 1 @}">one</a> {@ example.models.Page 11 @}"#
        );
    }

    #[test]
    fn test_strict_leaves_files_untouched() {
        let host = Host::example().unwrap();
        let dir = site_dir();
        let broken = dir.path().join("broken.html");
        fs::write(&broken, r#"<a href="/page_by_id/12">gone</a>"#).unwrap();
        let mut args = args(vec![dir.path().to_path_buf()], Strategy::View);
        args.strict = true;

        let err = run_reverse(&args, &host).unwrap_err();
        assert!(err.to_string().contains("broken.html"), "{err}");
        assert_eq!(fs::read_to_string(dir.path().join("index.html")).unwrap(), PAGE);
    }

    #[test]
    fn test_text_requires_dict() {
        let host = Host::example().unwrap();
        let dir = site_dir();
        let mut args = args(vec![dir.path().to_path_buf()], Strategy::View);
        args.text = true;

        assert!(run_reverse(&args, &host).is_err());
        assert_eq!(fs::read_to_string(dir.path().join("index.html")).unwrap(), PAGE);
    }
}
