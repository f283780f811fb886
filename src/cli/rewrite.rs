//! `modelurl rewrite`: forward-rewrite files or stdin to stdout.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::common::{is_stdin, read_stdin};
use modelurl::debug;
use modelurl::rewrite::Rewriter;

pub fn run_rewrite(paths: &[PathBuf], strict: bool, rewriter: &Rewriter) -> Result<()> {
    let mut stdout = io::stdout().lock();

    if is_stdin(paths) {
        let content = read_stdin()?;
        write!(stdout, "{}", rewrite_content(&content, strict, rewriter)?)?;
        return Ok(());
    }

    for path in paths {
        let rewritten = rewrite_file(path, strict, rewriter)?;
        write!(stdout, "{rewritten}")?;
    }
    stdout.flush()?;
    Ok(())
}

fn rewrite_content(content: &str, strict: bool, rewriter: &Rewriter) -> Result<String> {
    if strict {
        Ok(rewriter.try_rewrite(content)?.into())
    } else {
        Ok(rewriter.rewrite(content).into())
    }
}

fn rewrite_file(path: &Path, strict: bool, rewriter: &Rewriter) -> Result<String> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    debug!("forward"; "{}", path.display());
    rewrite_content(&content, strict, rewriter)
        .with_context(|| format!("Failed to rewrite {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelurl::demo::Host;

    #[test]
    fn test_rewrite_file() {
        let host = Host::example().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.html");
        fs::write(
            &path,
            r#"<a href="{@ example.models.Page 11 @}">eleven</a> {@ example.models.Item 1 @}"#,
        )
        .unwrap();

        assert_eq!(
            rewrite_file(&path, false, &host.rewriter).unwrap(),
            r#"<a href="/page_by_id/11">eleven</a> /item_by_barcode/first"#
        );
    }

    #[test]
    fn test_rewrite_missing_file() {
        let host = Host::example().unwrap();
        let err =
            rewrite_file(Path::new("/nonexistent/post.html"), false, &host.rewriter).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_strict_rewrite_rejects_malformed_token() {
        let host = Host::example().unwrap();
        let content = "{@ example.models.Page 1 @} {@ 1 @}";
        assert_eq!(
            rewrite_content(content, false, &host.rewriter).unwrap(),
            "/page_by_id/1 {@ 1 @}"
        );
        let err = rewrite_content(content, true, &host.rewriter).unwrap_err();
        assert_eq!(err.to_string(), "no macro token in `{@ 1 @}`");
    }
}
