//! Input collection shared across CLI commands.

use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jwalk::WalkDir;

/// Extensions treated as HTML when walking a directory.
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// `true` for the conventional "read from stdin" argument list.
pub fn is_stdin(paths: &[PathBuf]) -> bool {
    paths.is_empty() || (paths.len() == 1 && paths[0].as_os_str() == "-")
}

/// Read all of stdin as one document.
pub fn read_stdin() -> Result<String> {
    let mut content = String::new();
    io::stdin()
        .lock()
        .read_to_string(&mut content)
        .context("failed to read stdin")?;
    Ok(content)
}

/// Read file paths from stdin, one per line
pub fn read_paths_from_stdin() -> Result<Vec<PathBuf>> {
    let stdin = io::stdin();
    let mut paths = Vec::new();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            paths.push(PathBuf::from(trimmed));
        }
    }

    Ok(paths)
}

/// Expand CLI paths into HTML files: files are taken as given, directories
/// are walked for `.html`/`.htm` files. The result is sorted and deduplicated.
pub fn collect_html_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let paths: Vec<PathBuf> = if paths.len() == 1 && paths[0].as_os_str() == "-" {
        read_paths_from_stdin()?
    } else {
        paths.to_vec()
    };

    let mut files = Vec::new();
    for path in &paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(walk_html(path));
        } else {
            anyhow::bail!("Path not found: {}", path.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_html(dir: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| is_html(path))
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| HTML_EXTENSIONS.iter().any(|h| ext.eq_ignore_ascii_case(h)))
}
