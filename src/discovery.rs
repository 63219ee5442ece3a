//! Recursive discovery of candidate media files.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Walk `root` and yield every file whose extension is in `extensions`
/// (compared case-insensitively).
///
/// The walk is lazy and ordered by file name, so a seeded run sees the same
/// sequence every time. Unreadable entries are logged and skipped. An empty
/// result is not an error here; the caller decides what "nothing found" means.
///
/// Yielded paths are absolute. Anything at or below an `excluded` path is
/// skipped; `excluded` entries must be canonical. An exclusion that is the
/// root itself or one of its ancestors is ignored, otherwise it would hide
/// the whole library.
pub fn find_media_files(
    root: &Path,
    extensions: &[String],
    excluded: &[PathBuf],
) -> Result<impl Iterator<Item = PathBuf>> {
    if !root.is_dir() {
        return Err(Error::InputDirectoryNotFound(root.to_path_buf()));
    }
    let root = fs::canonicalize(root)?;

    let extensions: Vec<String> = extensions.iter().map(|ext| ext.to_lowercase()).collect();
    let excluded: Vec<PathBuf> = excluded
        .iter()
        .filter(|path| !root.starts_with(path))
        .cloned()
        .collect();

    Ok(WalkDir::new(&root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| !excluded.iter().any(|path| entry.path() == path))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(move |path| has_extension(path, &extensions)))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)))
        .unwrap_or(false)
}
