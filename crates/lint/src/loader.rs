//! Corpus discovery and document loading.

use promptlint_core::{AppError, AppResult, LintSettings};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::types::Document;

/// Expand the given paths into the sorted, de-duplicated list of documents.
///
/// Files are taken as given, whatever their extension. Directories are
/// walked recursively, keeping files with a configured extension and
/// skipping excluded directory names.
pub fn discover_documents(paths: &[PathBuf], settings: &LintSettings) -> AppResult<Vec<PathBuf>> {
    let mut found = BTreeSet::new();

    for path in paths {
        if path.is_file() {
            found.insert(path.clone());
            continue;
        }

        if !path.is_dir() {
            return Err(AppError::Config(format!("Path does not exist: {:?}", path)));
        }

        let walker = WalkDir::new(path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_excluded(e, settings));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {:?}: {}", path, e);
                    continue;
                }
            };
            if entry.file_type().is_file() && settings.is_document(entry.path()) {
                found.insert(entry.into_path());
            }
        }
    }

    tracing::debug!("Discovered {} documents", found.len());
    Ok(found.into_iter().collect())
}

fn is_excluded(entry: &DirEntry, settings: &LintSettings) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| settings.exclude_dirs.iter().any(|d| d == name))
            .unwrap_or(false)
}

/// Report identifier for a path: relative to `root` when under it, with `/`
/// separators on every platform.
pub fn document_id(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir => Some(String::new()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        path.display().to_string()
    } else {
        parts.join("/")
    }
}

/// Read one document.
pub fn load_document(path: &Path, root: &Path) -> AppResult<Document> {
    let text = std::fs::read_to_string(path)?;
    Ok(Document::new(document_id(path, root), text))
}
