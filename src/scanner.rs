// SPDX-License-Identifier: PMPL-1.0-or-later
//! Offline scanning of a static-site build directory.
//!
//! Walks the tree, extracts every HTML file into a [`PageSnapshot`] keyed by
//! its path relative to the root, and skips tooling directories.

use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::ExtractConfig;
use crate::error::{Result, WcagbotError};
use crate::extractor::PageExtractor;
use crate::fetch::FetchedPage;
use crate::model::PageSnapshot;

/// File extensions to scan
const SCANNABLE_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];

/// Directories to skip
const SKIP_DIRS: &[&str] = &[
    "node_modules", ".git", "target", "vendor", ".next", ".nuxt", "coverage",
];

/// Snapshot every HTML file under `dir`, sorted by relative path
pub fn scan_directory(dir: &Path, config: &ExtractConfig) -> Result<Vec<PageSnapshot>> {
    if !dir.is_dir() {
        return Err(WcagbotError::Config(format!("{} is not a directory", dir.display())));
    }

    let extractor = PageExtractor::new(config.clone());
    let mut pages = Vec::new();

    info!("Scanning directory: {}", dir.display());

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_str().unwrap_or("");
            if e.file_type().is_dir() && e.depth() > 0 {
                return !SKIP_DIRS.contains(&name) && !name.starts_with('.');
            }
            true
        })
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !SCANNABLE_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }

        let key = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let snapshot = match std::fs::read_to_string(path) {
            Ok(content) => extractor.extract_html(&FetchedPage::from_markup(&key, &content)),
            Err(e) => {
                info!("Skipping {}: {}", path.display(), e);
                PageSnapshot::unavailable(&key, &e.to_string())
            }
        };
        pages.push(snapshot);
    }

    pages.sort_by(|a, b| a.url.cmp(&b.url));
    info!("Scanned {} HTML files", pages.len());

    Ok(pages)
}

/// Snapshot a single HTML file, keyed by its file name
pub fn scan_file(path: &Path, config: &ExtractConfig) -> Result<PageSnapshot> {
    let content = std::fs::read_to_string(path)?;
    let key = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(PageExtractor::new(config.clone()).extract_html(&FetchedPage::from_markup(&key, &content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_nonexistent_dir() {
        let result = scan_directory(Path::new("/nonexistent/path"), &ExtractConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_keys_by_relative_path() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        std::fs::write(dir.path().join("index.html"), "<html><title>Home</title></html>").unwrap();
        std::fs::write(dir.path().join("docs/guide.htm"), "<html><title>Guide</title></html>").unwrap();
        std::fs::write(dir.path().join("docs/notes.txt"), "not html").unwrap();
        std::fs::write(dir.path().join("node_modules/pkg/x.html"), "<title>x</title>").unwrap();

        let pages = scan_directory(dir.path(), &ExtractConfig::default()).unwrap();
        let keys: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(keys, vec!["docs/guide.htm", "index.html"]);
        assert_eq!(pages[1].title.as_deref(), Some("Home"));
    }

    #[test]
    fn test_scan_file() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("page.html");
        std::fs::write(&file, r#"<html lang="fr"><title>Page</title></html>"#).unwrap();
        let page = scan_file(&file, &ExtractConfig::default()).unwrap();
        assert_eq!(page.url, "page.html");
        assert_eq!(page.language.as_deref(), Some("fr"));
    }
}
