//! Cached parse results keyed by source filename.
//!
//! A parsed [`Document`] is stored as JSON under the cache directory,
//! named after the book's file stem. A missing or unreadable cache file
//! simply means a reparse; the cache is never authoritative.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::document::Document;

/// Cache file for `book` under `dir`: `<dir>/<stem>.json`.
fn cache_file(dir: &Path, book: &Path) -> PathBuf {
    let stem = book
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());
    dir.join(format!("{stem}.json"))
}

/// Load a previously cached Document, or `None` on miss or corruption.
pub fn load(dir: &Path, book: &Path) -> Option<Document> {
    let data = fs::read_to_string(cache_file(dir, book)).ok()?;
    serde_json::from_str(&data).ok()
}

/// Store a parsed Document, creating the cache directory if needed.
pub fn store(dir: &Path, book: &Path, document: &Document) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let data = serde_json::to_string(document)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(cache_file(dir, book), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Fragment, FragmentKind};
    use tempfile::TempDir;

    #[test]
    fn test_store_then_load() {
        let dir = TempDir::new().unwrap();
        let book = Path::new("books/example.epub");

        let document = Document {
            fragments: vec![
                Fragment::new("Chapter 1", FragmentKind::Heading),
                Fragment::new("Hello world", FragmentKind::Body),
            ],
        };

        store(dir.path(), book, &document).unwrap();
        let restored = load(dir.path(), book).unwrap();

        assert_eq!(restored, document);
    }

    #[test]
    fn test_load_miss() {
        let dir = TempDir::new().unwrap();
        assert!(load(dir.path(), Path::new("missing.epub")).is_none());
    }

    #[test]
    fn test_corrupt_cache_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let book = Path::new("bad.epub");

        fs::write(cache_file(dir.path(), book), "not json").unwrap();
        assert!(load(dir.path(), book).is_none());
    }
}
