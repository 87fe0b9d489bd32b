//! Reading-progress persistence keyed by book path.
//!
//! A small JSON record set living alongside the parse cache. The core
//! pipeline never touches it; it exists so a display layer can resume
//! where the reader left off.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

const PROGRESS_FILE: &str = "progress.json";

/// Resume position for a single book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub path: String,
    pub index: usize,
}

/// On-disk set of reading positions. `current` tracks the most recently
/// used record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressStore {
    pub progresses: Vec<Progress>,
    pub current: usize,
}

impl ProgressStore {
    /// Load the store from `dir`, starting empty if no store exists yet.
    pub fn load(dir: &Path) -> io::Result<Self> {
        let file = dir.join(PROGRESS_FILE);
        match fs::read_to_string(&file) {
            Ok(data) => serde_json::from_str(&data)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Progress record for `path`, creating a fresh one at index 0 if
    /// the book has not been seen before.
    pub fn get(&mut self, path: &str) -> &Progress {
        self.set_current(path);
        &self.progresses[self.current]
    }

    /// Make `path` the current record, appending a fresh one if needed.
    pub fn set_current(&mut self, path: &str) {
        if let Some(i) = self.progresses.iter().position(|p| p.path == path) {
            self.current = i;
            return;
        }

        self.progresses.push(Progress {
            path: path.to_string(),
            index: 0,
        });
        self.current = self.progresses.len() - 1;
    }

    /// Record a resume index for `path`.
    pub fn set_index(&mut self, path: &str, index: usize) {
        self.set_current(path);
        self.progresses[self.current].index = index;
    }

    /// Persist the store to `dir`, creating the directory if needed.
    pub fn save(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(dir.join(PROGRESS_FILE), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_path_gets_fresh_record() {
        let mut store = ProgressStore::default();

        let progress = store.get("books/a.epub");
        assert_eq!(progress.path, "books/a.epub");
        assert_eq!(progress.index, 0);
        assert_eq!(store.progresses.len(), 1);
    }

    #[test]
    fn test_set_index_updates_existing_record() {
        let mut store = ProgressStore::default();
        store.set_index("a.epub", 42);
        store.set_index("b.epub", 7);
        store.set_index("a.epub", 43);

        assert_eq!(store.progresses.len(), 2);
        assert_eq!(store.get("a.epub").index, 43);
        assert_eq!(store.get("b.epub").index, 7);
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();

        let mut store = ProgressStore::default();
        store.set_index("a.epub", 12);
        store.save(dir.path()).unwrap();

        let mut restored = ProgressStore::load(dir.path()).unwrap();
        assert_eq!(restored.get("a.epub").index, 12);
    }

    #[test]
    fn test_load_missing_store_is_empty() {
        let dir = TempDir::new().unwrap();

        let store = ProgressStore::load(dir.path()).unwrap();
        assert!(store.progresses.is_empty());
    }
}
