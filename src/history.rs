// File: src/history.rs
use crate::error::{ImeError, Result};
use crate::persistence::{load_json, save_json};
use std::io;
use std::path::PathBuf;

/// Committed strings, oldest first, each at most once. Every mutation is
/// written through to `path`.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<String>,
}

impl HistoryStore {
    /// An empty history that will persist to `path`. Nothing is read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// Loads the history at `path`. A missing file gives an empty history;
    /// an unreadable or corrupt one is a `HistoryPersistence` error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(path);
        match load_json::<Vec<String>>(&store.path) {
            Ok(entries) => {
                for entry in entries {
                    if !store.entries.contains(&entry) {
                        store.entries.push(entry);
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ImeError::HistoryPersistence(format!(
                    "cannot read {}: {}",
                    store.path.display(),
                    e
                )))
            }
        }
        Ok(store)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.iter().any(|e| e == text)
    }

    /// Appends `text` unless it is already present anywhere in the log.
    /// Returns whether it was added. The in-memory log is updated even when
    /// persisting fails.
    pub fn append(&mut self, text: &str) -> Result<bool> {
        if self.contains(text) {
            return Ok(false);
        }
        self.entries.push(text.to_string());
        self.save()?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        save_json(&self.entries, &self.path).map_err(|e| {
            ImeError::HistoryPersistence(format!("{}: {}", self.path.display(), e))
        })
    }
}
